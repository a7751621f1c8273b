//! Keystore command behaviour through the public bridge surface

use keybridge::{BridgeBuilder, BridgeConfig, EncryptionBridge, ErrorPayload, LockPolicy, Password};
use keybridge_core::errors::{ENGINE_ERROR, INTERNAL_ERROR, IO_ERROR, VALIDATION_ERROR};
use keybridge_core::BridgeError;
use keybridge_effects::{MemoryPreferenceStore, UiThreadExecutor};
use keybridge_testkit::{
    counting_slot, init_test_tracing, EngineCall, Gate, Scripted, StubKeystoreEngine, ENGINE_OK,
};
use proptest::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};

const ROOT: &str = "/data/app/no_backup";
const WAIT: Duration = Duration::from_secs(5);

fn bridge(engine: &StubKeystoreEngine, policy: LockPolicy) -> EncryptionBridge {
    init_test_tracing();
    let mut config = BridgeConfig::new(ROOT);
    config.lock_policy = policy;
    BridgeBuilder::new(config)
        .with_engine(Arc::new(engine.clone()))
        .with_preferences(Arc::new(MemoryPreferenceStore::new()))
        .with_runtime(Handle::current())
        .build()
        .unwrap()
}

fn code(payload: &ErrorPayload) -> Option<&str> {
    payload.code.as_deref()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_init_keystore_reports_engine_response_once() {
    let engine = StubKeystoreEngine::new();
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    bridge.init_keystore("0xabc123", slot);

    assert_eq!(watch.wait(WAIT).await, Some(Ok(ENGINE_OK.to_string())));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(watch.calls(), 1);
    assert_eq!(
        engine.calls(),
        vec![EngineCall::InitKeystore {
            dir: PathBuf::from(ROOT).join("keystore").join("0xabc123"),
        }]
    );
    assert_eq!(bridge.dispatcher().in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_caller_returns_before_engine_finishes() {
    let gate = Gate::new();
    let engine = StubKeystoreEngine::new().with_gate(gate.clone());
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    bridge.init_keystore("0xabc123", slot);
    assert_eq!(watch.calls(), 0);
    assert_eq!(bridge.dispatcher().in_flight(), 1);

    gate.open();
    assert_eq!(watch.wait(WAIT).await, Some(Ok(ENGINE_OK.to_string())));
    assert_eq!(watch.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_in_band_engine_error_goes_to_error_path() {
    let engine = StubKeystoreEngine::new()
        .script_init(Scripted::Respond(r#"{"error":"keystore is locked"}"#.to_string()));
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    bridge.init_keystore("0xabc123", slot);

    let err = watch.wait(WAIT).await.unwrap().unwrap_err();
    assert_eq!(err.message, "keystore is locked");
    assert_eq!(code(&err), Some(ENGINE_ERROR));
    assert_eq!(watch.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_engine_panic_is_reported_once() {
    let engine = StubKeystoreEngine::new().script_init(Scripted::Panic("engine crashed".into()));
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    bridge.init_keystore("0xabc123", slot);

    let err = watch.wait(WAIT).await.unwrap().unwrap_err();
    assert_eq!(code(&err), Some(INTERNAL_ERROR));
    assert!(err.message.contains("engine crashed"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(watch.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_identifier_never_reaches_engine() {
    let engine = StubKeystoreEngine::new();
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);

    for key_uid in ["", "..", "../escape", "a/b", "a\\b"] {
        let (slot, watch) = counting_slot();
        bridge.init_keystore(key_uid, slot);
        let err = watch.wait(WAIT).await.unwrap().unwrap_err();
        assert_eq!(code(&err), Some(VALIDATION_ERROR), "key_uid {key_uid:?}");
        assert_eq!(watch.calls(), 1);
    }
    assert!(engine.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_identifier_rejected_by_every_command() {
    let engine = StubKeystoreEngine::new();
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);

    for key_uid in ["", "..", "../escape", "a/b", "a\\b"] {
        let (slot, watch) = counting_slot();
        bridge.re_encrypt_db_and_keystore(key_uid, "a".into(), "b".into(), slot);
        let err = watch.wait(WAIT).await.unwrap().unwrap_err();
        assert_eq!(code(&err), Some(VALIDATION_ERROR), "re-encrypt {key_uid:?}");
        assert_eq!(watch.calls(), 1);

        let (slot, watch) = counting_slot();
        convert_for(&bridge, key_uid, slot);
        let err = watch.wait(WAIT).await.unwrap().unwrap_err();
        assert_eq!(code(&err), Some(VALIDATION_ERROR), "convert {key_uid:?}");
        assert_eq!(watch.calls(), 1);
    }
    assert!(engine.calls().is_empty());
    assert_eq!(bridge.dispatcher().in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_re_encrypt_passes_identity_to_engine() {
    let engine = StubKeystoreEngine::new();
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    bridge.re_encrypt_db_and_keystore(
        "0xabc123",
        Password::new("old-secret"),
        Password::new("new-secret"),
        slot,
    );

    assert_eq!(watch.wait(WAIT).await, Some(Ok(ENGINE_OK.to_string())));
    assert_eq!(
        engine.calls(),
        vec![EngineCall::ChangeDatabasePassword {
            key_uid: "0xabc123".try_into().unwrap(),
        }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_re_encrypt_engine_failure() {
    let engine = StubKeystoreEngine::new()
        .script_change_password(Scripted::Fail(BridgeError::io("database is read-only")));
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    bridge.re_encrypt_db_and_keystore("0xabc123", "a".into(), "b".into(), slot);

    let err = watch.wait(WAIT).await.unwrap().unwrap_err();
    assert_eq!(code(&err), Some(IO_ERROR));
    assert_eq!(err.message, "database is read-only");
}

fn convert(bridge: &EncryptionBridge, slot: keybridge::CallbackSlot) {
    convert_for(bridge, "0xabc123", slot);
}

fn convert_for(bridge: &EncryptionBridge, key_uid: &str, slot: keybridge::CallbackSlot) {
    bridge.convert_to_keycard_account(
        key_uid,
        r#"{"name":"main"}"#.to_string(),
        "{}".to_string(),
        "card-01".to_string(),
        Password::new("old-secret"),
        Password::new("keycard-secret"),
        slot,
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_keycard_conversion_runs_both_steps_in_order() {
    let engine = StubKeystoreEngine::new()
        .script_convert(Scripted::Respond(r#"{"error":"","converted":true}"#.to_string()));
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    convert(&bridge, slot);

    assert_eq!(
        watch.wait(WAIT).await,
        Some(Ok(r#"{"error":"","converted":true}"#.to_string()))
    );
    let key_uid = "0xabc123".try_into().unwrap();
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::InitKeystore {
                dir: PathBuf::from(ROOT).join("keystore").join("0xabc123"),
            },
            EngineCall::ConvertToKeycardAccount {
                key_uid,
                keycard_uid: "card-01".to_string(),
            },
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_keycard_conversion_stops_on_in_band_init_error() {
    let engine = StubKeystoreEngine::new()
        .script_init(Scripted::Respond(r#"{"error":"no space left"}"#.to_string()));
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    convert(&bridge, slot);

    let err = watch.wait(WAIT).await.unwrap().unwrap_err();
    assert_eq!(err, ErrorPayload::new("no space left").with_code(ENGINE_ERROR));
    assert_eq!(engine.convert_calls(), 0);
    assert_eq!(watch.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_keycard_conversion_stops_on_init_fault() {
    let fault = BridgeError::io("keystore directory not writable");
    let engine = StubKeystoreEngine::new().script_init(Scripted::Fail(fault.clone()));
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    convert(&bridge, slot);

    let err = watch.wait(WAIT).await.unwrap().unwrap_err();
    assert_eq!(err, ErrorPayload::from(fault));
    assert_eq!(engine.convert_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_keycard_conversion_error_from_second_step() {
    let engine = StubKeystoreEngine::new()
        .script_convert(Scripted::Respond(r#"{"error":"wrong keycard pin"}"#.to_string()));
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);
    let (slot, watch) = counting_slot();

    convert(&bridge, slot);

    let err = watch.wait(WAIT).await.unwrap().unwrap_err();
    assert_eq!(err.message, "wrong keycard pin");
    assert_eq!(engine.convert_calls(), 1);
}

async fn run_concurrent_inits(policy: LockPolicy) -> usize {
    let engine = StubKeystoreEngine::new().with_delay(Duration::from_millis(100));
    let bridge = bridge(&engine, policy);

    let watches: Vec<_> = (0..4)
        .map(|_| {
            let (slot, watch) = counting_slot();
            bridge.init_keystore("0xabc123", slot);
            watch
        })
        .collect();

    for watch in &watches {
        assert_eq!(watch.wait(WAIT).await, Some(Ok(ENGINE_OK.to_string())));
        assert_eq!(watch.calls(), 1);
    }
    engine.peak_overlap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_same_identity_is_serialized_per_identifier() {
    assert_eq!(run_concurrent_inits(LockPolicy::PerIdentifier).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_same_identity_overlaps_when_unsynchronized() {
    assert!(run_concurrent_inits(LockPolicy::Unsynchronized).await >= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_distinct_identities_run_in_parallel() {
    let gate = Gate::new();
    let engine = StubKeystoreEngine::new().with_gate(gate.clone());
    let bridge = bridge(&engine, LockPolicy::PerIdentifier);

    let (first, first_watch) = counting_slot();
    let (second, second_watch) = counting_slot();
    bridge.init_keystore("0xaaa", first);
    bridge.init_keystore("0xbbb", second);

    // Both calls must reach the engine while the gate is still closed.
    for _ in 0..100 {
        if engine.calls().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(engine.calls().len(), 2);

    gate.open();
    assert!(first_watch.wait(WAIT).await.unwrap().is_ok());
    assert!(second_watch.wait(WAIT).await.unwrap().is_ok());
}

/// Behaviour of one scripted engine step
#[derive(Debug, Clone, Copy)]
enum Step {
    Succeed,
    InBandError,
    Fault,
    Panic,
}

impl Step {
    fn scripted(self) -> Scripted {
        match self {
            Step::Succeed => Scripted::Respond(ENGINE_OK.to_string()),
            Step::InBandError => Scripted::Respond(r#"{"error":"engine refused"}"#.to_string()),
            Step::Fault => Scripted::Fail(BridgeError::io("disk unavailable")),
            Step::Panic => Scripted::Panic("engine crashed".to_string()),
        }
    }

    /// Error code the step reports, `None` on success
    fn code(self) -> Option<&'static str> {
        match self {
            Step::Succeed => None,
            Step::InBandError => Some(ENGINE_ERROR),
            Step::Fault => Some(IO_ERROR),
            Step::Panic => Some(INTERNAL_ERROR),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Init,
    ReEncrypt,
    Convert,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Succeed),
        Just(Step::InBandError),
        Just(Step::Fault),
        Just(Step::Panic),
    ]
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![Just(Command::Init), Just(Command::ReEncrypt), Just(Command::Convert)]
}

fn shared_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    })
}

fn shared_ui() -> Arc<UiThreadExecutor> {
    static UI: OnceLock<Arc<UiThreadExecutor>> = OnceLock::new();
    UI.get_or_init(|| Arc::new(UiThreadExecutor::spawn("prop-ui").unwrap()))
        .clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_command_reports_exactly_once(
        command in command(),
        first in step(),
        second in step(),
        policy in prop_oneof![Just(LockPolicy::PerIdentifier), Just(LockPolicy::Unsynchronized)],
    ) {
        init_test_tracing();
        let runtime = shared_runtime();
        let engine = StubKeystoreEngine::new()
            .script_init(first.scripted())
            .script_change_password(first.scripted())
            .script_convert(second.scripted());
        let mut config = BridgeConfig::new(ROOT);
        config.lock_policy = policy;
        let bridge = BridgeBuilder::new(config)
            .with_engine(Arc::new(engine.clone()))
            .with_preferences(Arc::new(MemoryPreferenceStore::new()))
            .with_ui_executor(shared_ui())
            .with_runtime(runtime.handle().clone())
            .build()
            .unwrap();

        let (slot, watch) = counting_slot();
        let expected = match command {
            Command::Init => {
                bridge.init_keystore("0xabc123", slot);
                first.code()
            }
            Command::ReEncrypt => {
                bridge.re_encrypt_db_and_keystore("0xabc123", "a".into(), "b".into(), slot);
                first.code()
            }
            Command::Convert => {
                convert(&bridge, slot);
                first.code().or(second.code())
            }
        };

        let outcome = runtime.block_on(watch.wait(WAIT));
        prop_assert!(outcome.is_some(), "callback never fired");
        match (outcome.unwrap(), expected) {
            (Ok(_), None) => {}
            (Err(err), Some(expected)) => prop_assert_eq!(code(&err), Some(expected)),
            (outcome, expected) => {
                prop_assert!(false, "got {:?}, expected code {:?}", outcome, expected)
            }
        }

        std::thread::sleep(Duration::from_millis(5));
        prop_assert_eq!(watch.calls(), 1);
        prop_assert_eq!(bridge.dispatcher().in_flight(), 0);
        if matches!(command, Command::Convert) && first.code().is_some() {
            prop_assert_eq!(engine.convert_calls(), 0);
        }
    }
}
