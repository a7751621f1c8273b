//! Stub keystore engines
//!
//! [`StubKeystoreEngine`] records every call (spy), can be slowed down or
//! parked on a [`Gate`], returns scripted responses, and tracks how many
//! calls overlapped on the same keystore directory.
//!
//! # Blocking Lock Usage
//!
//! Uses `parking_lot` locks: engine calls are blocking by contract and run
//! on dispatcher workers, never inside async tasks.

use keybridge_core::effects::KeystoreEngine;
use keybridge_core::{BridgeError, KeyIdentifier, KeycardConversionRequest, Password, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Success response of the native engine
pub const ENGINE_OK: &str = r#"{"error":""}"#;

/// One recorded engine call; passwords are never recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `init_keystore(dir)`
    InitKeystore {
        /// Directory passed to the engine
        dir: PathBuf,
    },
    /// `change_database_password(key_uid, ..)`
    ChangeDatabasePassword {
        /// Identity being re-encrypted
        key_uid: KeyIdentifier,
    },
    /// `convert_to_keycard_account(..)`
    ConvertToKeycardAccount {
        /// Identity being converted
        key_uid: KeyIdentifier,
        /// Target keycard
        keycard_uid: String,
    },
}

/// Scripted behaviour of one engine operation
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return this raw response
    Respond(String),
    /// Fail with this error
    Fail(BridgeError),
    /// Panic with this message
    Panic(String),
}

impl Scripted {
    fn play(&self) -> Result<String> {
        match self {
            Self::Respond(raw) => Ok(raw.clone()),
            Self::Fail(err) => Err(err.clone()),
            Self::Panic(message) => panic!("{message}"),
        }
    }
}

impl Default for Scripted {
    fn default() -> Self {
        Self::Respond(ENGINE_OK.to_string())
    }
}

/// Latch that parks engine calls until opened
#[derive(Debug, Clone, Default)]
pub struct Gate {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    /// Create a closed gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every parked and future caller
    pub fn open(&self) {
        let (open, signal) = &*self.state;
        *open.lock() = true;
        signal.notify_all();
    }

    fn wait(&self) {
        let (open, signal) = &*self.state;
        let mut open = open.lock();
        while !*open {
            signal.wait(&mut open);
        }
    }
}

#[derive(Debug, Default)]
struct Overlap {
    active: HashMap<PathBuf, usize>,
    peak: usize,
}

#[derive(Debug, Default)]
struct Script {
    init: Scripted,
    change_password: Scripted,
    convert: Scripted,
}

/// Spy engine with scripted responses
#[derive(Debug, Clone, Default)]
pub struct StubKeystoreEngine {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<EngineCall>>>,
    overlap: Arc<Mutex<Overlap>>,
    delay: Option<Duration>,
    gate: Option<Gate>,
}

impl StubKeystoreEngine {
    /// Engine answering every call with [`ENGINE_OK`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Park every call on `gate` until it opens
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Script `init_keystore`
    pub fn script_init(self, behaviour: Scripted) -> Self {
        self.script.lock().init = behaviour;
        self
    }

    /// Script `change_database_password`
    pub fn script_change_password(self, behaviour: Scripted) -> Self {
        self.script.lock().change_password = behaviour;
        self
    }

    /// Script `convert_to_keycard_account`
    pub fn script_convert(self, behaviour: Scripted) -> Self {
        self.script.lock().convert = behaviour;
        self
    }

    /// Every call made so far, in arrival order
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Number of `convert_to_keycard_account` calls
    pub fn convert_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, EngineCall::ConvertToKeycardAccount { .. }))
            .count()
    }

    /// Highest number of calls that ran at once against one directory
    pub fn peak_overlap(&self) -> usize {
        self.overlap.lock().peak
    }

    fn enter(&self, call: EngineCall, dir: &Path) {
        self.calls.lock().push(call);
        let mut overlap = self.overlap.lock();
        let active = overlap.active.entry(dir.to_path_buf()).or_insert(0);
        *active += 1;
        let now = *active;
        overlap.peak = overlap.peak.max(now);
    }

    fn leave(&self, dir: &Path) {
        let mut overlap = self.overlap.lock();
        if let Some(active) = overlap.active.get_mut(dir) {
            *active -= 1;
        }
    }

    fn run(&self, call: EngineCall, dir: &Path, pick: impl Fn(&Script) -> Scripted) -> Result<String> {
        self.enter(call, dir);
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let behaviour = pick(&self.script.lock());
        self.leave(dir);
        behaviour.play()
    }
}

impl KeystoreEngine for StubKeystoreEngine {
    fn init_keystore(&self, keystore_dir: &Path) -> Result<String> {
        self.run(
            EngineCall::InitKeystore {
                dir: keystore_dir.to_path_buf(),
            },
            keystore_dir,
            |script| script.init.clone(),
        )
    }

    fn change_database_password(
        &self,
        key_uid: &KeyIdentifier,
        _current_password: &Password,
        _new_password: &Password,
    ) -> Result<String> {
        self.run(
            EngineCall::ChangeDatabasePassword {
                key_uid: key_uid.clone(),
            },
            Path::new(key_uid.as_str()),
            |script| script.change_password.clone(),
        )
    }

    fn convert_to_keycard_account(&self, request: &KeycardConversionRequest) -> Result<String> {
        self.run(
            EngineCall::ConvertToKeycardAccount {
                key_uid: request.key_uid.clone(),
                keycard_uid: request.keycard_uid.clone(),
            },
            Path::new(request.key_uid.as_str()),
            |script| script.convert.clone(),
        )
    }
}
