//! Off-thread execution of keystore commands
//!
//! [`CommandDispatcher::execute`] hands a [`KeystoreCommand`] to its own
//! blocking worker and returns immediately. The worker runs the command to
//! completion and fires the [`CallbackSlot`] exactly once. Every fault,
//! whether returned by the engine, encoded in its response, or raised as a
//! panic, reaches the caller as an [`ErrorPayload`].
//!
//! There is no queue and no cancellation. Ordering across submissions is
//! unspecified; with [`LockPolicy::PerIdentifier`] commands that carry the
//! same [`KeyIdentifier`] run one at a time.

use crate::callback::{CallbackSlot, CommandOutcome};
use crate::keyed_lock::KeyedLocks;
use crate::response::interpret_engine_response;
use keybridge_core::errors::INTERNAL_ERROR;
use keybridge_core::{BridgeError, ErrorPayload, KeyIdentifier, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, debug_span, warn};
use uuid::Uuid;

/// Mutual-exclusion policy for commands targeting the same identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockPolicy {
    /// Commands for one identity run one at a time
    #[default]
    PerIdentifier,
    /// No synchronization; callers own any interleaving hazards
    Unsynchronized,
}

impl FromStr for LockPolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-identifier" => Ok(Self::PerIdentifier),
            "unsynchronized" => Ok(Self::Unsynchronized),
            other => Err(BridgeError::config(format!("unknown lock policy: {other}"))),
        }
    }
}

type CommandFn = Box<dyn FnOnce() -> Result<String> + Send + 'static>;

/// Deferred unit of work, consumed by exactly one dispatch
pub struct KeystoreCommand {
    operation: &'static str,
    key_uid: Option<KeyIdentifier>,
    run: CommandFn,
}

impl KeystoreCommand {
    /// Wrap a blocking operation under a static operation label
    pub fn new<F>(operation: &'static str, run: F) -> Self
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        Self {
            operation,
            key_uid: None,
            run: Box::new(run),
        }
    }

    /// Mark the command as touching the keystore of `key_uid`
    pub fn for_key(mut self, key_uid: KeyIdentifier) -> Self {
        self.key_uid = Some(key_uid);
        self
    }

    /// Operation label used in logs
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Identity whose keystore this command touches
    pub fn key_uid(&self) -> Option<&KeyIdentifier> {
        self.key_uid.as_ref()
    }
}

impl std::fmt::Debug for KeystoreCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreCommand")
            .field("operation", &self.operation)
            .field("key_uid", &self.key_uid)
            .finish_non_exhaustive()
    }
}

/// Runs keystore commands on blocking workers
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    runtime: Handle,
    policy: LockPolicy,
    locks: KeyedLocks,
    in_flight: Arc<AtomicUsize>,
}

impl CommandDispatcher {
    /// Create a dispatcher spawning onto `runtime`
    pub fn new(runtime: Handle, policy: LockPolicy) -> Self {
        Self {
            runtime,
            policy,
            locks: KeyedLocks::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a dispatcher on the runtime of the calling context
    pub fn current(policy: LockPolicy) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| BridgeError::internal(format!("no tokio runtime available: {e}")))?;
        Ok(Self::new(runtime, policy))
    }

    /// Active lock policy
    pub fn lock_policy(&self) -> LockPolicy {
        self.policy
    }

    /// Commands submitted whose callback has not fired yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run `command` off the calling thread and report through `slot`
    pub fn execute(&self, command: KeystoreCommand, slot: CallbackSlot) {
        let id = Uuid::new_v4();
        let span = debug_span!(
            "keystore_command",
            %id,
            operation = command.operation(),
            key_uid = command.key_uid().map(KeyIdentifier::as_str),
        );
        span.in_scope(|| debug!("dispatching keystore command"));

        let locks = match self.policy {
            LockPolicy::PerIdentifier => Some(self.locks.clone()),
            LockPolicy::Unsynchronized => None,
        };
        let in_flight = InFlight::enter(&self.in_flight);

        // Dropping the handle detaches the worker; the slot fires from it.
        drop(self.runtime.spawn_blocking(move || {
            let _entered = span.enter();
            let outcome = run_command(command, locks.as_ref());
            match &outcome {
                Ok(_) => debug!("keystore command succeeded"),
                Err(err) => warn!(code = err.code(), error = err.message(), "keystore command failed"),
            }
            // Observers woken by the slot must already see the command retired.
            drop(in_flight);
            slot.complete(outcome.map_err(ErrorPayload::from));
        }));
    }

    /// Run `command` off the calling thread and await its outcome
    pub fn submit(
        &self,
        command: KeystoreCommand,
    ) -> impl Future<Output = CommandOutcome> + Send + 'static {
        let (slot, outcome) = CallbackSlot::channel();
        self.execute(command, slot);
        async move {
            outcome.await.unwrap_or_else(|_| {
                Err(ErrorPayload::new("command outcome was lost").with_code(INTERNAL_ERROR))
            })
        }
    }
}

fn run_command(command: KeystoreCommand, locks: Option<&KeyedLocks>) -> Result<String> {
    let KeystoreCommand {
        operation,
        key_uid,
        run,
    } = command;

    let _guard = match (locks, key_uid.as_ref()) {
        (Some(locks), Some(key_uid)) => Some(locks.acquire(key_uid)),
        _ => None,
    };

    let raw = panic::catch_unwind(AssertUnwindSafe(run)).map_err(|payload| {
        BridgeError::internal(format!(
            "{operation} panicked: {}",
            panic_message(payload.as_ref())
        ))
    })??;

    interpret_engine_response(raw)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Decrements the in-flight counter when the worker finishes
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
