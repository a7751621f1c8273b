//! Instrumented callback slots

use keybridge_effects::{CallbackSlot, CommandOutcome};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Observes how often, and with what, a slot fired
#[derive(Debug, Clone, Default)]
pub struct CallbackWatch {
    calls: Arc<AtomicUsize>,
    outcomes: Arc<Mutex<Vec<CommandOutcome>>>,
    fired: Arc<Notify>,
}

impl CallbackWatch {
    /// Number of times the slot fired
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// First outcome delivered, if any
    pub fn outcome(&self) -> Option<CommandOutcome> {
        self.outcomes.lock().first().cloned()
    }

    /// Wait until the slot has fired at least once
    pub async fn wait(&self, timeout: Duration) -> Option<CommandOutcome> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.fired.notified();
            if let Some(outcome) = self.outcome() {
                return Some(outcome);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.outcome();
            }
        }
    }
}

/// Slot paired with a watch counting its invocations
pub fn counting_slot() -> (CallbackSlot, CallbackWatch) {
    let watch = CallbackWatch::default();
    let observer = watch.clone();
    let slot = CallbackSlot::new(move |outcome| {
        // Count first: a waiter woken by the outcome must see the call.
        observer.calls.fetch_add(1, Ordering::SeqCst);
        observer.outcomes.lock().push(outcome);
        observer.fired.notify_waiters();
    });
    (slot, watch)
}
