//! Single-shot result continuations for dispatched commands

use keybridge_core::errors::{ErrorPayload, INTERNAL_ERROR};
use std::fmt;
use tokio::sync::oneshot;
use tracing::warn;

/// Terminal result of one dispatched command
pub type CommandOutcome = std::result::Result<String, ErrorPayload>;

type Continuation = Box<dyn FnOnce(CommandOutcome) + Send + 'static>;

/// Continuation bound to exactly one dispatched command
///
/// Completing a slot consumes it, so it cannot fire twice. A slot that is
/// dropped without being completed (a worker that never ran, a runtime
/// that shut down) still fires once, with an `INTERNAL_ERROR` payload.
pub struct CallbackSlot {
    continuation: Option<Continuation>,
}

impl CallbackSlot {
    /// Slot invoked with the full outcome
    pub fn new<F>(continuation: F) -> Self
    where
        F: FnOnce(CommandOutcome) + Send + 'static,
    {
        Self {
            continuation: Some(Box::new(continuation)),
        }
    }

    /// Slot with separate success and error continuations
    pub fn from_parts<S, E>(on_success: S, on_error: E) -> Self
    where
        S: FnOnce(String) + Send + 'static,
        E: FnOnce(ErrorPayload) + Send + 'static,
    {
        Self::new(move |outcome| match outcome {
            Ok(value) => on_success(value),
            Err(error) => on_error(error),
        })
    }

    /// Slot using the host convention `(error, result)`, exactly one of
    /// which is present
    pub fn from_host_callback<F>(callback: F) -> Self
    where
        F: FnOnce(Option<ErrorPayload>, Option<String>) + Send + 'static,
    {
        Self::new(move |outcome| match outcome {
            Ok(value) => callback(None, Some(value)),
            Err(error) => callback(Some(error), None),
        })
    }

    /// Slot that forwards its outcome into a oneshot channel
    pub fn channel() -> (Self, oneshot::Receiver<CommandOutcome>) {
        let (tx, rx) = oneshot::channel();
        let slot = Self::new(move |outcome| {
            // The receiver may have given up; the outcome is then discarded.
            let _ = tx.send(outcome);
        });
        (slot, rx)
    }

    /// Deliver a success value
    pub fn succeed(self, value: String) {
        self.complete(Ok(value));
    }

    /// Deliver an error payload
    pub fn fail(self, error: ErrorPayload) {
        self.complete(Err(error));
    }

    /// Deliver an outcome
    pub fn complete(mut self, outcome: CommandOutcome) {
        if let Some(continuation) = self.continuation.take() {
            continuation(outcome);
        }
    }
}

impl Drop for CallbackSlot {
    fn drop(&mut self) {
        if let Some(continuation) = self.continuation.take() {
            warn!("callback slot dropped before completion");
            continuation(Err(ErrorPayload::new(
                "command was dropped before it produced an outcome",
            )
            .with_code(INTERNAL_ERROR)));
        }
    }
}

impl fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("pending", &self.continuation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_complete_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let slot = CallbackSlot::new(move |outcome| {
            assert_eq!(outcome, Ok("done".to_string()));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        slot.succeed("done".to_string());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_split_continuations() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let (ok, err) = (seen.clone(), seen.clone());
        CallbackSlot::from_parts(
            move |value| ok.lock().push(format!("ok:{value}")),
            move |error: ErrorPayload| err.lock().push(format!("err:{}", error.message)),
        )
        .succeed("0x1".to_string());

        let (ok, err) = (seen.clone(), seen.clone());
        CallbackSlot::from_parts(
            move |value| ok.lock().push(format!("ok:{value}")),
            move |error: ErrorPayload| err.lock().push(format!("err:{}", error.message)),
        )
        .fail(ErrorPayload::new("locked"));

        assert_eq!(*seen.lock(), vec!["ok:0x1".to_string(), "err:locked".to_string()]);
    }

    #[test]
    fn test_drop_without_completion_reports_internal_error() {
        let (slot, mut rx) = CallbackSlot::channel();
        drop(slot);
        let outcome = rx.try_recv().unwrap();
        let error = outcome.unwrap_err();
        assert_eq!(error.code.as_deref(), Some(INTERNAL_ERROR));
    }

    #[test]
    fn test_host_callback_receives_exactly_one_side() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        CallbackSlot::from_host_callback(move |err, res| sink.lock().push((err, res)))
            .fail(ErrorPayload::new("bad"));
        let sink = seen.clone();
        CallbackSlot::from_host_callback(move |err, res| sink.lock().push((err, res)))
            .succeed("ok".to_string());

        let seen = seen.lock();
        assert_eq!(seen[0], (Some(ErrorPayload::new("bad")), None));
        assert_eq!(seen[1], (None, Some("ok".to_string())));
    }
}
