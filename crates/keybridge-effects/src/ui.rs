//! UI-affinity executor
//!
//! Owns one dedicated thread that plays the role of the host's UI thread.
//! Every display mutation is marshaled onto it, whichever thread asks.
//! Hosts with a real UI loop implement [`UiExecutor`] over that loop instead.

use keybridge_core::effects::{UiExecutor, UiTask};
use keybridge_core::{BridgeError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Executor backed by a dedicated UI thread
#[derive(Debug)]
pub struct UiThreadExecutor {
    sender: Option<mpsc::UnboundedSender<UiTask>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl UiThreadExecutor {
    /// Start the UI thread under `name`
    pub fn spawn(name: &str) -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<UiTask>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(task) = receiver.blocking_recv() {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        warn!("ui task panicked");
                    }
                }
                debug!("ui executor stopped");
            })
            .map_err(|e| BridgeError::internal(format!("failed to start ui thread: {e}")))?;

        Ok(Self {
            sender: Some(sender),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    /// Whether the calling thread is the UI thread
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Block until every task queued before this call has run
    pub fn wait_idle(&self) {
        if self.is_ui_thread() {
            return;
        }
        let (done_tx, done_rx) = std::sync::mpsc::sync_channel(1);
        self.run_on_ui(Box::new(move || {
            let _ = done_tx.send(());
        }));
        // A closed executor never runs the marker; recv then fails fast.
        let _ = done_rx.recv();
    }
}

impl UiExecutor for UiThreadExecutor {
    fn run_on_ui(&self, task: UiTask) {
        if self.is_ui_thread() {
            task();
            return;
        }

        match &self.sender {
            Some(sender) => {
                if sender.send(task).is_err() {
                    debug!("ui executor closed; task dropped");
                }
            }
            None => debug!("ui executor closed; task dropped"),
        }
    }
}

impl Drop for UiThreadExecutor {
    fn drop(&mut self) {
        // Closing the channel ends the loop once queued tasks drain.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if !self.is_ui_thread() && handle.join().is_err() {
                warn!("ui thread terminated abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_tasks_run_on_ui_thread() {
        let executor = Arc::new(UiThreadExecutor::spawn("test-ui").unwrap());
        let observed = Arc::new(parking_lot::Mutex::new(None));

        let from_worker = {
            let executor = executor.clone();
            let observed = observed.clone();
            thread::spawn(move || {
                executor.run_on_ui(Box::new(move || {
                    *observed.lock() = thread::current().name().map(str::to_string);
                }));
            })
        };
        from_worker.join().unwrap();
        executor.wait_idle();

        assert_eq!(observed.lock().as_deref(), Some("test-ui"));
        assert!(!executor.is_ui_thread());
    }

    #[test]
    fn test_tasks_run_in_submission_order() {
        let executor = UiThreadExecutor::spawn("ordered-ui").unwrap();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            executor.run_on_ui(Box::new(move || order.lock().push(i)));
        }
        executor.wait_idle();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_panicking_task_does_not_stop_executor() {
        let executor = UiThreadExecutor::spawn("sturdy-ui").unwrap();
        executor.run_on_ui(Box::new(|| panic!("bad task")));
        let ran = Arc::new(parking_lot::Mutex::new(false));
        let flag = ran.clone();
        executor.run_on_ui(Box::new(move || *flag.lock() = true));
        executor.wait_idle();
        assert!(*ran.lock());
    }
}
