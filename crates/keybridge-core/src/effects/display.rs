//! Host UI capabilities used for capture protection

use std::sync::Arc;

/// Unit of work marshaled onto the UI-owning thread
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// A UI surface (window) whose capture protection can be toggled
///
/// Implementations may assume they are only mutated from the UI thread.
pub trait DisplaySurface: Send + Sync {
    /// Enable or disable screen capture/preview protection
    fn set_capture_protection(&self, enabled: bool);
}

/// Source of the currently active surface, if any
pub trait SurfaceProvider: Send + Sync {
    /// The active surface, or `None` while the host has no UI attached
    fn current_surface(&self) -> Option<Arc<dyn DisplaySurface>>;
}

/// Executor with UI-thread affinity
pub trait UiExecutor: Send + Sync {
    /// Run `task` on the UI-owning thread, regardless of the calling thread
    fn run_on_ui(&self, task: UiTask);
}
