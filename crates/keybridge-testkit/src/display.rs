//! Recording UI surfaces

use keybridge_core::effects::{DisplaySurface, SurfaceProvider};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// One capture-protection change observed by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceMutation {
    /// Requested protection state
    pub enabled: bool,
    /// Name of the thread that applied it
    pub thread: Option<String>,
}

/// Surface that remembers every mutation and the thread it came from
#[derive(Debug, Default)]
pub struct RecordingSurface {
    mutations: Mutex<Vec<SurfaceMutation>>,
}

impl RecordingSurface {
    /// Create a surface with no protection applied yet
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current protection state, `None` if never set
    pub fn capture_protected(&self) -> Option<bool> {
        self.mutations.lock().last().map(|m| m.enabled)
    }

    /// Every mutation in arrival order
    pub fn mutations(&self) -> Vec<SurfaceMutation> {
        self.mutations.lock().clone()
    }
}

impl DisplaySurface for RecordingSurface {
    fn set_capture_protection(&self, enabled: bool) {
        self.mutations.lock().push(SurfaceMutation {
            enabled,
            thread: std::thread::current().name().map(str::to_string),
        });
    }
}

/// Provider whose surface can be attached and detached by the test
#[derive(Default)]
pub struct SwitchableSurfaceProvider {
    surface: RwLock<Option<Arc<dyn DisplaySurface>>>,
}

impl SwitchableSurfaceProvider {
    /// Provider with no surface attached
    pub fn detached() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Provider with `surface` attached
    pub fn attached(surface: Arc<dyn DisplaySurface>) -> Arc<Self> {
        let provider = Self::detached();
        provider.attach(surface);
        provider
    }

    /// Make `surface` the active one
    pub fn attach(&self, surface: Arc<dyn DisplaySurface>) {
        *self.surface.write() = Some(surface);
    }

    /// Remove the active surface
    pub fn detach(&self) {
        *self.surface.write() = None;
    }
}

impl SurfaceProvider for SwitchableSurfaceProvider {
    fn current_surface(&self) -> Option<Arc<dyn DisplaySurface>> {
        self.surface.read().clone()
    }
}

impl std::fmt::Debug for SwitchableSurfaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchableSurfaceProvider")
            .field("attached", &self.surface.read().is_some())
            .finish()
    }
}
