//! Secure display control
//!
//! The blank-preview flag decides whether the active UI surface is
//! protected from screenshots and task-switcher previews. The flag is
//! persisted before it is applied, and every surface mutation is marshaled
//! onto the UI thread.

use keybridge_core::effects::{
    DisplaySurface, PreferenceEffects, SurfaceProvider, UiExecutor, BLANK_PREVIEW_DEFAULT,
    BLANK_PREVIEW_KEY,
};
use keybridge_core::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Surface provider for hosts without any UI
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessSurfaces;

impl SurfaceProvider for HeadlessSurfaces {
    fn current_surface(&self) -> Option<Arc<dyn DisplaySurface>> {
        None
    }
}

/// Persists the blank-preview flag and applies it to the active surface
#[derive(Clone)]
pub struct SecureDisplayController {
    preferences: Arc<dyn PreferenceEffects>,
    surfaces: Arc<dyn SurfaceProvider>,
    ui: Arc<dyn UiExecutor>,
}

impl SecureDisplayController {
    /// Create a controller over the given host capabilities
    pub fn new(
        preferences: Arc<dyn PreferenceEffects>,
        surfaces: Arc<dyn SurfaceProvider>,
        ui: Arc<dyn UiExecutor>,
    ) -> Self {
        Self {
            preferences,
            surfaces,
            ui,
        }
    }

    /// Persisted flag value; unreadable storage counts as protected
    pub fn blank_preview(&self) -> bool {
        match self
            .preferences
            .get_bool(BLANK_PREVIEW_KEY, BLANK_PREVIEW_DEFAULT)
        {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to read blank-preview flag, protecting surface");
                BLANK_PREVIEW_DEFAULT
            }
        }
    }

    /// Persist `enabled`, then re-apply protection from the stored flag
    ///
    /// Protection is re-applied even when the write fails, so the surface
    /// always reflects what storage holds.
    pub fn set_blank_preview_flag(&self, enabled: bool) -> Result<()> {
        let persisted = self.preferences.put_bool(BLANK_PREVIEW_KEY, enabled);
        self.apply_display_protection();
        persisted
    }

    /// Apply the stored flag to the active surface, if there is one
    pub fn apply_display_protection(&self) {
        let protect = self.blank_preview();
        let Some(surface) = self.surfaces.current_surface() else {
            debug!(protect, "no active surface, capture protection not applied");
            return;
        };
        debug!(protect, "scheduling capture protection update");
        self.ui
            .run_on_ui(Box::new(move || surface.set_capture_protection(protect)));
    }
}

impl fmt::Debug for SecureDisplayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureDisplayController").finish_non_exhaustive()
    }
}
