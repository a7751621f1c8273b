//! Assembly of an [`EncryptionBridge`] from configuration and host handlers
//!
//! Only the keystore engine is mandatory. Everything else falls back to an
//! in-process default:
//!
//! | Capability   | Default                                          |
//! |--------------|--------------------------------------------------|
//! | codec        | [`LocalCodecEngine`]                             |
//! | preferences  | [`FilePreferenceStore`] at the configured path   |
//! | surfaces     | [`HeadlessSurfaces`]                             |
//! | UI executor  | [`UiThreadExecutor`] named `keybridge-ui`        |
//! | runtime      | calling context, else an owned worker runtime    |
//!
//! [`BridgeBuilder::with_logging`] installs the global subscriber from the
//! configuration's `log_filter` during `build`.

use crate::config::BridgeConfig;
use crate::display::{HeadlessSurfaces, SecureDisplayController};
use crate::logging::init_logging;
use crate::module::EncryptionBridge;
use keybridge_core::effects::{
    CodecEngine, KeystoreEngine, PreferenceEffects, SurfaceProvider, UiExecutor,
};
use keybridge_core::{BridgeError, KeystorePaths, Result};
use keybridge_effects::{
    CommandDispatcher, FilePreferenceStore, LocalCodecEngine, UiThreadExecutor,
};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

/// Thread name of the UI executor created by default
pub const DEFAULT_UI_THREAD: &str = "keybridge-ui";

/// Thread name prefix of the owned worker runtime
pub const WORKER_THREAD: &str = "keybridge-worker";

/// Builder for [`EncryptionBridge`]
pub struct BridgeBuilder {
    config: BridgeConfig,
    engine: Option<Arc<dyn KeystoreEngine>>,
    codec: Option<Arc<dyn CodecEngine>>,
    preferences: Option<Arc<dyn PreferenceEffects>>,
    surfaces: Option<Arc<dyn SurfaceProvider>>,
    ui: Option<Arc<dyn UiExecutor>>,
    runtime: Option<Handle>,
    install_logging: bool,
}

impl BridgeBuilder {
    /// Start from a configuration
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            engine: None,
            codec: None,
            preferences: None,
            surfaces: None,
            ui: None,
            runtime: None,
            install_logging: false,
        }
    }

    /// Native keystore engine (required)
    pub fn with_engine(mut self, engine: Arc<dyn KeystoreEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Codec engine
    pub fn with_codec(mut self, codec: Arc<dyn CodecEngine>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Preference store
    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceEffects>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Source of the active UI surface
    pub fn with_surfaces(mut self, surfaces: Arc<dyn SurfaceProvider>) -> Self {
        self.surfaces = Some(surfaces);
        self
    }

    /// Executor bound to the host's UI thread
    pub fn with_ui_executor(mut self, ui: Arc<dyn UiExecutor>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Runtime whose blocking pool runs keystore commands
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Install the `tracing` subscriber from `log_filter` when building
    pub fn with_logging(mut self) -> Self {
        self.install_logging = true;
        self
    }

    /// Validate the configuration and assemble the bridge
    pub fn build(self) -> Result<EncryptionBridge> {
        self.config.validate()?;
        if self.install_logging {
            init_logging(&self.config.log_filter)?;
        }
        let engine = self
            .engine
            .ok_or_else(|| BridgeError::config("a keystore engine is required"))?;

        let codec: Arc<dyn CodecEngine> = match self.codec {
            Some(codec) => codec,
            None => Arc::new(LocalCodecEngine::new()),
        };
        let preferences: Arc<dyn PreferenceEffects> = match self.preferences {
            Some(preferences) => preferences,
            None => Arc::new(FilePreferenceStore::new(self.config.preferences_path())),
        };
        let surfaces: Arc<dyn SurfaceProvider> = match self.surfaces {
            Some(surfaces) => surfaces,
            None => Arc::new(HeadlessSurfaces),
        };
        let ui: Arc<dyn UiExecutor> = match self.ui {
            Some(ui) => ui,
            None => Arc::new(UiThreadExecutor::spawn(DEFAULT_UI_THREAD)?),
        };

        let (handle, owned) = match self.runtime.or_else(|| Handle::try_current().ok()) {
            Some(handle) => (handle, None),
            None => {
                let runtime = worker_runtime()?;
                (runtime.handle().clone(), Some(runtime))
            }
        };

        info!(
            no_backup_root = %self.config.no_backup_root.display(),
            lock_policy = ?self.config.lock_policy,
            owned_runtime = owned.is_some(),
            "encryption bridge ready"
        );

        Ok(EncryptionBridge::from_parts(
            KeystorePaths::new(self.config.no_backup_root.clone()),
            engine,
            codec,
            CommandDispatcher::new(handle, self.config.lock_policy),
            SecureDisplayController::new(preferences, surfaces, ui),
            owned,
        ))
    }
}

impl std::fmt::Debug for BridgeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("config", &self.config)
            .field("engine", &self.engine.is_some())
            .field("runtime", &self.runtime.is_some())
            .field("install_logging", &self.install_logging)
            .finish_non_exhaustive()
    }
}

fn worker_runtime() -> Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name(WORKER_THREAD)
        .enable_all()
        .build()
        .map_err(|e| BridgeError::internal(format!("failed to start worker runtime: {e}")))
}
