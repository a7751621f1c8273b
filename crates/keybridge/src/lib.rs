//! Keybridge: asynchronous keystore bridge for host applications
//!
//! Exposes the `EncryptionUtils` module: keystore initialization, database
//! re-encryption and keycard conversion run off the caller's thread and
//! report exactly once through a callback slot; codec helpers run inline;
//! a persisted blank-preview flag controls capture protection of the
//! host's UI surface.
//!
//! ```no_run
//! use keybridge::{BridgeBuilder, BridgeConfig};
//! # fn engine() -> std::sync::Arc<dyn keybridge::effects::KeystoreEngine> { unimplemented!() }
//!
//! let bridge = BridgeBuilder::new(BridgeConfig::new("/data/app/no_backup"))
//!     .with_engine(engine())
//!     .build()?;
//! let hash = bridge.sha3("abc")?;
//! # Ok::<(), keybridge::BridgeError>(())
//! ```

pub mod builder;
pub mod config;
pub mod display;
pub mod logging;
pub mod module;

pub use builder::BridgeBuilder;
pub use config::BridgeConfig;
pub use display::{HeadlessSurfaces, SecureDisplayController};
pub use logging::init_logging;
pub use module::{EncryptionBridge, MODULE_NAME};

pub use keybridge_core::{
    effects, BridgeError, ErrorPayload, KeyIdentifier, KeystorePaths, Password, Result,
};
pub use keybridge_effects::{CallbackSlot, CommandOutcome, LockPolicy};
