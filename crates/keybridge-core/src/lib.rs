//! Keybridge Core: interfaces for the keystore bridge
//!
//! This crate holds everything the other layers agree on and nothing that
//! performs I/O:
//!
//! - **Types**: validated [`KeyIdentifier`], redacting [`Password`] and the
//!   transient request records
//! - **Errors**: the unified [`BridgeError`] and the caller-facing
//!   [`ErrorPayload`]
//! - **Paths**: keystore directory derivation ([`KeystorePaths`])
//! - **Effects**: traits for the native engine, codec functions,
//!   preference store and host UI

pub mod effects;
pub mod errors;
pub mod paths;
pub mod types;

pub use errors::{BridgeError, ErrorPayload, Result};
pub use paths::{keystore_dir, KeystorePaths, KEYSTORE_DIR_NAME};
pub use types::{
    KeyIdentifier, KeycardConversionRequest, Password, PasswordChangeRequest, MAX_KEY_UID_LEN,
};
