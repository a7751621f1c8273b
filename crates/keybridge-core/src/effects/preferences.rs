//! Persisted preference capability

use crate::errors::Result;

/// Preference key of the secure-display flag
pub const BLANK_PREVIEW_KEY: &str = "BLANK_PREVIEW";

/// Fail-secure default: block screen capture unless told otherwise
pub const BLANK_PREVIEW_DEFAULT: bool = true;

/// Key-value preference store injected into components that persist flags
pub trait PreferenceEffects: Send + Sync {
    /// Read a boolean, returning `default` when the key was never written
    fn get_bool(&self, key: &str, default: bool) -> Result<bool>;

    /// Durably write a boolean
    fn put_bool(&self, key: &str, value: bool) -> Result<()>;
}
