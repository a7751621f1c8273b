//! Identifier and request types shared by every bridge layer

use crate::errors::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Maximum accepted length of a key identifier, in bytes
pub const MAX_KEY_UID_LEN: usize = 255;

/// Opaque identifier of one user's key/account set
///
/// Used verbatim as a path segment under the keystore root, so construction
/// rejects anything that could escape that directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyIdentifier(String);

impl KeyIdentifier {
    /// Validate and wrap a caller-supplied key uid
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(BridgeError::validation("key uid cannot be empty"));
        }

        if raw.len() > MAX_KEY_UID_LEN {
            return Err(BridgeError::validation(format!(
                "key uid too long (max {MAX_KEY_UID_LEN} bytes)"
            )));
        }

        if raw == "." || raw.contains("..") {
            return Err(BridgeError::validation("key uid cannot reference a parent directory"));
        }

        if raw.contains(['/', '\\', '\0']) {
            return Err(BridgeError::validation("key uid contains invalid characters"));
        }

        Ok(Self(raw))
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KeyIdentifier {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for KeyIdentifier {
    type Error = BridgeError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<KeyIdentifier> for String {
    fn from(value: KeyIdentifier) -> Self {
        value.0
    }
}

/// Password material, wiped from memory on drop and redacted from `Debug`
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wrap a password
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Expose the password to the engine
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Re-encrypt the database and keystore of one identity under a new password
#[derive(Debug, Clone)]
pub struct PasswordChangeRequest {
    /// Identity whose database is re-encrypted
    pub key_uid: KeyIdentifier,
    /// Password currently protecting the database
    pub current_password: Password,
    /// Password to re-encrypt with
    pub new_password: Password,
}

/// Move an identity's accounts onto a hardware keycard
#[derive(Debug, Clone)]
pub struct KeycardConversionRequest {
    /// Identity being converted
    pub key_uid: KeyIdentifier,
    /// Engine-defined account description (JSON)
    pub account_data: String,
    /// Engine-defined conversion options (JSON)
    pub options: String,
    /// Identifier of the target keycard
    pub keycard_uid: String,
    /// Password currently protecting the database
    pub current_password: Password,
    /// Password derived from the keycard
    pub new_password: Password,
}
