//! Unified error system for the keystore bridge
//!
//! A single error enum covers every fault the bridge can observe. Async
//! commands never surface it directly: the dispatcher flattens it into an
//! [`ErrorPayload`] so callers see one uniform `{message, code}` shape
//! regardless of where the fault came from.

use serde::{Deserialize, Serialize};

/// Stable error code for malformed input rejected before dispatch
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Default error code for engine-reported failures without their own code
pub const ENGINE_ERROR: &str = "ENGINE_ERROR";
/// Error code for filesystem failures
pub const IO_ERROR: &str = "IO_ERROR";
/// Error code for configuration failures
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
/// Error code for encoding/decoding failures
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";
/// Error code for internal faults, including panics inside a command
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Unified error type for all bridge operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BridgeError {
    /// Malformed or unexpected input
    #[error("Invalid: {message}")]
    Validation {
        /// Error message describing the invalid input
        message: String,
    },

    /// The external engine reported a failure
    #[error("Engine error: {message}")]
    Engine {
        /// Message reported by the engine
        message: String,
        /// Engine-specific error code, when the engine supplied one
        code: Option<String>,
    },

    /// Filesystem operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message describing the I/O failure
        message: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl BridgeError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an engine error without an engine-specific code
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
            code: None,
        }
    }

    /// Create an engine error carrying the engine's own error code
    pub fn engine_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable code reported to callers for this error
    pub fn code(&self) -> &str {
        match self {
            Self::Validation { .. } => VALIDATION_ERROR,
            Self::Engine { code, .. } => code.as_deref().unwrap_or(ENGINE_ERROR),
            Self::Io { .. } => IO_ERROR,
            Self::Config { .. } => CONFIG_ERROR,
            Self::Serialization { .. } => SERIALIZATION_ERROR,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    /// Bare message without the category prefix used by `Display`
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Engine { message, .. }
            | Self::Io { message }
            | Self::Config { message }
            | Self::Serialization { message }
            | Self::Internal { message } => message,
        }
    }
}

/// Standard Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Structured error delivered to a callback's error path
///
/// Serializes as `{"message": "...", "code": "..."}`; `code` is omitted
/// when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable failure description
    pub message: String,
    /// Machine-readable failure code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorPayload {
    /// Create a payload with a message and no code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach a code to the payload
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<&BridgeError> for ErrorPayload {
    fn from(err: &BridgeError) -> Self {
        Self {
            message: err.message().to_string(),
            code: Some(err.code().to_string()),
        }
    }
}

impl From<BridgeError> for ErrorPayload {
    fn from(err: BridgeError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}
