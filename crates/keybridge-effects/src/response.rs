//! Interpretation of raw engine responses
//!
//! The native engine reports many failures in-band: the call returns
//! normally with `{"error": "<message>"}`. An empty `error` field means
//! success. Such responses are turned into [`BridgeError::Engine`] so they
//! travel the same error path as thrown faults.

use keybridge_core::{BridgeError, Result};
use serde_json::Value;

/// Map an in-band engine error to `Err`, pass everything else through
pub fn interpret_engine_response(raw: String) -> Result<String> {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&raw) else {
        return Ok(raw);
    };

    match fields.get("error") {
        Some(Value::String(message)) if !message.is_empty() => {
            let err = match fields.get("code").and_then(Value::as_str) {
                Some(code) => BridgeError::engine_with_code(message.clone(), code),
                None => BridgeError::engine(message.clone()),
            };
            Err(err)
        }
        _ => Ok(raw),
    }
}
