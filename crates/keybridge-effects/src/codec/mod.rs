//! Local implementation of the stateless codec functions
//!
//! Mirrors the native engine's string contracts so hosts and tests get a
//! deterministic codec without loading the engine.

pub mod abi;
mod quantity;

use abi::{AbiType, FunctionSignature};
use keybridge_core::effects::CodecEngine;
use keybridge_core::{BridgeError, Result};
use quantity::{decode_hex, encode_hex, format_hex_quantity, parse_decimal, parse_hex_quantity};
use serde::Deserialize;
use serde_json::Value;
use sha3::{Digest, Keccak256};

/// Signature of the ERC-20 transfer function
pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// Request body accepted by `decode_parameters`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodeParameters {
    bytes_string: String,
    types: Vec<String>,
}

/// Codec engine implemented in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCodecEngine;

impl LocalCodecEngine {
    /// Create the codec
    pub fn new() -> Self {
        Self
    }
}

impl CodecEngine for LocalCodecEngine {
    fn encode_transfer(&self, to: &str, value: &str) -> Result<String> {
        let signature = FunctionSignature::parse(TRANSFER_SIGNATURE)?;
        let data = abi::encode_call(
            &signature,
            &[Value::String(to.to_string()), Value::String(value.to_string())],
        )?;
        Ok(encode_hex(&data))
    }

    fn encode_function_call(&self, method: &str, params_json: &str) -> Result<String> {
        let signature = FunctionSignature::parse(method)?;
        let params: Vec<Value> = serde_json::from_str(params_json).map_err(|e| {
            BridgeError::validation(format!("params must be a JSON array: {e}"))
        })?;
        let data = abi::encode_call(&signature, &params)?;
        Ok(encode_hex(&data))
    }

    fn decode_parameters(&self, decode_params_json: &str) -> Result<String> {
        let request: DecodeParameters = serde_json::from_str(decode_params_json)
            .map_err(|e| BridgeError::validation(format!("invalid decode request: {e}")))?;
        let types = request
            .types
            .iter()
            .map(|name| AbiType::parse(name))
            .collect::<Result<Vec<_>>>()?;
        let data = decode_hex(&request.bytes_string)?;
        let values = abi::decode_params(&types, &data)?;
        Ok(serde_json::to_string(&values)?)
    }

    fn hex_to_number(&self, hex: &str) -> Result<String> {
        Ok(parse_hex_quantity(hex)?.to_string())
    }

    fn number_to_hex(&self, number: &str) -> Result<String> {
        Ok(format_hex_quantity(parse_decimal(number)?))
    }

    fn sha3(&self, input: &str) -> Result<String> {
        Ok(encode_hex(&Keccak256::digest(input.as_bytes())))
    }

    fn utf8_to_hex(&self, input: &str) -> Result<String> {
        Ok(encode_hex(input.as_bytes()))
    }

    fn hex_to_utf8(&self, hex: &str) -> Result<String> {
        String::from_utf8(decode_hex(hex)?)
            .map_err(|e| BridgeError::validation(format!("hex does not encode UTF-8: {e}")))
    }
}
