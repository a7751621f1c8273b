//! Hex quantity and byte-string helpers

use keybridge_core::{BridgeError, Result};
use primitive_types::U256;

/// Strip an optional `0x`/`0X` prefix
pub(crate) fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Decode hex bytes, prefix optional
pub(crate) fn decode_hex(input: &str) -> Result<Vec<u8>> {
    hex::decode(strip_hex_prefix(input))
        .map_err(|e| BridgeError::validation(format!("invalid hex {input:?}: {e}")))
}

/// `0x`-prefixed lowercase hex of `bytes`
pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a `0x`-prefixed hex quantity of at most 256 bits
pub(crate) fn parse_hex_quantity(input: &str) -> Result<U256> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| BridgeError::validation(format!("hex string without 0x prefix: {input:?}")))?;

    if digits.is_empty() {
        return Err(BridgeError::validation("empty hex quantity"));
    }

    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded)
        .map_err(|e| BridgeError::validation(format!("invalid hex quantity {input:?}: {e}")))?;

    let significant = bytes.iter().skip_while(|b| **b == 0).count();
    if significant > 32 {
        return Err(BridgeError::validation(format!(
            "hex quantity {input:?} exceeds 256 bits"
        )));
    }

    Ok(U256::from_big_endian(&bytes[bytes.len() - significant..]))
}

/// Parse an unsigned decimal integer of at most 256 bits
pub(crate) fn parse_decimal(input: &str) -> Result<U256> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BridgeError::validation(format!("invalid decimal number {input:?}")));
    }
    U256::from_dec_str(input)
        .map_err(|e| BridgeError::validation(format!("invalid decimal number {input:?}: {e:?}")))
}

/// Minimal `0x`-prefixed hex rendering (`0x0` for zero)
pub(crate) fn format_hex_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

/// Big-endian 32-byte word of `value`
pub(crate) fn to_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}
