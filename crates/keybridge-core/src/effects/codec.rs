//! Stateless encoding capability

use crate::errors::Result;

/// Pure, deterministic string transformations
///
/// These are cheap CPU-only calls executed inline on the caller's thread.
pub trait CodecEngine: Send + Sync {
    /// ERC-20 `transfer(to, value)` call data
    fn encode_transfer(&self, to: &str, value: &str) -> Result<String>;

    /// Call data for `method` (canonical signature) with JSON-array params
    fn encode_function_call(&self, method: &str, params_json: &str) -> Result<String>;

    /// Decode ABI data described by `{"bytesString": .., "types": [..]}`
    fn decode_parameters(&self, decode_params_json: &str) -> Result<String>;

    /// `0x`-prefixed hex quantity to a decimal string
    fn hex_to_number(&self, hex: &str) -> Result<String>;

    /// Decimal string to a `0x`-prefixed hex quantity
    fn number_to_hex(&self, number: &str) -> Result<String>;

    /// Keccak-256 digest of the UTF-8 bytes of `input`
    fn sha3(&self, input: &str) -> Result<String>;

    /// Hex encoding of the UTF-8 bytes of `input`
    fn utf8_to_hex(&self, input: &str) -> Result<String>;

    /// UTF-8 text from hex-encoded bytes
    fn hex_to_utf8(&self, hex: &str) -> Result<String>;
}
