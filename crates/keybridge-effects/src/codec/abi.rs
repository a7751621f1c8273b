//! Contract ABI encoding for the elementary types
//!
//! Covers `address`, `bool`, `uint<N>`, `int<N>`, `bytes<N>`, `bytes` and
//! `string`. Arrays and tuples are rejected as unsupported input.

use super::quantity::{decode_hex, encode_hex, parse_decimal, parse_hex_quantity, to_word};
use keybridge_core::{BridgeError, Result};
use primitive_types::U256;
use serde_json::Value;
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// One elementary ABI type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    /// 20-byte account address
    Address,
    /// Boolean
    Bool,
    /// Unsigned integer of the given bit width
    Uint(usize),
    /// Signed integer of the given bit width
    Int(usize),
    /// Fixed-size byte string
    FixedBytes(usize),
    /// Dynamic byte string
    Bytes,
    /// Dynamic UTF-8 string
    String,
}

impl AbiType {
    /// Parse a type name such as `uint256` or `bytes32`
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.contains(['[', '(', ')']) {
            return Err(BridgeError::validation(format!(
                "unsupported ABI type {name:?}"
            )));
        }

        match name {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "bytes" => return Ok(Self::Bytes),
            "string" => return Ok(Self::String),
            "uint" => return Ok(Self::Uint(256)),
            "int" => return Ok(Self::Int(256)),
            _ => {}
        }

        if let Some(bits) = name.strip_prefix("uint") {
            return parse_bits(name, bits).map(Self::Uint);
        }
        if let Some(bits) = name.strip_prefix("int") {
            return parse_bits(name, bits).map(Self::Int);
        }
        if let Some(size) = name.strip_prefix("bytes") {
            let size: usize = size
                .parse()
                .map_err(|_| BridgeError::validation(format!("unknown ABI type {name:?}")))?;
            if (1..=WORD).contains(&size) {
                return Ok(Self::FixedBytes(size));
            }
        }

        Err(BridgeError::validation(format!("unknown ABI type {name:?}")))
    }

    /// Canonical spelling used in function signatures
    pub fn canonical(&self) -> String {
        match self {
            Self::Address => "address".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Uint(bits) => format!("uint{bits}"),
            Self::Int(bits) => format!("int{bits}"),
            Self::FixedBytes(size) => format!("bytes{size}"),
            Self::Bytes => "bytes".to_string(),
            Self::String => "string".to_string(),
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Bytes | Self::String)
    }
}

fn parse_bits(name: &str, bits: &str) -> Result<usize> {
    let bits: usize = bits
        .parse()
        .map_err(|_| BridgeError::validation(format!("unknown ABI type {name:?}")))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(BridgeError::validation(format!(
            "invalid integer width in {name:?}"
        )));
    }
    Ok(bits)
}

/// A function signature split into its name and parameter types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Parameter types in declaration order
    pub inputs: Vec<AbiType>,
}

impl FunctionSignature {
    /// Parse `name(type,...)`
    pub fn parse(signature: &str) -> Result<Self> {
        let signature = signature.trim();
        let (name, rest) = signature.split_once('(').ok_or_else(|| {
            BridgeError::validation(format!("malformed function signature {signature:?}"))
        })?;
        let params = rest.strip_suffix(')').ok_or_else(|| {
            BridgeError::validation(format!("malformed function signature {signature:?}"))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(BridgeError::validation("function signature has no name"));
        }

        let inputs = if params.trim().is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(AbiType::parse)
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            name: name.to_string(),
            inputs,
        })
    }

    /// Canonical signature text hashed into the selector
    pub fn canonical(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(AbiType::canonical).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// First four bytes of the Keccak-256 hash of the canonical signature
    pub fn selector(&self) -> [u8; 4] {
        let digest = Keccak256::digest(self.canonical().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }
}

/// Encode call data: selector followed by the encoded arguments
pub fn encode_call(signature: &FunctionSignature, args: &[Value]) -> Result<Vec<u8>> {
    let mut data = signature.selector().to_vec();
    data.extend(encode_params(&signature.inputs, args)?);
    Ok(data)
}

/// Head/tail encoding of `args` against `types`
pub fn encode_params(types: &[AbiType], args: &[Value]) -> Result<Vec<u8>> {
    if types.len() != args.len() {
        return Err(BridgeError::validation(format!(
            "expected {} ABI arguments, got {}",
            types.len(),
            args.len()
        )));
    }

    let mut head = Vec::with_capacity(types.len() * WORD);
    let mut tail = Vec::new();
    for (ty, arg) in types.iter().zip(args) {
        if ty.is_dynamic() {
            let offset = U256::from((types.len() * WORD + tail.len()) as u64);
            head.extend_from_slice(&to_word(offset));
            tail.extend(encode_dynamic(*ty, arg)?);
        } else {
            head.extend_from_slice(&encode_static(*ty, arg)?);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn encode_static(ty: AbiType, arg: &Value) -> Result<[u8; WORD]> {
    match ty {
        AbiType::Address => {
            let bytes = decode_hex(expect_str(ty, arg)?)?;
            if bytes.len() != 20 {
                return Err(BridgeError::validation(format!(
                    "address must be 20 bytes, got {}",
                    bytes.len()
                )));
            }
            let mut word = [0u8; WORD];
            word[WORD - 20..].copy_from_slice(&bytes);
            Ok(word)
        }
        AbiType::Bool => {
            let value = match arg {
                Value::Bool(value) => *value,
                Value::String(s) if s == "true" => true,
                Value::String(s) if s == "false" => false,
                other => return Err(type_mismatch(ty, other)),
            };
            Ok(to_word(U256::from(u8::from(value))))
        }
        AbiType::Uint(bits) => {
            let (negative, magnitude) = integer_argument(ty, arg)?;
            if negative && !magnitude.is_zero() {
                return Err(BridgeError::validation(format!(
                    "negative value for {}",
                    ty.canonical()
                )));
            }
            if magnitude.bits() > bits {
                return Err(out_of_range(ty));
            }
            Ok(to_word(magnitude))
        }
        AbiType::Int(bits) => {
            let (negative, magnitude) = integer_argument(ty, arg)?;
            let limit = U256::one() << (bits - 1);
            if negative {
                if magnitude > limit {
                    return Err(out_of_range(ty));
                }
                Ok(to_word((!magnitude).overflowing_add(U256::one()).0))
            } else {
                if magnitude >= limit {
                    return Err(out_of_range(ty));
                }
                Ok(to_word(magnitude))
            }
        }
        AbiType::FixedBytes(size) => {
            let bytes = decode_hex(expect_str(ty, arg)?)?;
            if bytes.len() != size {
                return Err(BridgeError::validation(format!(
                    "{} expects {size} bytes, got {}",
                    ty.canonical(),
                    bytes.len()
                )));
            }
            let mut word = [0u8; WORD];
            word[..size].copy_from_slice(&bytes);
            Ok(word)
        }
        AbiType::Bytes | AbiType::String => Err(BridgeError::internal(format!(
            "{} is not a static type",
            ty.canonical()
        ))),
    }
}

fn encode_dynamic(ty: AbiType, arg: &Value) -> Result<Vec<u8>> {
    let bytes = match ty {
        AbiType::Bytes => decode_hex(expect_str(ty, arg)?)?,
        AbiType::String => expect_str(ty, arg)?.as_bytes().to_vec(),
        _ => {
            return Err(BridgeError::internal(format!(
                "{} is not a dynamic type",
                ty.canonical()
            )))
        }
    };

    let padded_len = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded_len);
    out.extend_from_slice(&to_word(U256::from(bytes.len() as u64)));
    out.extend_from_slice(&bytes);
    out.resize(WORD + padded_len, 0);
    Ok(out)
}

/// Integer argument as (is_negative, magnitude)
fn integer_argument(ty: AbiType, arg: &Value) -> Result<(bool, U256)> {
    match arg {
        Value::Number(n) => {
            if let Some(value) = n.as_u64() {
                Ok((false, U256::from(value)))
            } else if let Some(value) = n.as_i64() {
                Ok((value < 0, U256::from(value.unsigned_abs())))
            } else {
                Err(BridgeError::validation(format!(
                    "{} argument must be an integer, got {n}",
                    ty.canonical()
                )))
            }
        }
        Value::String(s) => {
            let (negative, digits) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s.as_str()),
            };
            let magnitude = if digits.starts_with("0x") || digits.starts_with("0X") {
                parse_hex_quantity(digits)?
            } else {
                parse_decimal(digits)?
            };
            Ok((negative, magnitude))
        }
        other => Err(type_mismatch(ty, other)),
    }
}

fn expect_str(ty: AbiType, arg: &Value) -> Result<&str> {
    arg.as_str().ok_or_else(|| type_mismatch(ty, arg))
}

fn type_mismatch(ty: AbiType, arg: &Value) -> BridgeError {
    BridgeError::validation(format!("invalid {} argument: {arg}", ty.canonical()))
}

fn out_of_range(ty: AbiType) -> BridgeError {
    BridgeError::validation(format!("value out of range for {}", ty.canonical()))
}

/// Decode `data` as a sequence of `types`
///
/// Integers come back as decimal strings so 256-bit values survive JSON.
pub fn decode_params(types: &[AbiType], data: &[u8]) -> Result<Vec<Value>> {
    types
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            let word = read_word(data, index * WORD)?;
            if ty.is_dynamic() {
                let offset = word_to_usize(word)?;
                let len = word_to_usize(read_word(data, offset)?)?;
                let start = offset + WORD;
                let payload = data.get(start..start.saturating_add(len)).ok_or_else(too_short)?;
                decode_dynamic(*ty, payload)
            } else {
                decode_static(*ty, word)
            }
        })
        .collect()
}

fn decode_static(ty: AbiType, word: &[u8]) -> Result<Value> {
    let value = U256::from_big_endian(word);
    match ty {
        AbiType::Address => Ok(Value::String(encode_hex(&word[WORD - 20..]))),
        AbiType::Bool => match value.low_u64() {
            0 if value.is_zero() => Ok(Value::Bool(false)),
            1 if value.bits() == 1 => Ok(Value::Bool(true)),
            _ => Err(BridgeError::validation("invalid bool encoding")),
        },
        AbiType::Uint(_) => Ok(Value::String(value.to_string())),
        AbiType::Int(_) => {
            if word[0] & 0x80 == 0 {
                Ok(Value::String(value.to_string()))
            } else {
                let magnitude = (!value).overflowing_add(U256::one()).0;
                Ok(Value::String(format!("-{magnitude}")))
            }
        }
        AbiType::FixedBytes(size) => Ok(Value::String(encode_hex(&word[..size]))),
        AbiType::Bytes | AbiType::String => Err(BridgeError::internal(format!(
            "{} is not a static type",
            ty.canonical()
        ))),
    }
}

fn decode_dynamic(ty: AbiType, payload: &[u8]) -> Result<Value> {
    match ty {
        AbiType::Bytes => Ok(Value::String(encode_hex(payload))),
        AbiType::String => String::from_utf8(payload.to_vec())
            .map(Value::String)
            .map_err(|e| BridgeError::validation(format!("string is not valid UTF-8: {e}"))),
        _ => Err(BridgeError::internal(format!(
            "{} is not a dynamic type",
            ty.canonical()
        ))),
    }
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8]> {
    data.get(offset..offset.saturating_add(WORD))
        .filter(|word| word.len() == WORD)
        .ok_or_else(too_short)
}

fn word_to_usize(word: &[u8]) -> Result<usize> {
    let value = U256::from_big_endian(word);
    if value.bits() > 32 {
        return Err(BridgeError::validation("ABI offset or length too large"));
    }
    Ok(value.low_u64() as usize)
}

fn too_short() -> BridgeError {
    BridgeError::validation("ABI data too short")
}
