//! Stateless codec utilities

use anyhow::Result;
use clap::Subcommand;
use keybridge_core::effects::CodecEngine;
use keybridge_effects::LocalCodecEngine;

/// Codec commands, exposed at the top level
#[derive(Subcommand, Debug)]
pub enum CodecCommand {
    /// Keccak-256 of a UTF-8 string
    Sha3 {
        /// Input text
        input: String,
    },

    /// Hex encoding of a UTF-8 string
    Utf8ToHex {
        /// Input text
        input: String,
    },

    /// UTF-8 text encoded by a hex string
    HexToUtf8 {
        /// Hex input, optionally 0x-prefixed
        hex: String,
    },

    /// Decimal number to 0x-prefixed hex
    NumberToHex {
        /// Decimal input
        number: String,
    },

    /// 0x-prefixed hex to decimal number
    HexToNumber {
        /// Hex input
        hex: String,
    },

    /// ERC-20 transfer call data
    EncodeTransfer {
        /// Recipient address
        to: String,
        /// Amount in base units (decimal)
        value: String,
    },

    /// ABI call data for a function signature
    EncodeFunctionCall {
        /// Signature, e.g. `transfer(address,uint256)`
        method: String,
        /// Parameters as a JSON array
        params: String,
    },

    /// Decode ABI parameters
    DecodeParameters {
        /// `{"bytesString": "...", "types": [...]}`
        request: String,
    },
}

/// Run a codec command and return its output
pub fn handle_codec_command(cmd: CodecCommand) -> Result<String> {
    let codec = LocalCodecEngine::new();
    let output = match cmd {
        CodecCommand::Sha3 { input } => codec.sha3(&input)?,
        CodecCommand::Utf8ToHex { input } => codec.utf8_to_hex(&input)?,
        CodecCommand::HexToUtf8 { hex } => codec.hex_to_utf8(&hex)?,
        CodecCommand::NumberToHex { number } => codec.number_to_hex(&number)?,
        CodecCommand::HexToNumber { hex } => codec.hex_to_number(&hex)?,
        CodecCommand::EncodeTransfer { to, value } => codec.encode_transfer(&to, &value)?,
        CodecCommand::EncodeFunctionCall { method, params } => {
            codec.encode_function_call(&method, &params)?
        }
        CodecCommand::DecodeParameters { request } => codec.decode_parameters(&request)?,
    };
    Ok(output)
}
