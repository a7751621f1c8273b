//! Effective configuration

use anyhow::Result;
use keybridge::BridgeConfig;

/// Render `config` as TOML
pub fn show_config(config: &BridgeConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
