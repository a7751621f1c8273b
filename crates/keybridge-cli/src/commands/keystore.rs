//! Keystore path derivation

use anyhow::Result;
use keybridge::{BridgeConfig, KeyIdentifier, KeystorePaths};
use std::path::PathBuf;

/// Keystore directory of `key_uid` under the configured root
pub fn keystore_path(config: &BridgeConfig, key_uid: &str) -> Result<PathBuf> {
    let key_uid = KeyIdentifier::parse(key_uid)?;
    Ok(KeystorePaths::new(config.no_backup_root.clone()).keystore_dir(&key_uid))
}
