//! Keystore path derivation
//!
//! Pure composition of `<no-backup-root>/keystore/<key-uid>`. Nothing here
//! touches the filesystem; directory creation belongs to the engine's
//! `init_keystore`.

use crate::types::KeyIdentifier;
use std::path::{Path, PathBuf};

/// Directory name holding every per-identity keystore
pub const KEYSTORE_DIR_NAME: &str = "keystore";

/// Derive the keystore directory of one identity
pub fn keystore_dir(no_backup_root: &Path, key_uid: &KeyIdentifier) -> PathBuf {
    no_backup_root
        .join(KEYSTORE_DIR_NAME)
        .join(key_uid.as_str())
}

/// Path resolver bound to the host's no-backup root
///
/// The root is fixed when the resolver is built and never taken from a
/// caller request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystorePaths {
    no_backup_root: PathBuf,
}

impl KeystorePaths {
    /// Bind a resolver to the host-supplied no-backup root
    pub fn new(no_backup_root: impl Into<PathBuf>) -> Self {
        Self {
            no_backup_root: no_backup_root.into(),
        }
    }

    /// The host-supplied no-backup root
    pub fn no_backup_root(&self) -> &Path {
        &self.no_backup_root
    }

    /// Directory holding every identity's keystore
    pub fn keystore_root(&self) -> PathBuf {
        self.no_backup_root.join(KEYSTORE_DIR_NAME)
    }

    /// Keystore directory of one identity
    pub fn keystore_dir(&self, key_uid: &KeyIdentifier) -> PathBuf {
        keystore_dir(&self.no_backup_root, key_uid)
    }
}
