//! Bridge configuration
//!
//! Loaded from TOML, then overridden by `KEYBRIDGE_*` environment
//! variables, then validated. The no-backup root always comes from the
//! hosting environment and is fixed for the bridge's lifetime.

use keybridge_core::{BridgeError, Result};
use keybridge_effects::LockPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `no_backup_root`
pub const ENV_NO_BACKUP_ROOT: &str = "KEYBRIDGE_NO_BACKUP_ROOT";
/// Overrides `preferences_path`
pub const ENV_PREFERENCES_PATH: &str = "KEYBRIDGE_PREFERENCES_PATH";
/// Overrides `lock_policy` (`per-identifier` or `unsynchronized`)
pub const ENV_LOCK_POLICY: &str = "KEYBRIDGE_LOCK_POLICY";
/// Overrides `log_filter`
pub const ENV_LOG: &str = "KEYBRIDGE_LOG";

/// File name of the default preference store under the no-backup root
pub const DEFAULT_PREFERENCES_FILE: &str = "preferences.json";

/// Runtime configuration of the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Host directory excluded from backups; keystores live below it
    pub no_backup_root: PathBuf,
    /// Preference file; defaults to `<no_backup_root>/preferences.json`
    pub preferences_path: Option<PathBuf>,
    /// Serialization of commands targeting the same identity
    pub lock_policy: LockPolicy,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            no_backup_root: PathBuf::new(),
            preferences_path: None,
            lock_policy: LockPolicy::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Configuration rooted at `no_backup_root` with defaults elsewhere
    pub fn new(no_backup_root: impl Into<PathBuf>) -> Self {
        Self {
            no_backup_root: no_backup_root.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BridgeError::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// File (when given), then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `KEYBRIDGE_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `KEYBRIDGE_*` overrides from an explicit variable set
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_NO_BACKUP_ROOT => self.no_backup_root = PathBuf::from(value),
                ENV_PREFERENCES_PATH => self.preferences_path = Some(PathBuf::from(value)),
                ENV_LOCK_POLICY => self.lock_policy = value.parse()?,
                ENV_LOG => self.log_filter = value,
                _ => {}
            }
        }
        Ok(())
    }

    /// Check invariants the bridge relies on
    pub fn validate(&self) -> Result<()> {
        if self.no_backup_root.as_os_str().is_empty() {
            return Err(BridgeError::config("no_backup_root must be set"));
        }
        if !self.no_backup_root.is_absolute() {
            return Err(BridgeError::config(format!(
                "no_backup_root must be absolute: {}",
                self.no_backup_root.display()
            )));
        }
        if self.log_filter.trim().is_empty() {
            return Err(BridgeError::config("log_filter cannot be empty"));
        }
        Ok(())
    }

    /// Effective preference file location
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(|| self.no_backup_root.join(DEFAULT_PREFERENCES_FILE))
    }
}
