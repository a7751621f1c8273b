//! Shared helpers for command handlers

use anyhow::{Context, Result};
use keybridge::config::ENV_LOG;
use keybridge::BridgeConfig;
use std::path::{Path, PathBuf};

/// Load configuration: file (if any), environment, then `--root`
pub fn load_config(path: Option<&Path>, root: Option<PathBuf>) -> Result<BridgeConfig> {
    let mut config = match path {
        Some(path) => BridgeConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    config.merge_with_env()?;
    if let Some(root) = root {
        config.no_backup_root = root;
    }
    config
        .validate()
        .context("set the no-backup root with --root, the config file or KEYBRIDGE_NO_BACKUP_ROOT")?;
    Ok(config)
}

/// Filter used by commands that load no configuration
pub const STATELESS_LOG_FILTER: &str = "warn";

/// Logging filter for a command
///
/// `--verbose` wins, then the loaded configuration's `log_filter`. Commands
/// without a configuration read `KEYBRIDGE_LOG` directly.
pub fn log_filter(verbose: bool, config: Option<&BridgeConfig>) -> String {
    if verbose {
        return "debug".to_string();
    }
    match config {
        Some(config) => config.log_filter.clone(),
        None => std::env::var(ENV_LOG).unwrap_or_else(|_| STATELESS_LOG_FILTER.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_log_filter_is_used() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("keybridge.toml");
        std::fs::write(
            &path,
            format!("no_backup_root = {:?}\nlog_filter = \"keybridge=trace\"\n", dir.path()),
        )
        .unwrap();

        let config = load_config(Some(&path), None).unwrap();
        let expected = std::env::var(ENV_LOG).unwrap_or_else(|_| "keybridge=trace".to_string());
        assert_eq!(log_filter(false, Some(&config)), expected);
        keybridge::init_logging(&log_filter(false, Some(&config))).unwrap();
    }

    #[test]
    fn test_verbose_overrides_config() {
        let config = BridgeConfig::from_toml_str("no_backup_root = \"/nb\"\nlog_filter = \"error\"").unwrap();
        assert_eq!(log_filter(false, Some(&config)), "error");
        assert_eq!(log_filter(true, Some(&config)), "debug");
        assert_eq!(log_filter(true, None), "debug");
    }

    #[test]
    fn test_root_flag_overrides_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_config(None, Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.no_backup_root, dir.path());
    }
}
