//! Process-wide `tracing` subscriber
//!
//! Hosts that already install a subscriber can skip this; a second
//! installation is ignored.

use keybridge_core::{BridgeError, Result};
use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `filter`
///
/// `filter` uses `EnvFilter` directive syntax, e.g. `info,keybridge=debug`.
pub fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| BridgeError::config(format!("invalid log filter {filter:?}: {e}")))?;

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging("info").unwrap();
        init_logging("debug").unwrap();
    }

    #[test]
    fn test_invalid_filter() {
        assert!(init_logging("keybridge=notalevel").is_err());
    }
}
