//! Blank-preview preference

use anyhow::Result;
use clap::Subcommand;
use keybridge::effects::{PreferenceEffects, BLANK_PREVIEW_DEFAULT, BLANK_PREVIEW_KEY};
use keybridge::BridgeConfig;
use keybridge_effects::FilePreferenceStore;
use tracing::info;

/// Blank-preview subcommands
#[derive(Subcommand, Debug)]
pub enum PreviewCommand {
    /// Print the stored flag
    Get,
    /// Store the flag
    Set {
        /// `true` blocks screenshots and previews
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

/// Run a blank-preview command; `Get` returns the value to print
pub fn handle_preview_command(cmd: PreviewCommand, config: &BridgeConfig) -> Result<Option<String>> {
    let store = FilePreferenceStore::new(config.preferences_path());
    match cmd {
        PreviewCommand::Get => {
            let enabled = store.get_bool(BLANK_PREVIEW_KEY, BLANK_PREVIEW_DEFAULT)?;
            Ok(Some(enabled.to_string()))
        }
        PreviewCommand::Set { enabled } => {
            store.put_bool(BLANK_PREVIEW_KEY, enabled)?;
            info!(enabled, path = %store.path().display(), "blank-preview flag stored");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = BridgeConfig::new(dir.path());

        assert_eq!(
            handle_preview_command(PreviewCommand::Get, &config).unwrap(),
            Some("true".to_string())
        );
        handle_preview_command(PreviewCommand::Set { enabled: false }, &config).unwrap();
        assert_eq!(
            handle_preview_command(PreviewCommand::Get, &config).unwrap(),
            Some("false".to_string())
        );
    }
}
