//! Keybridge CLI
//!
//! Operator tooling around the bridge: the stateless codec utilities,
//! keystore path derivation and the persisted blank-preview preference.

use anyhow::Result;
use clap::{Parser, Subcommand};
use keybridge::BridgeConfig;
use std::path::PathBuf;

mod commands;

use commands::{
    codec::{handle_codec_command, CodecCommand},
    common,
    config::show_config,
    keystore::keystore_path,
    preview::{handle_preview_command, PreviewCommand},
};

#[derive(Parser)]
#[command(name = "keybridge")]
#[command(about = "Keybridge - keystore bridge tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// No-backup root, overriding config and environment
    #[arg(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the keystore directory of an identity
    KeystorePath {
        /// Identity (key uid)
        key_uid: String,
    },

    #[command(flatten)]
    Codec(CodecCommand),

    /// Read or write the blank-preview flag
    #[command(subcommand)]
    BlankPreview(PreviewCommand),

    /// Configuration inspection
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Codec(cmd) => {
            keybridge::init_logging(&common::log_filter(cli.verbose, None))?;
            println!("{}", handle_codec_command(cmd)?);
        }
        command => {
            let config = common::load_config(cli.config.as_deref(), cli.root)?;
            keybridge::init_logging(&common::log_filter(cli.verbose, Some(&config)))?;
            run_with_config(command, &config)?;
        }
    }

    Ok(())
}

fn run_with_config(command: Commands, config: &BridgeConfig) -> Result<()> {
    match command {
        Commands::KeystorePath { key_uid } => {
            println!("{}", keystore_path(config, &key_uid)?.display());
        }

        Commands::Codec(cmd) => {
            println!("{}", handle_codec_command(cmd)?);
        }

        Commands::BlankPreview(cmd) => {
            if let Some(output) = handle_preview_command(cmd, config)? {
                println!("{output}");
            }
        }

        Commands::Config(ConfigCommand::Show) => {
            print!("{}", show_config(config)?);
        }
    }

    Ok(())
}
