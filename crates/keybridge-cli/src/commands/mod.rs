//! CLI command handlers

pub mod codec;
pub mod common;
pub mod config;
pub mod keystore;
pub mod preview;
