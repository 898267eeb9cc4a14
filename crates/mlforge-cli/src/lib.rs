#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;

// Used by the binary only
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap, log_filter};
pub use commands::{
    AnalysisCommand, Commands, DatasetCommand, ModelCommand, ProjectCommand, VersionCommand,
};
pub use config_commands::{ConfigCommand, SettingsCommand};
pub use error::{CliError, exit_code};
pub use parser::Cli;
