//! Configuration management subcommands.

use clap::Subcommand;

/// Configuration management commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// View or change application settings (storage, concurrency, engine)
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

/// Settings command variants.
#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show all current application settings
    Show,
    /// Update one setting; an empty value clears it
    Set {
        /// Setting name (e.g. max_concurrent_builds, engine_url)
        key: String,
        value: String,
    },
    /// Reset all settings to defaults
    Reset,
}
