//! Config command handler.

use anyhow::Result;

use mlforge_core::Settings;

use crate::bootstrap::CliContext;
use crate::config_commands::{ConfigCommand, SettingsCommand};

pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Settings { command } => handle_settings(ctx, command).await,
    }
}

async fn handle_settings(ctx: &CliContext, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            let settings = ctx.settings.get().await?;
            print_settings(&settings);
        }
        SettingsCommand::Set { key, value } => {
            let settings = ctx.settings.set(&key, &value).await?;
            println!("✓ Setting '{key}' updated.");
            print_settings(&settings);
        }
        SettingsCommand::Reset => {
            let settings = ctx.settings.reset().await?;
            println!("✓ Settings reset to defaults.");
            print_settings(&settings);
        }
    }
    Ok(())
}

fn print_settings(settings: &Settings) {
    let show = |value: Option<String>| value.unwrap_or_else(|| "(not set)".to_string());
    println!("Current settings:");
    println!(
        "  default_storage_type:     {}",
        show(settings.default_storage_type.clone())
    );
    println!(
        "  default_storage_location: {}",
        show(settings.default_storage_location.clone())
    );
    println!(
        "  max_concurrent_builds:    {}",
        show(settings.max_concurrent_builds.map(|v| v.to_string()))
    );
    println!(
        "  training_timeout_secs:    {}",
        show(settings.training_timeout_secs.map(|v| v.to_string()))
    );
    println!(
        "  hdfs_default_authority:   {}",
        show(settings.hdfs_default_authority.clone())
    );
    println!(
        "  webhdfs_port:             {}",
        show(settings.webhdfs_port.map(|v| v.to_string()))
    );
    println!(
        "  engine_url:               {}",
        show(settings.engine_url.clone())
    );
}
