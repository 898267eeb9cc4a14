//! CLI entry point - the composition root.
//!
//! Command dispatch routes to handlers, which delegate to the core services
//! held by `CliContext`.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use mlforge_cli::{Cli, CliConfig, Commands, bootstrap, exit_code, handlers, log_filter};
use mlforge_core::Owner;

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // `paths` works without a database
    if matches!(command, Commands::Paths) {
        return handlers::paths::execute();
    }

    let ctx = bootstrap(CliConfig::new(Owner::new(cli.tenant, cli.user))).await?;

    match command {
        Commands::Project { command } => handlers::project::execute(&ctx, command).await,
        Commands::Dataset { command } => handlers::dataset::execute(&ctx, command).await,
        Commands::Analysis { command } => handlers::analysis::execute(&ctx, command).await,
        Commands::Model { command } => handlers::model::execute(&ctx, command).await,
        Commands::ClusterPoints {
            version_id,
            features,
            clusters,
        } => handlers::cluster::execute(&ctx, version_id, &features, clusters).await,
        Commands::Config { command } => handlers::config::execute(&ctx, command).await,
        Commands::Paths => handlers::paths::execute(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(cli.verbose, rust_log.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(u8::try_from(exit_code(&e)).unwrap_or(1))
        }
    }
}
