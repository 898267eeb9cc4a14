//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Tenant used when neither `--tenant` nor `MLFORGE_TENANT` is given.
pub const DEFAULT_TENANT: i64 = -1234;

/// User used when neither `--user` nor `MLFORGE_USER` is given.
pub const DEFAULT_USER: &str = "admin";

/// Command-line interface for building and serving models.
///
/// This is the top-level parser that handles global options and dispatches
/// to subcommands.
#[derive(Parser)]
#[command(name = "mlforge")]
#[command(about = "Build, store and serve machine learning models")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Tenant that owns the entities this invocation touches
    #[arg(
        long,
        global = true,
        env = "MLFORGE_TENANT",
        default_value_t = DEFAULT_TENANT,
        allow_hyphen_values = true
    )]
    pub tenant: i64,

    /// User within the tenant
    #[arg(long, global = true, env = "MLFORGE_USER", default_value = DEFAULT_USER)]
    pub user: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
