//! Command handlers that delegate to the core services.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Parse/validate CLI-specific input
//!   2. Call core service methods
//!   3. Format output for the terminal
//!
//! Handlers should NOT access repositories directly or contain business
//! logic.

pub mod analysis;
pub mod cluster;
pub mod config;
pub mod dataset;
pub mod model;
pub mod paths;
pub mod project;
