//! Paths command handler.
//!
//! Displays all resolved paths for diagnostics and debugging.

use anyhow::Result;

use mlforge_core::ResolvedPaths;

/// Print every path mlforge uses in `key = value` format.
pub fn execute() -> Result<()> {
    let paths = ResolvedPaths::resolve()?;
    println!("{paths}");
    Ok(())
}
