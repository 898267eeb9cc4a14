//! Path utilities for mlforge data directories.
//!
//! This module provides the canonical path resolution for all mlforge components:
//! - Application data root
//! - Metadata database location
//! - Default root for model artifacts stored on the local filesystem
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O; adapters print what they resolve

mod database;
mod error;
mod platform;
mod resolver;

pub use database::{DATABASE_FILE, database_path};
pub use error::PathError;
pub use platform::{DATA_DIR_ENV, data_root, default_model_store, normalize_user_path};
pub use resolver::ResolvedPaths;
