//! All resolved paths in one struct, for `mlforge paths`.

use std::path::PathBuf;

use super::{PathError, data_root, database_path, default_model_store};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Root directory for application data
    pub data_root: PathBuf,
    /// Path to the `SQLite` metadata database
    pub database_path: PathBuf,
    /// Default root for locally stored model artifacts
    pub model_store: PathBuf,
}

impl ResolvedPaths {
    /// Resolve all paths using the current environment.
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self {
            data_root: data_root()?,
            database_path: database_path()?,
            model_store: default_model_store()?,
        })
    }
}

impl std::fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "data_root = {}", self.data_root.display())?;
        writeln!(f, "database_path = {}", self.database_path.display())?;
        write!(f, "model_store = {}", self.model_store.display())
    }
}
