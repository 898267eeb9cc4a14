//! Data root detection and user path normalization.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "MLFORGE_DATA_DIR";

/// Get the root directory for application data (database, local models).
///
/// Resolution order:
/// 1. `MLFORGE_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/mlforge`)
///
/// The directory is created if it does not exist.
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = match env::var(DATA_DIR_ENV) {
        Ok(path) if !path.trim().is_empty() => normalize_user_path(&path)?,
        _ => dirs::data_local_dir()
            .ok_or(PathError::NoDataDir)?
            .join("mlforge"),
    };

    ensure_dir(&root)?;
    Ok(root)
}

/// Default root for artifacts written by the `file` storage adapter.
pub fn default_model_store() -> Result<PathBuf, PathError> {
    let dir = data_root()?.join("models");
    ensure_dir(&dir)?;
    Ok(dir)
}

pub(super) fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}
