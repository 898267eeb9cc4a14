//! Database path resolution.

use std::path::PathBuf;

use super::error::PathError;
use super::platform::{data_root, ensure_dir};

/// File name of the metadata database.
pub const DATABASE_FILE: &str = "mlforge.db";

/// Get the path to the metadata database file.
///
/// Returns `<data root>/data/mlforge.db`, creating `data/` when missing.
pub fn database_path() -> Result<PathBuf, PathError> {
    let data_dir = data_root()?.join("data");
    ensure_dir(&data_dir)?;
    Ok(data_dir.join(DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_ends_with_db_file() {
        let path = database_path().unwrap();
        assert!(path.to_string_lossy().ends_with(DATABASE_FILE));
    }
}
