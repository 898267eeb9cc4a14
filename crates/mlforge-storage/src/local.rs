//! Local filesystem adapter.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use mlforge_core::ports::{BlobReader, StorageAdapter, StorageError, StorageUri};

/// Suffix of the sibling file a write goes to before it is renamed.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Reads and writes `file://` URIs and bare paths.
///
/// Writes land in a `.partial` sibling that is renamed over the target once
/// fully flushed, so a reader never sees a half-written blob.
#[derive(Debug, Clone, Default)]
pub struct LocalFileAdapter;

impl LocalFileAdapter {
    pub const fn new() -> Self {
        Self
    }

    fn path_of(uri: &StorageUri) -> Result<PathBuf, StorageError> {
        if uri.scheme != StorageUri::FILE {
            return Err(StorageError::InvalidUri(format!(
                "{uri} is not a local file URI"
            )));
        }
        Ok(PathBuf::from(&uri.path))
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn io_error(path: &Path, e: &std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        _ => StorageError::Io(format!("{}: {e}", path.display())),
    }
}

#[async_trait]
impl StorageAdapter for LocalFileAdapter {
    fn storage_type(&self) -> &str {
        StorageUri::FILE
    }

    async fn read(&self, uri: &StorageUri) -> Result<BlobReader, StorageError> {
        let path = Self::path_of(uri)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| io_error(&path, &e))?;
        debug!(path = %path.display(), "Opened local blob");
        Ok(Box::new(file))
    }

    async fn write(&self, uri: &StorageUri, data: &[u8]) -> Result<(), StorageError> {
        let path = Self::path_of(uri)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, &e))?;
        }

        let partial = partial_path(&path);
        let written = async {
            let mut file = fs::File::create(&partial).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&partial, &path).await
        }
        .await;

        if let Err(e) = written {
            // Partial files are never read back.
            let _ = fs::remove_file(&partial).await;
            return Err(io_error(&path, &e));
        }

        debug!(path = %path.display(), bytes = data.len(), "Wrote local blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlforge_core::ports::read_to_end;

    fn uri(path: &Path) -> StorageUri {
        StorageUri::parse(&path.to_string_lossy()).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let target = uri(&dir.path().join("models").join("iris.20240101120000000"));
        let adapter = LocalFileAdapter::new();

        adapter.write(&target, b"artifact").await.unwrap();
        let bytes = read_to_end(adapter.read(&target).await.unwrap()).await.unwrap();

        assert_eq!(bytes, b"artifact");
        assert!(!partial_path(Path::new(&target.path)).exists());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = uri(&dir.path().join("blob"));
        let adapter = LocalFileAdapter::new();

        adapter.write(&target, b"first version").await.unwrap();
        adapter.write(&target, b"second").await.unwrap();

        let bytes = read_to_end(adapter.read(&target).await.unwrap()).await.unwrap();
        assert_eq!(bytes, b"second");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = LocalFileAdapter::new();

        let err = adapter
            .read(&uri(&dir.path().join("missing")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_readable() {
        let dir = tempfile::tempdir().unwrap();
        // The target is an existing directory, so the final rename fails.
        let target_dir = dir.path().join("occupied");
        std::fs::create_dir_all(target_dir.join("child")).unwrap();
        let adapter = LocalFileAdapter::new();

        let result = adapter.write(&uri(&target_dir), b"data").await;

        assert!(result.is_err());
        assert!(!partial_path(&target_dir).exists());
        assert!(target_dir.is_dir());
    }

    #[tokio::test]
    async fn test_rejects_other_schemes() {
        let adapter = LocalFileAdapter::new();
        let hdfs = StorageUri::parse("hdfs://nn:9000/models/m").unwrap();

        assert!(matches!(
            adapter.write(&hdfs, b"x").await,
            Err(StorageError::InvalidUri(_))
        ));
    }
}
