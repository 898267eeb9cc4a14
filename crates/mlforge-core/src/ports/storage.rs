//! Storage adapter port.
//!
//! Adapters read and write opaque byte blobs by URI. They know nothing
//! about models; the orchestrator decides what goes into a blob and where.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Suffix of the registry key for an adapter that answers reads.
pub const IN_SUFFIX: &str = "In";
/// Suffix of the registry key for an adapter that answers writes.
pub const OUT_SUFFIX: &str = "Out";

/// Byte stream returned by [`StorageAdapter::read`].
///
/// The caller owns it; dropping the reader closes the underlying stream.
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Errors from storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing exists at the requested location.
    #[error("Storage path not found: {0}")]
    NotFound(String),

    /// Local I/O failure.
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// The remote filesystem rejected or failed the request.
    #[error("Remote storage error: {0}")]
    Remote(String),

    #[error("Invalid storage URI: {0}")]
    InvalidUri(String),

    /// No adapter is registered for the storage type and direction.
    #[error("No storage adapter registered for '{0}'")]
    UnknownAdapter(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// URIs
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed storage URI.
///
/// `file://...` and `hdfs://host:port/...` are recognized; a bare path is
/// treated as `file`. Any other `scheme://` is kept as-is so custom
/// adapters can claim it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    pub scheme: String,
    /// `host:port` for remote schemes, when present.
    pub authority: Option<String>,
    pub path: String,
}

impl StorageUri {
    pub const FILE: &'static str = "file";
    pub const HDFS: &'static str = "hdfs";

    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(StorageError::InvalidUri("empty URI".to_string()));
        }

        let Some((scheme, rest)) = raw.split_once("://") else {
            return Ok(Self {
                scheme: Self::FILE.to_string(),
                authority: None,
                path: raw.to_string(),
            });
        };

        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidUri(raw.to_string()));
        }
        let scheme = scheme.to_ascii_lowercase();

        if scheme == Self::FILE {
            if rest.is_empty() {
                return Err(StorageError::InvalidUri(raw.to_string()));
            }
            return Ok(Self {
                scheme,
                authority: None,
                path: rest.to_string(),
            });
        }

        let (authority, path) = match rest.find('/') {
            Some(0) => (None, rest.to_string()),
            Some(idx) => (Some(rest[..idx].to_string()), rest[idx..].to_string()),
            None => return Err(StorageError::InvalidUri(raw.to_string())),
        };

        Ok(Self {
            scheme,
            authority,
            path,
        })
    }

    /// Append a child path segment.
    #[must_use]
    pub fn join(&self, child: &str) -> Self {
        let mut path = self.path.trim_end_matches('/').to_string();
        path.push('/');
        path.push_str(child.trim_start_matches('/'));
        Self {
            scheme: self.scheme.clone(),
            authority: self.authority.clone(),
            path,
        }
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.authority {
            Some(authority) => write!(f, "{}://{}{}", self.scheme, authority, self.path),
            None => write!(f, "{}://{}", self.scheme, self.path),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Adapter trait
// ─────────────────────────────────────────────────────────────────────────────

/// Uniform blob access for one storage family.
///
/// # Guarantees
///
/// - `write` overwrites existing content and creates missing parents
/// - a failed `write` never leaves a blob that reads back as complete
/// - `read` of a missing path fails with [`StorageError::NotFound`]
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Storage type this adapter answers for (e.g. `file`).
    fn storage_type(&self) -> &str;

    async fn read(&self, uri: &StorageUri) -> Result<BlobReader, StorageError>;

    async fn write(&self, uri: &StorageUri, data: &[u8]) -> Result<(), StorageError>;
}

/// Read a blob stream to the end, closing it afterwards.
pub async fn read_to_end(mut reader: BlobReader) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .map_err(|e| StorageError::Io(e.to_string()))?;
    Ok(buf)
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Adapters keyed by `<type>In` / `<type>Out`.
#[derive(Clone, Default)]
pub struct StorageRegistry {
    adapters: HashMap<String, Arc<dyn StorageAdapter>>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter for both directions of its storage type.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn StorageAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn StorageAdapter>) {
        let storage_type = adapter.storage_type().to_string();
        self.register_input(&storage_type, adapter.clone());
        self.register_output(&storage_type, adapter);
    }

    pub fn register_input(&mut self, storage_type: &str, adapter: Arc<dyn StorageAdapter>) {
        self.adapters
            .insert(format!("{storage_type}{IN_SUFFIX}"), adapter);
    }

    pub fn register_output(&mut self, storage_type: &str, adapter: Arc<dyn StorageAdapter>) {
        self.adapters
            .insert(format!("{storage_type}{OUT_SUFFIX}"), adapter);
    }

    /// Adapter that answers reads for `storage_type`.
    pub fn input(&self, storage_type: &str) -> Result<Arc<dyn StorageAdapter>, StorageError> {
        self.lookup(&format!("{storage_type}{IN_SUFFIX}"))
    }

    /// Adapter that answers writes for `storage_type`.
    pub fn output(&self, storage_type: &str) -> Result<Arc<dyn StorageAdapter>, StorageError> {
        self.lookup(&format!("{storage_type}{OUT_SUFFIX}"))
    }

    /// Parse `raw` and open it with the matching input adapter.
    pub async fn open(&self, raw: &str) -> Result<BlobReader, StorageError> {
        let uri = StorageUri::parse(raw)?;
        self.input(&uri.scheme)?.read(&uri).await
    }

    fn lookup(&self, key: &str) -> Result<Arc<dyn StorageAdapter>, StorageError> {
        self.adapters
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::UnknownAdapter(key.to_string()))
    }
}
