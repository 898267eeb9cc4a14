#![doc = include_str!("../README.md")]

pub mod hdfs;
pub mod local;

use std::sync::Arc;

use mlforge_core::ports::{StorageError, StorageRegistry};
use mlforge_core::settings::Settings;

pub use hdfs::{HdfsAdapter, HdfsConfig};
pub use local::{LocalFileAdapter, PARTIAL_SUFFIX};

/// Registry with the `file` and `hdfs` adapters registered for both
/// directions.
pub fn default_registry(settings: &Settings) -> Result<StorageRegistry, StorageError> {
    let hdfs = HdfsAdapter::new(HdfsConfig::from_settings(settings))?;
    Ok(StorageRegistry::new()
        .with_adapter(Arc::new(LocalFileAdapter::new()))
        .with_adapter(Arc::new(hdfs)))
}
