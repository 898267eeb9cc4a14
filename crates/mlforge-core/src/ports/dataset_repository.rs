//! Dataset repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{Dataset, DatasetVersion, NewDataset, NewDatasetVersion, Owner, SamplePoints};

/// Repository for datasets and their immutable versions.
///
/// # Design Rules
///
/// - A version's URI is written once at insert and never updated
/// - The cached sample may be attached once; later attaches are rejected
/// - Dataset fields other than `comments` are never updated
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    async fn insert_dataset(&self, dataset: &NewDataset) -> Result<Dataset, RepositoryError>;

    async fn get_dataset(&self, owner: &Owner, id: i64) -> Result<Dataset, RepositoryError>;

    async fn list_datasets(&self, owner: &Owner) -> Result<Vec<Dataset>, RepositoryError>;

    async fn update_comments(
        &self,
        owner: &Owner,
        id: i64,
        comments: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Delete a dataset together with all of its versions.
    async fn delete_dataset(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError>;

    /// Insert a version. Labels are unique per dataset.
    async fn insert_version(
        &self,
        version: &NewDatasetVersion,
    ) -> Result<DatasetVersion, RepositoryError>;

    /// Fetch a version, checking ownership through its parent dataset.
    async fn get_version(&self, owner: &Owner, id: i64) -> Result<DatasetVersion, RepositoryError>;

    async fn list_versions(
        &self,
        owner: &Owner,
        dataset_id: i64,
    ) -> Result<Vec<DatasetVersion>, RepositoryError>;

    /// Delete a version and the models built on it.
    async fn delete_version(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError>;

    /// Attach the cached sample to a version that has none yet.
    async fn attach_sample(
        &self,
        version_id: i64,
        sample: &SamplePoints,
    ) -> Result<(), RepositoryError>;
}
