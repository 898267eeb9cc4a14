//! Model repository trait definition.
//!
//! Besides CRUD, this port carries the guarded state transitions that make
//! a single build job the only writer of a model's terminal state.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{BuildLease, Model, ModelSummary, NewModel, Owner, StorageDescriptor};

/// Repository for model persistence.
///
/// # Design Rules
///
/// - No `sqlx` types in signatures
/// - `update_storage`, `update_summary`, `complete_build` and `fail_build`
///   each run in their own transaction, committed or rolled back atomically
/// - The artifact descriptor is written at most once
/// - Terminal writes must present the lease returned by a successful claim
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Insert a model in the `building` state with no artifact.
    async fn insert(&self, model: &NewModel) -> Result<Model, RepositoryError>;

    async fn get(&self, owner: &Owner, id: i64) -> Result<Model, RepositoryError>;

    async fn get_by_name(&self, owner: &Owner, name: &str) -> Result<Model, RepositoryError>;

    async fn list(&self, owner: &Owner) -> Result<Vec<Model>, RepositoryError>;

    async fn delete(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError>;

    /// Choose where the artifact will be written.
    async fn set_storage_target(
        &self,
        id: i64,
        target: &StorageDescriptor,
    ) -> Result<(), RepositoryError>;

    /// Record the artifact descriptor. Fails with `Constraint` if one is
    /// already recorded.
    async fn update_storage(
        &self,
        id: i64,
        storage: &StorageDescriptor,
    ) -> Result<(), RepositoryError>;

    async fn update_summary(&self, id: i64, summary: &ModelSummary) -> Result<(), RepositoryError>;

    /// Atomically claim the right to build. Returns `false` when the model
    /// is not in `building` or another lease already holds it.
    async fn claim_build(&self, id: i64, lease: &BuildLease) -> Result<bool, RepositoryError>;

    /// Record the artifact descriptor and summary and mark the model
    /// `completed`, in a single transaction guarded by `lease`. Nothing is
    /// written when the guard fails.
    async fn complete_build(
        &self,
        id: i64,
        lease: &BuildLease,
        storage: &StorageDescriptor,
        summary: &ModelSummary,
    ) -> Result<(), RepositoryError>;

    /// Mark the model `failed` with `message`, guarded by `lease`. The
    /// artifact descriptor stays empty.
    async fn fail_build(
        &self,
        id: i64,
        lease: &BuildLease,
        message: &str,
    ) -> Result<(), RepositoryError>;
}
