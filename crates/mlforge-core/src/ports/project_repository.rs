//! Project repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewProject, Owner, Project};

/// Repository for project persistence.
///
/// Every read and delete is scoped to an [`Owner`]; projects owned by
/// someone else are reported as `NotFound`.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a new project. Names are unique per owner.
    async fn insert(&self, project: &NewProject) -> Result<Project, RepositoryError>;

    async fn get(&self, owner: &Owner, id: i64) -> Result<Project, RepositoryError>;

    async fn get_by_name(&self, owner: &Owner, name: &str) -> Result<Project, RepositoryError>;

    /// List projects in insertion order.
    async fn list(&self, owner: &Owner) -> Result<Vec<Project>, RepositoryError>;

    /// Delete a project and, by cascade, its analyses and their models.
    async fn delete(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError>;
}
