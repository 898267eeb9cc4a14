//! `SQLite` implementation of the `ProjectRepository` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;

use mlforge_core::domain::{NewProject, Owner, Project};
use mlforge_core::ports::{ProjectRepository, RepositoryError};

use super::row_mappers::{map_sqlx, now_string, row_to_project};

const PROJECT_SELECT_COLUMNS: &str = "id, name, description, tenant_id, username, created_at";

pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn insert(&self, project: &NewProject) -> Result<Project, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO projects (name, description, tenant_id, username, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.owner.tenant_id)
        .bind(&project.owner.username)
        .bind(now_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.get(&project.owner, result.last_insert_rowid()).await
    }

    async fn get(&self, owner: &Owner, id: i64) -> Result<Project, RepositoryError> {
        let query = format!(
            "SELECT {PROJECT_SELECT_COLUMNS} FROM projects WHERE id = ? AND tenant_id = ? AND username = ?"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Project with ID {id}")))?;

        row_to_project(&row)
    }

    async fn get_by_name(&self, owner: &Owner, name: &str) -> Result<Project, RepositoryError> {
        let query = format!(
            "SELECT {PROJECT_SELECT_COLUMNS} FROM projects WHERE name = ? AND tenant_id = ? AND username = ?"
        );

        let row = sqlx::query(&query)
            .bind(name)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Project with name '{name}'")))?;

        row_to_project(&row)
    }

    async fn list(&self, owner: &Owner) -> Result<Vec<Project>, RepositoryError> {
        let query = format!(
            "SELECT {PROJECT_SELECT_COLUMNS} FROM projects WHERE tenant_id = ? AND username = ? ORDER BY id"
        );

        let rows = sqlx::query(&query)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(row_to_project).collect()
    }

    async fn delete(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ? AND tenant_id = ? AND username = ?")
            .bind(id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Project with ID {id}")));
        }

        Ok(())
    }
}
