//! `SQLite` implementation of the `ModelRepository` trait.
//!
//! State transitions are single guarded `UPDATE` statements. A transition
//! whose guard no longer holds touches no row and is reported as a
//! constraint violation, never applied halfway.

use async_trait::async_trait;
use sqlx::SqlitePool;

use mlforge_core::domain::{BuildLease, Model, ModelSummary, NewModel, Owner, StorageDescriptor};
use mlforge_core::ports::{ModelRepository, RepositoryError};

use super::row_mappers::{MODEL_SELECT_COLUMNS, map_sqlx, now_string, row_to_model};

/// `SQLite` implementation of the `ModelRepository` trait.
pub struct SqliteModelRepository {
    pool: SqlitePool,
}

impl SqliteModelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: i64) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM models WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.is_some())
    }

    /// Explain why a guarded update touched no row.
    async fn guard_failure(&self, id: i64, what: &str) -> RepositoryError {
        match self.exists(id).await {
            Ok(true) => RepositoryError::Constraint(format!("Model {id}: {what}")),
            Ok(false) => RepositoryError::NotFound(format!("Model with ID {id}")),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl ModelRepository for SqliteModelRepository {
    async fn insert(&self, model: &NewModel) -> Result<Model, RepositoryError> {
        let (target_type, target_location) = model
            .storage_target
            .as_ref()
            .map(|t| (t.storage_type.as_str(), t.location.as_str()))
            .unzip();

        let result = sqlx::query(
            r"INSERT INTO models (
                name, analysis_id, dataset_version_id, tenant_id, username,
                target_type, target_location, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 'building', ?)",
        )
        .bind(&model.name)
        .bind(model.analysis_id)
        .bind(model.dataset_version_id)
        .bind(model.owner.tenant_id)
        .bind(&model.owner.username)
        .bind(target_type)
        .bind(target_location)
        .bind(now_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.get(&model.owner, result.last_insert_rowid()).await
    }

    async fn get(&self, owner: &Owner, id: i64) -> Result<Model, RepositoryError> {
        let query = format!(
            "SELECT {MODEL_SELECT_COLUMNS} FROM models WHERE id = ? AND tenant_id = ? AND username = ?"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Model with ID {id}")))?;

        row_to_model(&row)
    }

    async fn get_by_name(&self, owner: &Owner, name: &str) -> Result<Model, RepositoryError> {
        let query = format!(
            "SELECT {MODEL_SELECT_COLUMNS} FROM models WHERE name = ? AND tenant_id = ? AND username = ?"
        );

        let row = sqlx::query(&query)
            .bind(name)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Model with name '{name}'")))?;

        row_to_model(&row)
    }

    async fn list(&self, owner: &Owner) -> Result<Vec<Model>, RepositoryError> {
        let query = format!(
            "SELECT {MODEL_SELECT_COLUMNS} FROM models WHERE tenant_id = ? AND username = ? ORDER BY id"
        );

        let rows = sqlx::query(&query)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(row_to_model).collect()
    }

    async fn delete(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM models WHERE id = ? AND tenant_id = ? AND username = ?")
                .bind(id)
                .bind(owner.tenant_id)
                .bind(&owner.username)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Model with ID {id}")));
        }

        Ok(())
    }

    async fn set_storage_target(
        &self,
        id: i64,
        target: &StorageDescriptor,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE models SET target_type = ?, target_location = ? WHERE id = ?")
                .bind(&target.storage_type)
                .bind(&target.location)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Model with ID {id}")));
        }

        Ok(())
    }

    async fn update_storage(
        &self,
        id: i64,
        storage: &StorageDescriptor,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE models SET storage_type = ?, storage_location = ? WHERE id = ? AND storage_location IS NULL",
        )
        .bind(&storage.storage_type)
        .bind(&storage.location)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(self
                .guard_failure(id, "artifact descriptor already recorded")
                .await);
        }

        Ok(())
    }

    async fn update_summary(&self, id: i64, summary: &ModelSummary) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(summary)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let result = sqlx::query("UPDATE models SET summary = ? WHERE id = ?")
            .bind(&json)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Model with ID {id}")));
        }

        Ok(())
    }

    async fn claim_build(&self, id: i64, lease: &BuildLease) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE models SET build_lease = ? WHERE id = ? AND status = 'building' AND build_lease IS NULL",
        )
        .bind(lease.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete_build(
        &self,
        id: i64,
        lease: &BuildLease,
        storage: &StorageDescriptor,
        summary: &ModelSummary,
    ) -> Result<(), RepositoryError> {
        let summary = serde_json::to_string(summary)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let result = sqlx::query(
            r"UPDATE models
            SET storage_type = ?, storage_location = ?, summary = ?, status = 'completed',
                error = NULL, completed_at = ?
            WHERE id = ? AND build_lease = ? AND status = 'building' AND storage_location IS NULL",
        )
        .bind(&storage.storage_type)
        .bind(&storage.location)
        .bind(&summary)
        .bind(now_string())
        .bind(id)
        .bind(lease.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self
                .guard_failure(id, "build lease is not held or the build already finished")
                .await);
        }

        tx.commit().await.map_err(map_sqlx)?;
        tracing::debug!(model_id = id, location = %storage.location, "Model marked completed");
        Ok(())
    }

    async fn fail_build(
        &self,
        id: i64,
        lease: &BuildLease,
        message: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"UPDATE models SET status = 'failed', error = ?, completed_at = ?
            WHERE id = ? AND build_lease = ? AND status = 'building'",
        )
        .bind(message)
        .bind(now_string())
        .bind(id)
        .bind(lease.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(self
                .guard_failure(id, "build lease is not held or the build already finished")
                .await);
        }

        tracing::debug!(model_id = id, "Model marked failed");
        Ok(())
    }
}
