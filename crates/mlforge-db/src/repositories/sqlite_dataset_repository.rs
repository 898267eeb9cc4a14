//! `SQLite` implementation of the `DatasetRepository` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;

use mlforge_core::domain::{
    Dataset, DatasetVersion, NewDataset, NewDatasetVersion, Owner, SamplePoints,
};
use mlforge_core::ports::{DatasetRepository, RepositoryError};

use super::row_mappers::{
    VERSION_SELECT_COLUMNS, map_sqlx, now_string, row_to_dataset, row_to_version,
};

const DATASET_SELECT_COLUMNS: &str = "id, name, tenant_id, username, data_type, source_type, target_type, comments, created_at";

/// Datasets and their versions. A version has no owner columns of its own;
/// ownership is always checked by joining its dataset.
pub struct SqliteDatasetRepository {
    pool: SqlitePool,
}

impl SqliteDatasetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatasetRepository for SqliteDatasetRepository {
    async fn insert_dataset(&self, dataset: &NewDataset) -> Result<Dataset, RepositoryError> {
        let result = sqlx::query(
            r"INSERT INTO datasets (
                name, tenant_id, username, data_type, source_type, target_type, comments, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&dataset.name)
        .bind(dataset.owner.tenant_id)
        .bind(&dataset.owner.username)
        .bind(dataset.data_type.as_str())
        .bind(&dataset.source_type)
        .bind(&dataset.target_type)
        .bind(&dataset.comments)
        .bind(now_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.get_dataset(&dataset.owner, result.last_insert_rowid())
            .await
    }

    async fn get_dataset(&self, owner: &Owner, id: i64) -> Result<Dataset, RepositoryError> {
        let query = format!(
            "SELECT {DATASET_SELECT_COLUMNS} FROM datasets WHERE id = ? AND tenant_id = ? AND username = ?"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Dataset with ID {id}")))?;

        row_to_dataset(&row)
    }

    async fn list_datasets(&self, owner: &Owner) -> Result<Vec<Dataset>, RepositoryError> {
        let query = format!(
            "SELECT {DATASET_SELECT_COLUMNS} FROM datasets WHERE tenant_id = ? AND username = ? ORDER BY id"
        );

        let rows = sqlx::query(&query)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(row_to_dataset).collect()
    }

    async fn update_comments(
        &self,
        owner: &Owner,
        id: i64,
        comments: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE datasets SET comments = ? WHERE id = ? AND tenant_id = ? AND username = ?",
        )
        .bind(comments)
        .bind(id)
        .bind(owner.tenant_id)
        .bind(&owner.username)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Dataset with ID {id}")));
        }

        Ok(())
    }

    async fn delete_dataset(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError> {
        // Versions and the models built on them go with the dataset by cascade.
        let result =
            sqlx::query("DELETE FROM datasets WHERE id = ? AND tenant_id = ? AND username = ?")
                .bind(id)
                .bind(owner.tenant_id)
                .bind(&owner.username)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Dataset with ID {id}")));
        }

        Ok(())
    }

    async fn insert_version(
        &self,
        version: &NewDatasetVersion,
    ) -> Result<DatasetVersion, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO dataset_versions (dataset_id, version, uri, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(version.dataset_id)
        .bind(&version.version)
        .bind(&version.uri)
        .bind(now_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let id = result.last_insert_rowid();
        let row = sqlx::query(&format!(
            "SELECT {VERSION_SELECT_COLUMNS} FROM dataset_versions v WHERE v.id = ?"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row_to_version(&row)
    }

    async fn get_version(&self, owner: &Owner, id: i64) -> Result<DatasetVersion, RepositoryError> {
        let query = format!(
            r"SELECT {VERSION_SELECT_COLUMNS} FROM dataset_versions v
            JOIN datasets d ON d.id = v.dataset_id
            WHERE v.id = ? AND d.tenant_id = ? AND d.username = ?"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Dataset version with ID {id}")))?;

        row_to_version(&row)
    }

    async fn list_versions(
        &self,
        owner: &Owner,
        dataset_id: i64,
    ) -> Result<Vec<DatasetVersion>, RepositoryError> {
        let query = format!(
            r"SELECT {VERSION_SELECT_COLUMNS} FROM dataset_versions v
            JOIN datasets d ON d.id = v.dataset_id
            WHERE v.dataset_id = ? AND d.tenant_id = ? AND d.username = ?
            ORDER BY v.id"
        );

        let rows = sqlx::query(&query)
            .bind(dataset_id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(row_to_version).collect()
    }

    async fn delete_version(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"DELETE FROM dataset_versions
            WHERE id = ? AND dataset_id IN (
                SELECT id FROM datasets WHERE tenant_id = ? AND username = ?
            )",
        )
        .bind(id)
        .bind(owner.tenant_id)
        .bind(&owner.username)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Dataset version with ID {id}"
            )));
        }

        Ok(())
    }

    async fn attach_sample(
        &self,
        version_id: i64,
        sample: &SamplePoints,
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(sample)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let result =
            sqlx::query("UPDATE dataset_versions SET sample = ? WHERE id = ? AND sample IS NULL")
                .bind(&json)
                .bind(version_id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM dataset_versions WHERE id = ?")
                    .bind(version_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx)?;
            return Err(match exists {
                Some(_) => RepositoryError::Constraint(format!(
                    "Dataset version {version_id} already has a sample"
                )),
                None => RepositoryError::NotFound(format!("Dataset version with ID {version_id}")),
            });
        }

        Ok(())
    }
}
