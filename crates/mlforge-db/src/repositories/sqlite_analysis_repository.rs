//! `SQLite` implementation of the `AnalysisRepository` trait.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use mlforge_core::domain::{Analysis, Feature, HyperParameters, NewAnalysis, Owner};
use mlforge_core::ports::{AnalysisRepository, RepositoryError};

use super::row_mappers::{map_sqlx, now_string, row_to_analysis, row_to_feature};

const ANALYSIS_SELECT_COLUMNS: &str =
    "id, project_id, name, tenant_id, username, comments, created_at";

const CONFIGURATION_TABLE: &str = "analysis_configurations";
const HYPER_PARAMETER_TABLE: &str = "analysis_hyper_parameters";

pub struct SqliteAnalysisRepository {
    pool: SqlitePool,
}

impl SqliteAnalysisRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert every entry of a key/value table in one transaction.
    async fn upsert_entries(
        &self,
        table: &str,
        analysis_id: i64,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), RepositoryError> {
        let statement = format!(
            "INSERT INTO {table} (analysis_id, key, value) VALUES (?, ?, ?)
            ON CONFLICT(analysis_id, key) DO UPDATE SET value = excluded.value"
        );

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for (key, value) in entries {
            sqlx::query(&statement)
                .bind(analysis_id)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;

        Ok(())
    }

    async fn entries(
        &self,
        table: &str,
        analysis_id: i64,
    ) -> Result<BTreeMap<String, String>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT key, value FROM {table} WHERE analysis_id = ?"))
            .bind(analysis_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| -> Result<(String, String), RepositoryError> {
                Ok((
                    row.try_get("key").map_err(map_sqlx)?,
                    row.try_get("value").map_err(map_sqlx)?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl AnalysisRepository for SqliteAnalysisRepository {
    async fn insert(&self, analysis: &NewAnalysis) -> Result<Analysis, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO analyses (project_id, name, tenant_id, username, comments, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(analysis.project_id)
        .bind(&analysis.name)
        .bind(analysis.owner.tenant_id)
        .bind(&analysis.owner.username)
        .bind(&analysis.comments)
        .bind(now_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.get(&analysis.owner, result.last_insert_rowid()).await
    }

    async fn get(&self, owner: &Owner, id: i64) -> Result<Analysis, RepositoryError> {
        let query = format!(
            "SELECT {ANALYSIS_SELECT_COLUMNS} FROM analyses WHERE id = ? AND tenant_id = ? AND username = ?"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Analysis with ID {id}")))?;

        row_to_analysis(&row)
    }

    async fn list(&self, owner: &Owner, project_id: i64) -> Result<Vec<Analysis>, RepositoryError> {
        let query = format!(
            "SELECT {ANALYSIS_SELECT_COLUMNS} FROM analyses WHERE project_id = ? AND tenant_id = ? AND username = ? ORDER BY id"
        );

        let rows = sqlx::query(&query)
            .bind(project_id)
            .bind(owner.tenant_id)
            .bind(&owner.username)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(row_to_analysis).collect()
    }

    async fn delete(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM analyses WHERE id = ? AND tenant_id = ? AND username = ?")
                .bind(id)
                .bind(owner.tenant_id)
                .bind(&owner.username)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Analysis with ID {id}")));
        }

        Ok(())
    }

    async fn set_configuration(
        &self,
        analysis_id: i64,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), RepositoryError> {
        self.upsert_entries(CONFIGURATION_TABLE, analysis_id, entries)
            .await
    }

    async fn get_configuration(
        &self,
        analysis_id: i64,
    ) -> Result<BTreeMap<String, String>, RepositoryError> {
        self.entries(CONFIGURATION_TABLE, analysis_id).await
    }

    async fn set_hyper_parameters(
        &self,
        analysis_id: i64,
        params: &HyperParameters,
    ) -> Result<(), RepositoryError> {
        self.upsert_entries(HYPER_PARAMETER_TABLE, analysis_id, params)
            .await
    }

    async fn get_hyper_parameters(
        &self,
        analysis_id: i64,
    ) -> Result<HyperParameters, RepositoryError> {
        self.entries(HYPER_PARAMETER_TABLE, analysis_id).await
    }

    async fn set_features(
        &self,
        analysis_id: i64,
        features: &[Feature],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for feature in features {
            let index = i64::try_from(feature.index).map_err(|_| {
                RepositoryError::Constraint(format!("column index {} is too large", feature.index))
            })?;
            sqlx::query(
                r"INSERT INTO analysis_features (
                    analysis_id, name, column_index, feature_type, impute_option, include
                ) VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(analysis_id, name) DO UPDATE SET
                    column_index = excluded.column_index,
                    feature_type = excluded.feature_type,
                    impute_option = excluded.impute_option,
                    include = excluded.include",
            )
            .bind(analysis_id)
            .bind(&feature.name)
            .bind(index)
            .bind(feature.feature_type.as_str())
            .bind(feature.impute_option.as_str())
            .bind(feature.include)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;

        Ok(())
    }

    async fn get_features(&self, analysis_id: i64) -> Result<Vec<Feature>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT name, column_index, feature_type, impute_option, include FROM analysis_features WHERE analysis_id = ? ORDER BY id",
        )
        .bind(analysis_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.iter().map(row_to_feature).collect()
    }
}
