//! Composition utilities for wiring `SQLite` repositories into a
//! [`MetadataStore`].
//!
//! Construction only; no domain logic lives here.

use sqlx::SqlitePool;
use std::sync::Arc;

use mlforge_core::ports::MetadataStore;

use crate::repositories::{
    SqliteAnalysisRepository, SqliteDatasetRepository, SqliteModelRepository,
    SqliteProjectRepository, SqliteSettingsRepository,
};

/// Factory for creating repository instances with `SQLite` backends.
pub struct CoreFactory;

impl CoreFactory {
    /// Build every metadata repository from one pool.
    ///
    /// This is the recommended way for adapters to obtain a
    /// [`MetadataStore`]:
    ///
    /// ```ignore
    /// let pool = setup_database(&db_path).await?;
    /// let store = CoreFactory::build_store(pool);
    /// ```
    pub fn build_store(pool: SqlitePool) -> MetadataStore {
        MetadataStore::new(
            Arc::new(SqliteProjectRepository::new(pool.clone())),
            Arc::new(SqliteDatasetRepository::new(pool.clone())),
            Arc::new(SqliteAnalysisRepository::new(pool.clone())),
            Arc::new(SqliteModelRepository::new(pool.clone())),
            Arc::new(SqliteSettingsRepository::new(pool)),
        )
    }
}

/// Test database helper for integration tests.
///
/// Provides an in-memory `SQLite` database with the production schema.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pool: SqlitePool,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    pub async fn new() -> anyhow::Result<Self> {
        let pool = crate::setup::setup_test_database().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A metadata store backed by this database.
    pub fn store(&self) -> MetadataStore {
        CoreFactory::build_store(self.pool.clone())
    }
}
