//! Database setup and initialization.
//!
//! Entry points call [`setup_database`] with the resolved database path.

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::path::Path;
use std::time::Duration;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open (creating if needed) the `SQLite` database at `db_path` and make
/// sure the schema exists.
///
/// # Example
///
/// ```rust,no_run
/// use mlforge_db::setup_database;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let pool = setup_database(Path::new("/path/to/mlforge.db")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn setup_database(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT),
    )
    .await?;

    create_schema(&pool).await?;
    tracing::debug!(path = %db_path.display(), "Metadata database ready");

    Ok(pool)
}

/// Sets up an in-memory `SQLite` database for testing.
///
/// Creates a fresh in-memory database with the full production schema.
/// Every in-memory connection is its own database, so the pool holds one.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the complete database schema.
///
/// Safe to call multiple times as all statements use IF NOT EXISTS.
pub(crate) async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            tenant_id INTEGER NOT NULL,
            username TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(tenant_id, username, name)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS datasets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            tenant_id INTEGER NOT NULL,
            username TEXT NOT NULL,
            data_type TEXT NOT NULL CHECK (data_type IN ('CSV', 'TSV')),
            source_type TEXT NOT NULL,
            target_type TEXT NOT NULL,
            comments TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(tenant_id, username, name)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS dataset_versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dataset_id INTEGER NOT NULL,
            version TEXT NOT NULL,
            uri TEXT NOT NULL,
            sample TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (dataset_id) REFERENCES datasets(id) ON DELETE CASCADE,
            UNIQUE(dataset_id, version)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            tenant_id INTEGER NOT NULL,
            username TEXT NOT NULL,
            comments TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
            UNIQUE(project_id, name)
        )
        ",
    )
    .execute(pool)
    .await?;

    for table in ["analysis_configurations", "analysis_hyper_parameters"] {
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS {table} (
                analysis_id INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (analysis_id, key),
                FOREIGN KEY (analysis_id) REFERENCES analyses(id) ON DELETE CASCADE
            )
            "
        ))
        .execute(pool)
        .await?;
    }

    // Row id keeps declaration order across upserts.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS analysis_features (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            analysis_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            column_index INTEGER NOT NULL CHECK (column_index >= 0),
            feature_type TEXT NOT NULL,
            impute_option TEXT NOT NULL,
            include INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY (analysis_id) REFERENCES analyses(id) ON DELETE CASCADE,
            UNIQUE(analysis_id, name)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS models (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            analysis_id INTEGER NOT NULL,
            dataset_version_id INTEGER NOT NULL,
            tenant_id INTEGER NOT NULL,
            username TEXT NOT NULL,
            target_type TEXT,
            target_location TEXT,
            storage_type TEXT,
            storage_location TEXT,
            status TEXT NOT NULL DEFAULT 'building'
                CHECK (status IN ('building', 'completed', 'failed')),
            error TEXT,
            summary TEXT,
            build_lease TEXT,
            created_at TEXT NOT NULL,
            completed_at TEXT,
            FOREIGN KEY (analysis_id) REFERENCES analyses(id) ON DELETE CASCADE,
            FOREIGN KEY (dataset_version_id) REFERENCES dataset_versions(id) ON DELETE CASCADE,
            UNIQUE(tenant_id, username, name)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_models_analysis ON models(analysis_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_versions_dataset ON dataset_versions(dataset_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS settings_kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    Ok(())
}
