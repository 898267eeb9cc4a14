//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Database pool and repositories (via mlforge-db)
//! - Storage adapters (via mlforge-storage)
//! - Training engine client (via mlforge-engine)
//! - Core services (via mlforge-core)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use mlforge_core::paths::database_path;
use mlforge_core::{CatalogService, ModelOrchestrator, Owner, ServiceContext, SettingsService};
use mlforge_db::{CoreFactory, setup_database};
use mlforge_engine::{EngineConfig, RemoteTrainingBackend};
use mlforge_storage::default_registry;
use tracing_subscriber::EnvFilter;

/// Log level when neither `--verbose` nor `RUST_LOG` says otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging filter: `debug` with `--verbose`, else `RUST_LOG` when it
/// parses, else [`DEFAULT_LOG_LEVEL`].
pub fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Caller identity applied to every command.
    pub owner: Owner,
    /// Metadata database; the data directory's database when unset.
    pub database_path: Option<PathBuf>,
}

impl CliConfig {
    pub fn new(owner: Owner) -> Self {
        Self {
            owner,
            database_path: None,
        }
    }

    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub owner: Owner,
    pub catalog: CatalogService,
    pub orchestrator: ModelOrchestrator,
    pub settings: SettingsService,
}

/// Bootstrap the CLI application.
///
/// Settings are loaded from the database first, since they choose the
/// storage defaults and the engine URL.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let db_path = match config.database_path {
        Some(path) => path,
        None => database_path()?,
    };
    let pool = setup_database(&db_path).await?;
    let store = CoreFactory::build_store(pool);

    let settings_service = SettingsService::new(Arc::clone(&store.settings));
    let settings = settings_service.get().await?;

    let storage = default_registry(&settings)?;
    let backend = Arc::new(RemoteTrainingBackend::new(&EngineConfig::from_settings(
        &settings,
    ))?);

    let ctx = Arc::new(ServiceContext::new(store, storage, backend, settings));
    tracing::debug!(database = %db_path.display(), owner = %config.owner, "CLI context ready");

    Ok(CliContext {
        owner: config.owner,
        catalog: CatalogService::new(Arc::clone(&ctx)),
        orchestrator: ModelOrchestrator::new(ctx),
        settings: settings_service,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(false, None).to_string(), "info");
        assert_eq!(log_filter(false, Some("mlforge_core=trace")).to_string(), "mlforge_core=trace");
        assert_eq!(log_filter(true, Some("warn")).to_string(), "debug");
    }
}
