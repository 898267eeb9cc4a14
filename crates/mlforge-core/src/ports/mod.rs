//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types in any signature
//! - No filesystem or HTTP details leak through storage and training ports
//! - Repository traits are CRUD-focused; every write is its own transaction
//! - Training sessions are released through [`SessionGuard`], never by hand

pub mod analysis_repository;
pub mod dataset_repository;
pub mod model_repository;
pub mod project_repository;
pub mod settings_repository;
pub mod storage;
pub mod training;

use std::sync::Arc;
use thiserror::Error;

pub use analysis_repository::AnalysisRepository;
pub use dataset_repository::DatasetRepository;
pub use model_repository::ModelRepository;
pub use project_repository::ProjectRepository;
pub use settings_repository::SettingsRepository;
pub use storage::{
    BlobReader, IN_SUFFIX, OUT_SUFFIX, StorageAdapter, StorageError, StorageRegistry, StorageUri,
    read_to_end,
};
pub use training::{
    AlgorithmParams, BackendError, Evaluation, FitOutput, FitRequest, LabeledPoint,
    SessionGuard, TrainedArtifact, TrainingBackend, TrainingSession, TrainingSet,
};

/// Container for all metadata repository trait objects.
///
/// This is the metadata store the orchestrator sees: one handle per entity
/// family, wired by the db adapter without coupling core to `sqlx`.
///
/// # Example
///
/// ```ignore
/// // In mlforge-db factory:
/// let store = CoreFactory::build_store(pool);
///
/// // In adapter bootstrap:
/// let ctx = ServiceContext::new(store, storage, backend, settings);
/// ```
#[derive(Clone)]
pub struct MetadataStore {
    pub projects: Arc<dyn ProjectRepository>,
    pub datasets: Arc<dyn DatasetRepository>,
    pub analyses: Arc<dyn AnalysisRepository>,
    pub models: Arc<dyn ModelRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl MetadataStore {
    /// Create a new metadata store container.
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        datasets: Arc<dyn DatasetRepository>,
        analyses: Arc<dyn AnalysisRepository>,
        models: Arc<dyn ModelRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            projects,
            datasets,
            analyses,
            models,
            settings,
        }
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle persistence failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entity with the same identifier already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Database failure; the transaction, if any, was rolled back.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A constraint was violated (e.g., foreign key, unique constraint, stale lease).
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Core error type for semantic domain errors.
///
/// This is the canonical error type used across the core domain.
/// Adapters map it to their own error types (CLI exit codes, HTTP statuses).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown id, or an id not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Metadata persistence failure, wrapping the original cause.
    #[error("Metadata error: {0}")]
    Metadata(#[source] RepositoryError),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid hyperparameter {key}='{value}' for {algorithm}: {reason}")]
    InvalidHyperParameter {
        algorithm: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Malformed row during feature extraction.
    #[error("Dataset preparation failed: {0}")]
    DatasetPreparation(String),

    /// Prediction attempted before a build completed.
    #[error("Model {0} is not ready: no artifact has been stored yet")]
    ModelNotReady(i64),

    /// Prediction payload shape or type mismatch.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A build for this model is already in flight or finished.
    #[error("Build rejected: {0}")]
    BuildRejected(String),

    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Validation error (invalid caller input outside prediction).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Wrap any repository failure as a metadata error, including lookups
    /// that came back empty.
    pub fn metadata(err: RepositoryError) -> Self {
        Self::Metadata(err)
    }

    /// Short category name, used when recording failures.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::Metadata(_) => "MetadataError",
            Self::UnsupportedAlgorithm(_) => "UnsupportedAlgorithm",
            Self::InvalidHyperParameter { .. } => "InvalidHyperParameter",
            Self::DatasetPreparation(_) => "DatasetPreparationError",
            Self::ModelNotReady(_) => "ModelNotReady",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Storage(_) => "StorageError",
            Self::Backend(_) => "BackendError",
            Self::BuildRejected(_) => "BuildRejected",
            Self::Settings(_) => "SettingsError",
            Self::Validation(_) => "ValidationError",
        }
    }
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            other => Self::Metadata(other),
        }
    }
}
