#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod algorithms;
pub mod domain;
pub mod features;
pub mod paths;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use algorithms::{AlgorithmRegistry, BackendTrainer, TrainedModel, Trainer};
pub use domain::{
    AlgorithmClass, Analysis, DataType, Dataset, DatasetVersion, Feature, FeatureType,
    HyperParameters, ImputeOption, Model, ModelStatus, ModelSummary, NewAnalysis, NewDataset,
    NewDatasetVersion, NewModel, NewProject, Owner, Project, SamplePoints, StorageDescriptor,
    Workflow,
};
pub use ports::{
    AlgorithmParams, BackendError, BlobReader, CoreError, MetadataStore, RepositoryError,
    SessionGuard, StorageAdapter, StorageError, StorageRegistry, StorageUri, TrainingBackend,
    TrainingSession,
};
pub use services::{
    BuildHandle, BuildStatus, CatalogService, ModelOrchestrator, ServiceContext, SettingsService,
};
pub use settings::{Settings, SettingsError, SettingsUpdate, validate_settings};

pub use paths::{PathError, ResolvedPaths, data_root, database_path, default_model_store};

// Adapter crates are only exercised by the integration tests
#[cfg(test)]
use mlforge_db as _;
#[cfg(test)]
use mlforge_storage as _;
