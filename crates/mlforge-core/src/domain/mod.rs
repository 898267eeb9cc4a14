//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (database, filesystem, training engine).
//!
//! # Structure
//!
//! - `owner` - Tenant/user ownership shared by every entity
//! - `project` - Projects that group analyses
//! - `dataset` - Datasets, immutable dataset versions and cached samples
//! - `analysis` - Analyses, feature customizations and algorithm classes
//! - `model` - Model build attempts, statuses and storage descriptors
//! - `summary` - Evaluation summaries captured after training
//! - `workflow` - The frozen workflow snapshot handed to a build job

mod analysis;
mod dataset;
mod model;
mod owner;
mod project;
mod summary;
mod workflow;

pub use analysis::{
    AlgorithmClass, Analysis, Feature, FeatureType, HyperParameters, ImputeOption, NewAnalysis,
    config_keys,
};
pub use dataset::{DataType, Dataset, DatasetVersion, NewDataset, NewDatasetVersion, SamplePoints};
pub use model::{BuildLease, Model, ModelStatus, NewModel, StorageDescriptor};
pub use owner::Owner;
pub use project::{NewProject, Project};
pub use summary::{
    ClassClassificationAndRegressionSummary, ClusterSummary, ModelSummary, PredictedVsActual,
    ProbabilisticClassificationSummary, RocPoint,
};
pub use workflow::Workflow;
