//! Core services - the application's business logic layer.
//!
//! Services orchestrate between ports and domain logic. They only see
//! trait objects, wired together in a [`ServiceContext`].

mod build_job;
mod bundle;
mod catalog_service;
mod context;
mod orchestrator;
mod settings_service;
mod workflow_assembly;

pub use bundle::{ARTIFACT_TIMESTAMP_FORMAT, ArtifactBundle, artifact_file_name};
pub use catalog_service::{AnalysisConfig, AnalysisDetails, CatalogService, SAMPLE_ROWS};
pub use context::ServiceContext;
pub use orchestrator::{
    BuildHandle, BuildStatus, CLUSTER_SAMPLE_LIMIT, ClusterPoint, ModelOrchestrator,
};
pub use settings_service::SettingsService;
pub use workflow_assembly::assemble_workflow;
