//! Analysis repository trait definition.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::RepositoryError;
use crate::domain::{Analysis, Feature, HyperParameters, NewAnalysis, Owner};

/// Repository for analyses, their configuration, hyperparameters and
/// per-feature customizations.
///
/// # Design Rules
///
/// - Configuration and hyperparameter maps are keyed uniquely by
///   (analysis id, key); setting an existing key replaces its value
/// - Feature customizations are keyed by (analysis id, feature name) and
///   keep the position they were first declared at
/// - Each `set_*` call runs in its own transaction
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn insert(&self, analysis: &NewAnalysis) -> Result<Analysis, RepositoryError>;

    async fn get(&self, owner: &Owner, id: i64) -> Result<Analysis, RepositoryError>;

    async fn list(&self, owner: &Owner, project_id: i64) -> Result<Vec<Analysis>, RepositoryError>;

    async fn delete(&self, owner: &Owner, id: i64) -> Result<(), RepositoryError>;

    /// Upsert configuration entries (algorithm name, class, response, fraction).
    async fn set_configuration(
        &self,
        analysis_id: i64,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), RepositoryError>;

    async fn get_configuration(
        &self,
        analysis_id: i64,
    ) -> Result<BTreeMap<String, String>, RepositoryError>;

    async fn set_hyper_parameters(
        &self,
        analysis_id: i64,
        params: &HyperParameters,
    ) -> Result<(), RepositoryError>;

    async fn get_hyper_parameters(
        &self,
        analysis_id: i64,
    ) -> Result<HyperParameters, RepositoryError>;

    /// Upsert feature customizations.
    async fn set_features(
        &self,
        analysis_id: i64,
        features: &[Feature],
    ) -> Result<(), RepositoryError>;

    /// All customizations in declaration order, included or not.
    async fn get_features(&self, analysis_id: i64) -> Result<Vec<Feature>, RepositoryError>;
}
