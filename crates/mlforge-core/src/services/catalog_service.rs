//! Catalog service - projects, datasets, analyses and models.
//!
//! A thin facade over the metadata repositories. It adds the few rules that
//! span more than one repository (ownership of parents, sample loading,
//! default features) and leaves building to the orchestrator.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::ServiceContext;
use crate::domain::{
    AlgorithmClass, Analysis, Dataset, DatasetVersion, Feature, HyperParameters, Model,
    NewAnalysis, NewDataset, NewDatasetVersion, NewModel, NewProject, Owner, Project,
    SamplePoints, StorageDescriptor, config_keys,
};
use crate::features::default_features;
use crate::ports::{CoreError, RepositoryError, StorageError, StorageUri};

/// Rows kept in a dataset version's cached sample.
pub const SAMPLE_ROWS: usize = 1_000;

/// Algorithm selection for an analysis. Unset fields are left as stored.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub algorithm_name: Option<String>,
    pub algorithm_class: Option<AlgorithmClass>,
    pub response_variable: Option<String>,
    pub train_data_fraction: Option<f64>,
}

/// Everything stored against an analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDetails {
    pub analysis: Analysis,
    pub configuration: BTreeMap<String, String>,
    pub hyper_parameters: HyperParameters,
    pub features: Vec<Feature>,
}

pub struct CatalogService {
    ctx: Arc<ServiceContext>,
}

impl CatalogService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_project(&self, project: NewProject) -> Result<Project, CoreError> {
        require_name("project", &project.name)?;
        let created = self.ctx.store.projects.insert(&project).await?;
        info!(project_id = created.id, name = %created.name, "Project created");
        Ok(created)
    }

    pub async fn list_projects(&self, owner: &Owner) -> Result<Vec<Project>, CoreError> {
        Ok(self.ctx.store.projects.list(owner).await?)
    }

    pub async fn delete_project(&self, owner: &Owner, id: i64) -> Result<(), CoreError> {
        self.ctx.store.projects.delete(owner, id).await?;
        info!(project_id = id, "Project deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Datasets
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_dataset(&self, dataset: NewDataset) -> Result<Dataset, CoreError> {
        require_name("dataset", &dataset.name)?;
        let created = self.ctx.store.datasets.insert_dataset(&dataset).await?;
        info!(dataset_id = created.id, name = %created.name, "Dataset created");
        Ok(created)
    }

    pub async fn list_datasets(&self, owner: &Owner) -> Result<Vec<Dataset>, CoreError> {
        Ok(self.ctx.store.datasets.list_datasets(owner).await?)
    }

    pub async fn update_dataset_comments(
        &self,
        owner: &Owner,
        id: i64,
        comments: Option<&str>,
    ) -> Result<(), CoreError> {
        self.ctx
            .store
            .datasets
            .update_comments(owner, id, comments)
            .await?;
        Ok(())
    }

    /// Delete a dataset, its versions and every model built on them.
    pub async fn delete_dataset(&self, owner: &Owner, id: i64) -> Result<(), CoreError> {
        self.ctx.store.datasets.delete_dataset(owner, id).await?;
        info!(dataset_id = id, "Dataset deleted");
        Ok(())
    }

    /// Register a new version and cache a sample of its rows.
    ///
    /// The URI is checked by reading the header before anything is stored.
    pub async fn add_version(
        &self,
        owner: &Owner,
        dataset_id: i64,
        version: &str,
        uri: &str,
    ) -> Result<DatasetVersion, CoreError> {
        require_name("version", version)?;
        let dataset = self.ctx.store.datasets.get_dataset(owner, dataset_id).await?;
        StorageUri::parse(uri)?;

        let sample = self.load_sample(uri, dataset.data_type.column_separator()).await?;
        let mut created = self
            .ctx
            .store
            .datasets
            .insert_version(&NewDatasetVersion {
                dataset_id,
                version: version.to_string(),
                uri: uri.to_string(),
            })
            .await?;
        self.ctx
            .store
            .datasets
            .attach_sample(created.id, &sample)
            .await?;
        info!(
            version_id = created.id,
            dataset_id,
            sampled = sample.rows.len(),
            "Dataset version added"
        );
        created.sample = Some(sample);
        Ok(created)
    }

    pub async fn list_versions(
        &self,
        owner: &Owner,
        dataset_id: i64,
    ) -> Result<Vec<DatasetVersion>, CoreError> {
        Ok(self
            .ctx
            .store
            .datasets
            .list_versions(owner, dataset_id)
            .await?)
    }

    /// Delete a version and every model built on it.
    pub async fn delete_version(&self, owner: &Owner, id: i64) -> Result<(), CoreError> {
        self.ctx.store.datasets.delete_version(owner, id).await?;
        info!(version_id = id, "Dataset version deleted");
        Ok(())
    }

    async fn load_sample(&self, uri: &str, separator: char) -> Result<SamplePoints, CoreError> {
        let mut reader = BufReader::new(self.ctx.storage.open(uri).await?).lines();
        let io = |e: std::io::Error| CoreError::Storage(StorageError::Io(e.to_string()));

        let Some(header) = reader.next_line().await.map_err(io)? else {
            return Err(CoreError::DatasetPreparation(format!(
                "{uri} is empty, a header row is required"
            )));
        };
        let mut rows = Vec::new();
        while rows.len() < SAMPLE_ROWS {
            match reader.next_line().await.map_err(io)? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => rows.push(line),
                None => break,
            }
        }
        debug!(uri, rows = rows.len(), "Sample loaded");
        Ok(SamplePoints::from_lines(
            &header,
            rows.iter().map(String::as_str),
            separator,
            SAMPLE_ROWS,
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Analyses
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_analysis(&self, analysis: NewAnalysis) -> Result<Analysis, CoreError> {
        require_name("analysis", &analysis.name)?;
        self.ctx
            .store
            .projects
            .get(&analysis.owner, analysis.project_id)
            .await?;
        let created = self.ctx.store.analyses.insert(&analysis).await?;
        info!(analysis_id = created.id, name = %created.name, "Analysis created");
        Ok(created)
    }

    pub async fn list_analyses(
        &self,
        owner: &Owner,
        project_id: i64,
    ) -> Result<Vec<Analysis>, CoreError> {
        Ok(self.ctx.store.analyses.list(owner, project_id).await?)
    }

    /// Delete an analysis with its configuration and models.
    pub async fn delete_analysis(&self, owner: &Owner, id: i64) -> Result<(), CoreError> {
        self.ctx.store.analyses.delete(owner, id).await?;
        info!(analysis_id = id, "Analysis deleted");
        Ok(())
    }

    /// Store algorithm selection.
    ///
    /// Choosing an algorithm also stores its default hyperparameters for
    /// any key not already set.
    pub async fn configure_analysis(
        &self,
        owner: &Owner,
        analysis_id: i64,
        config: &AnalysisConfig,
    ) -> Result<(), CoreError> {
        let analyses = &self.ctx.store.analyses;
        analyses.get(owner, analysis_id).await?;

        if let Some(fraction) = config.train_data_fraction {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(CoreError::Validation(format!(
                    "train data fraction must be in (0, 1], got {fraction}"
                )));
            }
        }

        let mut entries = BTreeMap::new();
        if let Some(name) = &config.algorithm_name {
            entries.insert(config_keys::ALGORITHM_NAME.to_string(), name.clone());
        }
        if let Some(class) = config.algorithm_class {
            entries.insert(
                config_keys::ALGORITHM_TYPE.to_string(),
                class.as_str().to_string(),
            );
        }
        if let Some(response) = &config.response_variable {
            entries.insert(config_keys::RESPONSE.to_string(), response.clone());
        }
        if let Some(fraction) = config.train_data_fraction {
            entries.insert(
                config_keys::TRAIN_DATA_FRACTION.to_string(),
                fraction.to_string(),
            );
        }
        if entries.is_empty() {
            return Ok(());
        }
        analyses.set_configuration(analysis_id, &entries).await?;

        if let Some(name) = &config.algorithm_name {
            if let Some(defaults) = self.ctx.algorithms.default_hyper_parameters(name) {
                let stored = analyses.get_hyper_parameters(analysis_id).await?;
                let missing: HyperParameters = defaults
                    .into_iter()
                    .filter(|(key, _)| !stored.contains_key(key))
                    .collect();
                if !missing.is_empty() {
                    analyses.set_hyper_parameters(analysis_id, &missing).await?;
                }
            }
        }
        debug!(analysis_id, keys = entries.len(), "Analysis configured");
        Ok(())
    }

    pub async fn set_hyper_parameters(
        &self,
        owner: &Owner,
        analysis_id: i64,
        params: &HyperParameters,
    ) -> Result<(), CoreError> {
        self.ctx.store.analyses.get(owner, analysis_id).await?;
        Ok(self
            .ctx
            .store
            .analyses
            .set_hyper_parameters(analysis_id, params)
            .await?)
    }

    pub async fn set_features(
        &self,
        owner: &Owner,
        analysis_id: i64,
        features: &[Feature],
    ) -> Result<(), CoreError> {
        self.ctx.store.analyses.get(owner, analysis_id).await?;
        Ok(self
            .ctx
            .store
            .analyses
            .set_features(analysis_id, features)
            .await?)
    }

    /// Store one default customization per column of a dataset version.
    pub async fn init_features(
        &self,
        owner: &Owner,
        analysis_id: i64,
        dataset_version_id: i64,
    ) -> Result<Vec<Feature>, CoreError> {
        self.ctx.store.analyses.get(owner, analysis_id).await?;
        let version = self
            .ctx
            .store
            .datasets
            .get_version(owner, dataset_version_id)
            .await?;
        let Some(sample) = version.sample else {
            return Err(CoreError::Validation(format!(
                "dataset version {dataset_version_id} has no cached sample"
            )));
        };

        let features = default_features(&sample);
        self.ctx
            .store
            .analyses
            .set_features(analysis_id, &features)
            .await?;
        info!(analysis_id, features = features.len(), "Default features stored");
        Ok(features)
    }

    pub async fn show_analysis(
        &self,
        owner: &Owner,
        analysis_id: i64,
    ) -> Result<AnalysisDetails, CoreError> {
        let analyses = &self.ctx.store.analyses;
        let analysis = analyses.get(owner, analysis_id).await?;
        Ok(AnalysisDetails {
            configuration: analyses.get_configuration(analysis_id).await?,
            hyper_parameters: analyses.get_hyper_parameters(analysis_id).await?,
            features: analyses.get_features(analysis_id).await?,
            analysis,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Models
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a model in `building`, bound to an analysis and a dataset
    /// version the same owner can see.
    pub async fn create_model(&self, model: NewModel) -> Result<Model, CoreError> {
        require_name("model", &model.name)?;
        let store = &self.ctx.store;
        store.analyses.get(&model.owner, model.analysis_id).await?;
        store
            .datasets
            .get_version(&model.owner, model.dataset_version_id)
            .await?;
        if let Some(target) = &model.storage_target {
            check_target(target)?;
        }

        let created = store.models.insert(&model).await?;
        info!(model_id = created.id, name = %created.name, "Model created");
        Ok(created)
    }

    pub async fn get_model(&self, owner: &Owner, id: i64) -> Result<Model, CoreError> {
        Ok(self.ctx.store.models.get(owner, id).await?)
    }

    pub async fn get_model_by_name(&self, owner: &Owner, name: &str) -> Result<Model, CoreError> {
        Ok(self.ctx.store.models.get_by_name(owner, name).await?)
    }

    /// Look a model up by numeric id first, then by name.
    pub async fn find_model(&self, owner: &Owner, identifier: &str) -> Result<Model, CoreError> {
        if let Ok(id) = identifier.parse::<i64>() {
            match self.ctx.store.models.get(owner, id).await {
                Ok(model) => return Ok(model),
                Err(RepositoryError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.get_model_by_name(owner, identifier).await
    }

    pub async fn list_models(&self, owner: &Owner) -> Result<Vec<Model>, CoreError> {
        Ok(self.ctx.store.models.list(owner).await?)
    }

    pub async fn delete_model(&self, owner: &Owner, id: i64) -> Result<(), CoreError> {
        self.ctx.store.models.delete(owner, id).await?;
        info!(model_id = id, "Model deleted");
        Ok(())
    }

    /// Choose where the model's artifact will be written.
    pub async fn set_model_storage_target(
        &self,
        owner: &Owner,
        id: i64,
        target: &StorageDescriptor,
    ) -> Result<(), CoreError> {
        check_target(target)?;
        self.ctx.store.models.get(owner, id).await?;
        self.ctx.store.models.set_storage_target(id, target).await?;
        Ok(())
    }
}

fn require_name(what: &str, name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(format!("{what} name cannot be empty")));
    }
    Ok(())
}

fn check_target(target: &StorageDescriptor) -> Result<(), CoreError> {
    if target.is_empty() {
        return Err(CoreError::Validation(
            "storage target needs both a type and a location".to_string(),
        ));
    }
    StorageUri::parse(&target.location)?;
    Ok(())
}
