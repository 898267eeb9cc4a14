//! Model lifecycle orchestrator.
//!
//! Accepts build requests, runs them as background jobs and answers
//! prediction requests from stored artifacts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ServiceContext;
use super::build_job::BuildJob;
use super::bundle::ArtifactBundle;
use super::workflow_assembly::assemble_workflow;
use crate::algorithms::CLUSTER_POINTS_ITERATIONS;
use crate::domain::{
    AlgorithmClass, BuildLease, Feature, HyperParameters, ModelStatus, ModelSummary, Owner,
    StorageDescriptor, Workflow,
};
use crate::features::{FeaturePlan, RANDOM_SEED, bernoulli_split, decode_row, prepare};
use crate::ports::{BackendError, CoreError, SessionGuard, StorageError, StorageUri, read_to_end};

/// Most rows sent to the backend by [`ModelOrchestrator::cluster_points`].
pub const CLUSTER_SAMPLE_LIMIT: usize = 10_000;

/// Handle to an accepted build.
///
/// Dropping it does not cancel the build; the job keeps running and its
/// outcome is only observable through the model's status.
#[derive(Debug)]
pub struct BuildHandle {
    model_id: i64,
    lease: BuildLease,
    task: JoinHandle<()>,
}

impl BuildHandle {
    pub const fn model_id(&self) -> i64 {
        self.model_id
    }

    pub const fn lease(&self) -> &BuildLease {
        &self.lease
    }

    /// Wait until the job has recorded a terminal state.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            warn!(model_id = self.model_id, error = %e, "Build task ended abnormally");
        }
    }
}

/// What a caller polling a build sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub model_id: i64,
    pub status: ModelStatus,
    pub error: Option<String>,
    pub storage: Option<StorageDescriptor>,
    pub summary: Option<ModelSummary>,
}

/// A clustered row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub cluster: u32,
    pub features: Vec<f64>,
}

/// Submits builds and serves predictions.
///
/// # Single writer
///
/// A build must claim the model's lease before a job is spawned. The claim
/// only succeeds while the model is `building` and unclaimed, so a second
/// submission for the same model is rejected with
/// [`CoreError::BuildRejected`] and only the claiming job can write the
/// terminal state.
pub struct ModelOrchestrator {
    ctx: Arc<ServiceContext>,
    permits: Arc<Semaphore>,
}

impl ModelOrchestrator {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        let permits = Arc::new(Semaphore::new(
            ctx.settings.effective_max_concurrent_builds(),
        ));
        Self { ctx, permits }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Accept a build for `model_id` and return without waiting for it.
    ///
    /// Metadata is loaded and the dataset header read before returning; any
    /// failure there is returned to the caller and no job is scheduled. An
    /// unknown model is `NotFound`; any other failed lookup is `Metadata`.
    pub async fn submit_build(&self, owner: &Owner, model_id: i64) -> Result<BuildHandle, CoreError> {
        let store = &self.ctx.store;
        let model = store.models.get(owner, model_id).await?;
        let workflow = assemble_workflow(store, owner, model.analysis_id).await?;
        let version = store
            .datasets
            .get_version(owner, model.dataset_version_id)
            .await
            .map_err(CoreError::metadata)?;
        let dataset = store
            .datasets
            .get_dataset(owner, version.dataset_id)
            .await
            .map_err(CoreError::metadata)?;
        let separator = dataset.data_type.column_separator();

        let mut rows = BufReader::new(self.ctx.storage.open(&version.uri).await?);
        let mut header = String::new();
        rows.read_line(&mut header)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        let header = header.trim_end_matches(['\r', '\n']).to_string();
        if header.trim().is_empty() {
            return Err(CoreError::DatasetPreparation(format!(
                "dataset version {} has no header row",
                version.id
            )));
        }

        let lease = BuildLease::generate();
        if !store
            .models
            .claim_build(model.id, &lease)
            .await
            .map_err(CoreError::metadata)?
        {
            warn!(model_id, "Build rejected: model already claimed or finished");
            return Err(CoreError::BuildRejected(format!(
                "model {model_id} is already being built or has finished"
            )));
        }
        info!(
            model_id,
            algorithm = %workflow.algorithm_name,
            dataset_version = version.id,
            "Build accepted"
        );

        let job = BuildJob {
            ctx: self.ctx.clone(),
            model,
            lease: lease.clone(),
            workflow,
            separator,
            header,
            rows,
        };
        let task = tokio::spawn(job.run(self.permits.clone()));

        Ok(BuildHandle {
            model_id,
            lease,
            task,
        })
    }

    /// Current state of a model's build.
    pub async fn model_status(&self, owner: &Owner, model_id: i64) -> Result<BuildStatus, CoreError> {
        let model = self.ctx.store.models.get(owner, model_id).await?;
        Ok(BuildStatus {
            model_id: model.id,
            status: model.status,
            error: model.error,
            storage: model.storage,
            summary: model.summary,
        })
    }

    /// Run inference with a completed model, one prediction per row.
    ///
    /// Each row holds one token per input feature in training order. Decoding
    /// happens for every row before the backend is called, so a bad row
    /// fails the whole call with `InvalidInput` and nothing is returned.
    pub async fn predict(
        &self,
        owner: &Owner,
        model_id: i64,
        rows: &[Vec<String>],
    ) -> Result<Vec<f64>, CoreError> {
        let model = self.ctx.store.models.get(owner, model_id).await?;
        let Some(descriptor) = model.storage.as_ref().filter(|_| model.is_ready()) else {
            return Err(CoreError::ModelNotReady(model_id));
        };

        let uri = StorageUri::parse(&descriptor.location)?;
        let adapter = self.ctx.storage.input(&descriptor.storage_type)?;
        let bytes = read_to_end(adapter.read(&uri).await?).await?;
        let bundle = ArtifactBundle::from_bytes(&bytes).map_err(|e| {
            StorageError::Io(format!("artifact at {uri} could not be decoded: {e}"))
        })?;

        let vectors = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                decode_row(row, &bundle.features, &bundle.means, self.ctx.encoder.as_ref())
                    .map_err(|e| match e {
                        CoreError::InvalidInput(msg) => {
                            CoreError::InvalidInput(format!("row {}: {msg}", i + 1))
                        }
                        other => other,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        let predictions = self
            .ctx
            .backend
            .predict(&bundle.trained_artifact(), &vectors)
            .await?;
        if predictions.len() != vectors.len() {
            return Err(CoreError::Backend(BackendError::Protocol(format!(
                "backend returned {} predictions for {} rows",
                predictions.len(),
                vectors.len()
            ))));
        }

        info!(model_id, rows = predictions.len(), "Prediction served");
        Ok(predictions)
    }

    /// Cluster a sample of a dataset version on the named columns.
    pub async fn cluster_points(
        &self,
        owner: &Owner,
        dataset_version_id: i64,
        feature_names: &[String],
        num_clusters: u32,
    ) -> Result<Vec<ClusterPoint>, CoreError> {
        if num_clusters == 0 {
            return Err(CoreError::Validation(
                "number of clusters must be at least 1".to_string(),
            ));
        }

        let store = &self.ctx.store;
        let version = store
            .datasets
            .get_version(owner, dataset_version_id)
            .await?;
        let dataset = store.datasets.get_dataset(owner, version.dataset_id).await?;
        let separator = dataset.data_type.column_separator();

        let blob = read_to_end(self.ctx.storage.open(&version.uri).await?).await?;
        let text = String::from_utf8_lossy(&blob);
        let mut lines = text.lines();
        let header = lines.next().unwrap_or_default();
        let columns: Vec<&str> = header.split(separator).map(str::trim).collect();

        let features = feature_names
            .iter()
            .map(|name| {
                columns
                    .iter()
                    .position(|c| c == name)
                    .map(|index| Feature::numerical(name.clone(), index))
                    .ok_or_else(|| {
                        CoreError::Validation(format!("column '{name}' is not in the dataset"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let workflow = Workflow {
            analysis_id: 0,
            algorithm_name: crate::algorithms::names::K_MEANS.to_string(),
            algorithm_class: AlgorithmClass::Clustering.as_str().to_string(),
            response_variable: None,
            train_data_fraction: 1.0,
            features,
            hyper_parameters: HyperParameters::new(),
        };
        let plan = FeaturePlan::new(&workflow, header, separator, false)?;
        let prepared = prepare(&plan, lines, separator, self.ctx.encoder.as_ref())?;

        let mut points: Vec<Vec<f64>> = prepared.rows.into_iter().map(|r| r.features).collect();
        if points.len() > CLUSTER_SAMPLE_LIMIT {
            let fraction = CLUSTER_SAMPLE_LIMIT as f64 / points.len() as f64;
            points = bernoulli_split(points, fraction, RANDOM_SEED).0;
            points.truncate(CLUSTER_SAMPLE_LIMIT);
        }
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let label = format!("cluster-{dataset_version_id}");
        let session = SessionGuard::open(self.ctx.backend.as_ref(), &label).await?;
        let assignments = session
            .cluster(&points, num_clusters, CLUSTER_POINTS_ITERATIONS)
            .await;
        session.close().await;
        let assignments = assignments?;
        if assignments.len() != points.len() {
            return Err(CoreError::Backend(BackendError::Protocol(format!(
                "backend clustered {} of {} points",
                assignments.len(),
                points.len()
            ))));
        }
        debug!(dataset_version_id, points = points.len(), "Points clustered");

        Ok(assignments
            .into_iter()
            .zip(points)
            .map(|(cluster, features)| ClusterPoint { cluster, features })
            .collect())
    }
}
