//! The asynchronous part of a model build.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::ServiceContext;
use super::bundle::{ArtifactBundle, artifact_file_name};
use crate::algorithms::{TrainedModel, Trainer};
use crate::domain::{BuildLease, Model, StorageDescriptor, Workflow};
use crate::features::{FeaturePlan, prepare};
use crate::ports::{
    AlgorithmParams, BackendError, BlobReader, CoreError, SessionGuard, StorageError, StorageUri,
    TrainingSet,
};

/// Everything captured at submission time. Owned by the job; nothing in it
/// is shared with the submitting caller.
pub(super) struct BuildJob {
    pub ctx: Arc<ServiceContext>,
    pub model: Model,
    pub lease: BuildLease,
    pub workflow: Workflow,
    pub separator: char,
    pub header: String,
    /// Positioned just after the header line.
    pub rows: BufReader<BlobReader>,
}

impl BuildJob {
    /// Run to a terminal state. Never returns an error: failures, including
    /// panics inside the job, are recorded on the model.
    pub async fn run(self, permits: Arc<Semaphore>) {
        let ctx = self.ctx.clone();
        let model_id = self.model.id;
        let lease = self.lease.clone();

        let outcome = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| CoreError::BuildRejected("build pool is shut down".to_string()))?;
            self.execute().await
        })
        .await;

        let failure = match outcome {
            Ok(Ok(descriptor)) => {
                info!(model_id, location = %descriptor.location, "Model build completed");
                return;
            }
            Ok(Err(err)) => format!("[{}] {err}", err.category()),
            Err(join) if join.is_panic() => "[Panic] build job panicked".to_string(),
            Err(join) => format!("[Cancelled] {join}"),
        };

        error!(model_id, error = %failure, "Model build failed");
        if let Err(e) = ctx.store.models.fail_build(model_id, &lease, &failure).await {
            error!(model_id, error = %e, "Failed to record build failure");
        }
    }

    async fn execute(mut self) -> Result<StorageDescriptor, CoreError> {
        let model_id = self.model.id;
        info!(
            model_id,
            algorithm = %self.workflow.algorithm_name,
            class = %self.workflow.algorithm_class,
            "Build job started"
        );

        let trainer = self
            .ctx
            .algorithms
            .resolve(&self.workflow.algorithm_class, &self.workflow.algorithm_name)?;
        let params = trainer.parse_params(&self.workflow.hyper_parameters)?;

        let mut body = String::new();
        self.rows
            .read_to_string(&mut body)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let plan = FeaturePlan::new(
            &self.workflow,
            &self.header,
            self.separator,
            trainer.class().is_supervised(),
        )?;
        let prepared = prepare(&plan, body.lines(), self.separator, self.ctx.encoder.as_ref())?;
        if prepared.rows.is_empty() {
            return Err(CoreError::DatasetPreparation(
                "no valid rows left after missing-value handling".to_string(),
            ));
        }
        let means = prepared.means.clone();
        let data = prepared.split(self.workflow.train_data_fraction);
        info!(
            model_id,
            train = data.train_len(),
            test = data.test_len(),
            "Features prepared"
        );

        let label = format!("model-{model_id}-{}", self.lease);
        let trained = fit(&self.ctx, &label, trainer.as_ref(), data, params).await?;

        let target = match &self.model.storage_target {
            Some(target) => target.clone(),
            None => self.ctx.default_storage_target()?,
        };
        let adapter = self.ctx.storage.output(&target.storage_type)?;
        let now = Utc::now();
        let uri = StorageUri::parse(&target.location)?
            .join(&artifact_file_name(&self.model.name, now));

        let bundle = ArtifactBundle {
            algorithm_name: trainer.name().to_string(),
            algorithm_class: trainer.class().as_str().to_string(),
            features: plan.inputs,
            response_variable: self.workflow.response_variable.clone(),
            means,
            artifact_format: trained.artifact.format,
            artifact: trained.artifact.bytes,
            created_at: now,
        };
        let bytes = bundle
            .to_bytes()
            .map_err(|e| StorageError::Io(format!("failed to encode artifact: {e}")))?;
        adapter.write(&uri, &bytes).await?;
        info!(model_id, uri = %uri, bytes = bytes.len(), "Artifact written");

        let descriptor = StorageDescriptor::new(target.storage_type, uri.to_string());
        self.ctx
            .store
            .models
            .complete_build(model_id, &self.lease, &descriptor, &trained.summary)
            .await
            .map_err(CoreError::metadata)?;
        Ok(descriptor)
    }
}

/// Open a session, train inside it and release it on every path.
async fn fit(
    ctx: &ServiceContext,
    label: &str,
    trainer: &dyn Trainer,
    data: TrainingSet,
    params: AlgorithmParams,
) -> Result<TrainedModel, CoreError> {
    let session = SessionGuard::open(ctx.backend.as_ref(), label).await?;
    debug!(label, session = %session.id(), "Training session opened");

    let training = trainer.train(&*session, data, params);
    let result = match ctx.settings.training_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), training)
            .await
            .unwrap_or(Err(CoreError::Backend(BackendError::Timeout(secs)))),
        None => training.await,
    };

    session.close().await;
    result
}
