//! Shared fixtures for the orchestrator integration tests.
//!
//! `ScriptedBackend` stands in for the training engine: it never fits
//! anything, echoes labels back as predictions and counts every session it
//! opens and stops. `Harness` wires it into a real `SQLite` store and a
//! local storage adapter inside a temp directory.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

use mlforge_core::domain::PredictedVsActual;
use mlforge_core::ports::{
    BackendError, BlobReader, Evaluation, FitOutput, FitRequest, StorageAdapter, StorageError,
    StorageRegistry, StorageUri, TrainedArtifact, TrainingBackend, TrainingSession, TrainingSet,
};
use mlforge_core::services::{AnalysisConfig, CatalogService};
use mlforge_core::{
    AlgorithmClass, DataType, ModelOrchestrator, NewAnalysis, NewDataset, NewModel, NewProject,
    Owner, ServiceContext, Settings,
};
use mlforge_db::{CoreFactory, setup_database};
use mlforge_storage::LocalFileAdapter;

/// Format tag of artifacts produced by [`ScriptedBackend`].
pub const SCRIPTED_FORMAT: &str = "scripted";

/// Number of input columns in [`write_iris_like`] datasets.
pub const FEATURE_COLUMNS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitBehavior {
    Succeed,
    Fail,
    Panic,
    /// Never finishes.
    Hang,
}

/// Deterministic in-process training engine.
pub struct ScriptedBackend {
    behavior: FitBehavior,
    gate: Option<Arc<Notify>>,
    opened: AtomicUsize,
    stopped: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    fits: Arc<Mutex<Vec<FitRequest>>>,
}

impl ScriptedBackend {
    pub fn new(behavior: FitBehavior) -> Self {
        Self {
            behavior,
            gate: None,
            opened: AtomicUsize::new(0),
            stopped: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            fits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Block every `fit` until the returned gate is notified.
    pub fn gated(behavior: FitBehavior) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut backend = Self::new(behavior);
        backend.gate = Some(gate.clone());
        (backend, gate)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sessions released through an awaited close.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn fits(&self) -> Vec<FitRequest> {
        self.fits.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrainingBackend for ScriptedBackend {
    async fn open_session(&self, label: &str) -> Result<Box<dyn TrainingSession>, BackendError> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            id: format!("{label}-{n}"),
            behavior: self.behavior,
            gate: self.gate.clone(),
            stopped: self.stopped.clone(),
            closed: self.closed.clone(),
            fits: self.fits.clone(),
            done: false,
        }))
    }

    async fn predict(
        &self,
        artifact: &TrainedArtifact,
        rows: &[Vec<f64>],
    ) -> Result<Vec<f64>, BackendError> {
        if artifact.format != SCRIPTED_FORMAT {
            return Err(BackendError::Prediction(format!(
                "unknown artifact format '{}'",
                artifact.format
            )));
        }
        Ok(rows.iter().map(|row| row.iter().sum()).collect())
    }
}

struct ScriptedSession {
    id: String,
    behavior: FitBehavior,
    gate: Option<Arc<Notify>>,
    stopped: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    fits: Arc<Mutex<Vec<FitRequest>>>,
    done: bool,
}

#[async_trait]
impl TrainingSession for ScriptedSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fit(&self, request: FitRequest) -> Result<FitOutput, BackendError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.fits.lock().unwrap().push(request.clone());

        match self.behavior {
            FitBehavior::Succeed => {}
            FitBehavior::Fail => return Err(BackendError::Training("diverged".to_string())),
            FitBehavior::Panic => panic!("scripted backend panic"),
            FitBehavior::Hang => std::future::pending::<()>().await,
        }

        let evaluation = match &request.data {
            TrainingSet::Labeled { test, .. } => Evaluation::Predictions {
                points: test
                    .iter()
                    .map(|p| PredictedVsActual::new(p.label, p.label))
                    .collect(),
            },
            TrainingSet::Unlabeled { train, test } => Evaluation::ClusterCost {
                train: train.len() as f64,
                test: test.len() as f64,
            },
        };
        Ok(FitOutput {
            artifact: TrainedArtifact {
                format: SCRIPTED_FORMAT.to_string(),
                bytes: vec![7, 7, 7],
            },
            evaluation,
        })
    }

    async fn cluster(
        &self,
        points: &[Vec<f64>],
        num_clusters: u32,
        _iterations: u32,
    ) -> Result<Vec<u32>, BackendError> {
        if self.behavior == FitBehavior::Fail {
            return Err(BackendError::Training("diverged".to_string()));
        }
        Ok((0..points.len())
            .map(|i| u32::try_from(i).unwrap() % num_clusters)
            .collect())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if !self.done {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        self.stop();
        Ok(())
    }

    fn stop(&mut self) {
        if !self.done {
            self.done = true;
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Local adapter that counts writes.
#[derive(Default)]
pub struct CountingStorage {
    inner: LocalFileAdapter,
    writes: AtomicUsize,
}

impl CountingStorage {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageAdapter for CountingStorage {
    fn storage_type(&self) -> &str {
        StorageUri::FILE
    }

    async fn read(&self, uri: &StorageUri) -> Result<BlobReader, StorageError> {
        self.inner.read(uri).await
    }

    async fn write(&self, uri: &StorageUri, data: &[u8]) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(uri, data).await
    }
}

/// `f1..f8,Class` with `rows` fully populated rows. The label alternates
/// between 0 and 1.
pub fn write_iris_like(path: &Path, rows: usize) {
    let mut header: Vec<String> = (1..=FEATURE_COLUMNS).map(|i| format!("f{i}")).collect();
    header.push("Class".to_string());

    let mut text = header.join(",");
    text.push('\n');
    for r in 0..rows {
        let mut line: Vec<String> = (0..FEATURE_COLUMNS)
            .map(|c| format!("{}.{}", r % 7 + c, c))
            .collect();
        line.push((r % 2).to_string());
        text.push_str(&line.join(","));
        text.push('\n');
    }
    std::fs::write(path, text).unwrap();
}

/// Two well-formed prediction rows for [`write_iris_like`] models.
pub fn well_formed_rows() -> Vec<Vec<String>> {
    vec![
        (0..FEATURE_COLUMNS).map(|c| format!("{c}.5")).collect(),
        (0..FEATURE_COLUMNS).map(|_| "1".to_string()).collect(),
    ]
}

pub struct Harness {
    pub dir: TempDir,
    pub owner: Owner,
    pub backend: Arc<ScriptedBackend>,
    pub storage: Arc<CountingStorage>,
    pub catalog: CatalogService,
    pub orchestrator: Arc<ModelOrchestrator>,
    pub analysis_id: i64,
    pub version_id: i64,
}

impl Harness {
    pub async fn new(backend: ScriptedBackend) -> Self {
        Self::with_settings(backend, |_| {}).await
    }

    pub async fn with_settings(backend: ScriptedBackend, tweak: impl FnOnce(&mut Settings)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup_database(&dir.path().join("mlforge.db")).await.unwrap();
        let store = CoreFactory::build_store(pool);

        let mut settings = Settings::with_defaults();
        settings.default_storage_location =
            Some(dir.path().join("models").to_string_lossy().to_string());
        tweak(&mut settings);

        let backend = Arc::new(backend);
        let storage = Arc::new(CountingStorage::default());
        let registry = StorageRegistry::new().with_adapter(storage.clone());
        let ctx = Arc::new(ServiceContext::new(
            store,
            registry,
            backend.clone(),
            settings,
        ));
        let catalog = CatalogService::new(ctx.clone());
        let orchestrator = Arc::new(ModelOrchestrator::new(ctx));
        let owner = Owner::new(-1234, "admin");

        let csv = dir.path().join("iris.csv");
        write_iris_like(&csv, 40);

        let project = catalog
            .create_project(NewProject {
                name: "flowers".to_string(),
                description: None,
                owner: owner.clone(),
            })
            .await
            .unwrap();
        let dataset = catalog
            .create_dataset(NewDataset {
                name: "iris".to_string(),
                owner: owner.clone(),
                data_type: DataType::Csv,
                source_type: "file".to_string(),
                target_type: "file".to_string(),
                comments: None,
            })
            .await
            .unwrap();
        let version = catalog
            .add_version(&owner, dataset.id, "1.0", &csv.to_string_lossy())
            .await
            .unwrap();
        let analysis = catalog
            .create_analysis(NewAnalysis {
                project_id: project.id,
                name: "species".to_string(),
                owner: owner.clone(),
                comments: None,
            })
            .await
            .unwrap();
        catalog
            .init_features(&owner, analysis.id, version.id)
            .await
            .unwrap();

        Self {
            dir,
            owner,
            backend,
            storage,
            catalog,
            orchestrator,
            analysis_id: analysis.id,
            version_id: version.id,
        }
    }

    /// Select an algorithm on the shared analysis.
    pub async fn configure(&self, name: &str, class: AlgorithmClass, response: Option<&str>) {
        self.catalog
            .configure_analysis(
                &self.owner,
                self.analysis_id,
                &AnalysisConfig {
                    algorithm_name: Some(name.to_string()),
                    algorithm_class: Some(class),
                    response_variable: response.map(str::to_string),
                    train_data_fraction: Some(0.7),
                },
            )
            .await
            .unwrap();
    }

    pub async fn model(&self, name: &str) -> i64 {
        self.catalog
            .create_model(NewModel {
                name: name.to_string(),
                analysis_id: self.analysis_id,
                dataset_version_id: self.version_id,
                owner: self.owner.clone(),
                storage_target: None,
            })
            .await
            .unwrap()
            .id
    }

    pub fn models_dir(&self) -> PathBuf {
        self.dir.path().join("models")
    }
}
