//! Training backend port.
//!
//! The backend is an external numerical engine. Core never fits models
//! itself: it hands the engine a prepared feature matrix plus typed
//! hyperparameters and gets back an opaque artifact and raw evaluation
//! output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use thiserror::Error;

use crate::domain::PredictedVsActual;

/// Errors reported by a training backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The engine could not be reached or refused to open a session.
    #[error("Training backend unavailable: {0}")]
    Unavailable(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    /// The engine answered with something we could not understand.
    #[error("Training backend protocol error: {0}")]
    Protocol(String),

    #[error("Training timed out after {0}s")]
    Timeout(u64),
}

// ─────────────────────────────────────────────────────────────────────────────
// Data
// ─────────────────────────────────────────────────────────────────────────────

/// A feature vector paired with its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub label: f64,
    pub features: Vec<f64>,
}

/// Disjoint train and test partitions of the prepared rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainingSet {
    Labeled {
        train: Vec<LabeledPoint>,
        test: Vec<LabeledPoint>,
    },
    Unlabeled {
        train: Vec<Vec<f64>>,
        test: Vec<Vec<f64>>,
    },
}

impl TrainingSet {
    pub fn train_len(&self) -> usize {
        match self {
            Self::Labeled { train, .. } => train.len(),
            Self::Unlabeled { train, .. } => train.len(),
        }
    }

    pub fn test_len(&self) -> usize {
        match self {
            Self::Labeled { test, .. } => test.len(),
            Self::Unlabeled { test, .. } => test.len(),
        }
    }
}

/// Typed hyperparameters for each algorithm the backend knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgorithmParams {
    LogisticRegression {
        learning_rate: f64,
        iterations: u32,
        reg_type: String,
        reg_param: f64,
        sgd_data_fraction: f64,
    },
    Svm {
        iterations: u32,
        reg_type: String,
        reg_param: f64,
        learning_rate: f64,
        sgd_data_fraction: f64,
    },
    DecisionTree {
        num_classes: u32,
        impurity: String,
        max_depth: u32,
        max_bins: u32,
    },
    NaiveBayes {
        lambda: f64,
    },
    LinearRegression {
        iterations: u32,
        learning_rate: f64,
        sgd_data_fraction: f64,
    },
    RidgeRegression {
        iterations: u32,
        learning_rate: f64,
        reg_param: f64,
        sgd_data_fraction: f64,
    },
    LassoRegression {
        iterations: u32,
        learning_rate: f64,
        reg_param: f64,
        sgd_data_fraction: f64,
    },
    KMeans {
        num_clusters: u32,
        iterations: u32,
    },
}

/// One training request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRequest {
    pub params: AlgorithmParams,
    pub data: TrainingSet,
    /// Report raw scores instead of thresholded labels on the test set.
    pub clear_threshold: bool,
}

/// A trained model as produced by the backend. Opaque to core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainedArtifact {
    /// Backend-defined encoding tag.
    pub format: String,
    pub bytes: Vec<u8>,
}

/// Raw evaluation output on the test partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evaluation {
    /// Predicted (or scored) value per labeled test point.
    Predictions { points: Vec<PredictedVsActual> },
    /// Within-cluster sum of squared distances.
    ClusterCost { train: f64, test: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutput {
    pub artifact: TrainedArtifact,
    pub evaluation: Evaluation,
}

// ─────────────────────────────────────────────────────────────────────────────
// Ports
// ─────────────────────────────────────────────────────────────────────────────

/// An execution session on the engine (the equivalent of a cluster context).
///
/// Sessions are created per request and must be stopped on every path; wrap
/// them in a [`SessionGuard`] as soon as they are opened.
#[async_trait]
pub trait TrainingSession: Send + Sync {
    fn id(&self) -> &str;

    async fn fit(&self, request: FitRequest) -> Result<FitOutput, BackendError>;

    /// Cluster `points` with k-means and return the cluster of each point.
    async fn cluster(
        &self,
        points: &[Vec<f64>],
        num_clusters: u32,
        iterations: u32,
    ) -> Result<Vec<u32>, BackendError>;

    /// Release engine resources and wait until the engine has let go.
    async fn close(&mut self) -> Result<(), BackendError> {
        self.stop();
        Ok(())
    }

    /// Best-effort release for drop paths. Must be idempotent and must not
    /// block.
    fn stop(&mut self);
}

/// The external training engine.
#[async_trait]
pub trait TrainingBackend: Send + Sync {
    /// Open a fresh session; `label` identifies it in engine logs.
    async fn open_session(&self, label: &str) -> Result<Box<dyn TrainingSession>, BackendError>;

    /// Run inference with a previously trained artifact, one value per row.
    async fn predict(
        &self,
        artifact: &TrainedArtifact,
        rows: &[Vec<f64>],
    ) -> Result<Vec<f64>, BackendError>;
}

/// Scoped ownership of a [`TrainingSession`].
///
/// [`SessionGuard::close`] releases the session and waits for the engine.
/// A guard dropped without closing (early return, panic, cancellation)
/// falls back to [`TrainingSession::stop`].
pub struct SessionGuard {
    session: Box<dyn TrainingSession>,
    closed: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn TrainingSession>) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    /// Open a session on `backend` and guard it immediately.
    pub async fn open(backend: &dyn TrainingBackend, label: &str) -> Result<Self, BackendError> {
        backend.open_session(label).await.map(Self::new)
    }

    /// Release the session and wait for the release to finish. A failed
    /// release is logged, not returned: the work done inside the session
    /// stands either way.
    pub async fn close(mut self) {
        tracing::debug!(session = %self.session.id(), "Closing training session");
        if let Err(e) = self.session.close().await {
            tracing::warn!(session = %self.session.id(), error = %e, "Failed to close training session");
        }
        self.closed = true;
    }
}

impl Deref for SessionGuard {
    type Target = dyn TrainingSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::debug!(session = %self.session.id(), "Stopping training session");
        self.session.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSession {
        stops: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TrainingSession for CountingSession {
        fn id(&self) -> &str {
            "counting"
        }

        async fn fit(&self, _request: FitRequest) -> Result<FitOutput, BackendError> {
            Err(BackendError::Training("not supported".into()))
        }

        async fn cluster(
            &self,
            _points: &[Vec<f64>],
            _num_clusters: u32,
            _iterations: u32,
        ) -> Result<Vec<u32>, BackendError> {
            Ok(Vec::new())
        }

        async fn close(&mut self) -> Result<(), BackendError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_guard_stops_session_on_error_path() {
        let stops = Arc::new(AtomicUsize::new(0));

        let result = {
            let guard = SessionGuard::new(Box::new(CountingSession {
                stops: stops.clone(),
                closes: Arc::new(AtomicUsize::new(0)),
            }));
            guard
                .fit(FitRequest {
                    params: AlgorithmParams::NaiveBayes { lambda: 1.0 },
                    data: TrainingSet::Unlabeled {
                        train: vec![],
                        test: vec![],
                    },
                    clear_threshold: false,
                })
                .await
        };

        assert!(result.is_err());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closed_guard_does_not_stop_again() {
        let stops = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));

        let guard = SessionGuard::new(Box::new(CountingSession {
            stops: stops.clone(),
            closes: closes.clone(),
        }));
        guard.close().await;

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_params_are_tagged_by_algorithm() {
        let json = serde_json::to_value(AlgorithmParams::KMeans {
            num_clusters: 3,
            iterations: 100,
        })
        .unwrap();
        assert_eq!(json["algorithm"], "K_MEANS");
        assert_eq!(json["num_clusters"], 3);
    }
}
