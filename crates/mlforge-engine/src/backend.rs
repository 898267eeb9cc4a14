//! [`TrainingBackend`] implementation over the engine's REST API.
//!
//! | Operation | Request |
//! |---|---|
//! | open session | `POST /sessions` |
//! | fit | `POST /sessions/{id}/fit` |
//! | cluster | `POST /sessions/{id}/cluster` |
//! | stop | `DELETE /sessions/{id}` |
//! | predict | `POST /predict` |

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use mlforge_core::ports::{
    BackendError, FitOutput, FitRequest, TrainedArtifact, TrainingBackend, TrainingSession,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::transport::{EngineTransport, ReqwestTransport};
use crate::wire::{
    ClusterRequest, ClusterResponse, FitResponse, OpenSessionRequest, OpenSessionResponse,
    PredictRequest, PredictResponse, WireArtifact,
};

fn session_path(id: &str) -> String {
    format!("sessions/{id}")
}

async fn call<Req, Resp>(
    transport: &dyn EngineTransport,
    path: &str,
    body: &Req,
) -> EngineResult<Resp>
where
    Req: Serialize + Sync + ?Sized,
    Resp: DeserializeOwned,
{
    let body = serde_json::to_value(body)
        .map_err(|e| EngineError::InvalidResponse(format!("unserializable request: {e}")))?;
    let value = transport.post(path, body).await?;
    Ok(serde_json::from_value(value)?)
}

/// Training backend that delegates every fit to the remote engine.
pub struct RemoteTrainingBackend {
    transport: Arc<dyn EngineTransport>,
}

impl RemoteTrainingBackend {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new(config)?)))
    }

    pub fn with_transport(transport: Arc<dyn EngineTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TrainingBackend for RemoteTrainingBackend {
    async fn open_session(&self, label: &str) -> Result<Box<dyn TrainingSession>, BackendError> {
        let response: OpenSessionResponse = call(
            self.transport.as_ref(),
            "sessions",
            &OpenSessionRequest { label },
        )
        .await
        .map_err(|e| e.into_backend(BackendError::Unavailable))?;

        debug!(session = %response.session_id, label, "Opened engine session");
        Ok(Box::new(RemoteSession {
            id: response.session_id,
            transport: Arc::clone(&self.transport),
            stopped: false,
        }))
    }

    async fn predict(
        &self,
        artifact: &TrainedArtifact,
        rows: &[Vec<f64>],
    ) -> Result<Vec<f64>, BackendError> {
        let request = PredictRequest {
            artifact: WireArtifact::from(artifact),
            rows,
        };
        let response: PredictResponse = call(self.transport.as_ref(), "predict", &request)
            .await
            .map_err(|e| e.into_backend(BackendError::Prediction))?;
        Ok(response.predictions)
    }
}

/// A session on the engine. Closing it sends a `DELETE` and waits for the
/// answer; `stop` sends it in the background.
pub struct RemoteSession {
    id: String,
    transport: Arc<dyn EngineTransport>,
    stopped: bool,
}

#[async_trait]
impl TrainingSession for RemoteSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fit(&self, request: FitRequest) -> Result<FitOutput, BackendError> {
        let path = format!("{}/fit", session_path(&self.id));
        let response: FitResponse = call(self.transport.as_ref(), &path, &request)
            .await
            .map_err(|e| e.into_backend(BackendError::Training))?;
        FitOutput::try_from(response).map_err(|e| e.into_backend(BackendError::Training))
    }

    async fn cluster(
        &self,
        points: &[Vec<f64>],
        num_clusters: u32,
        iterations: u32,
    ) -> Result<Vec<u32>, BackendError> {
        let path = format!("{}/cluster", session_path(&self.id));
        let request = ClusterRequest {
            points,
            num_clusters,
            iterations,
        };
        let response: ClusterResponse = call(self.transport.as_ref(), &path, &request)
            .await
            .map_err(|e| e.into_backend(BackendError::Training))?;
        Ok(response.assignments)
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if self.stopped {
            return Ok(());
        }
        self.transport
            .delete(&session_path(&self.id))
            .await
            .map_err(|e| e.into_backend(BackendError::Unavailable))?;
        self.stopped = true;
        debug!(session = %self.id, "Closed engine session");
        Ok(())
    }

    fn stop(&mut self) {
        if std::mem::replace(&mut self.stopped, true) {
            return;
        }
        let path = session_path(&self.id);
        let transport = Arc::clone(&self.transport);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let id = self.id.clone();
                handle.spawn(async move {
                    if let Err(e) = transport.delete(&path).await {
                        warn!(session = %id, error = %e, "Failed to stop engine session");
                    }
                });
            }
            Err(_) => {
                warn!(session = %self.id, "No async runtime to stop engine session; it will expire on the engine");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use mlforge_core::domain::PredictedVsActual;
    use mlforge_core::ports::{AlgorithmParams, Evaluation, SessionGuard, TrainingSet};
    use serde_json::json;
    use std::time::Duration;

    fn backend(transport: &Arc<ScriptedTransport>) -> RemoteTrainingBackend {
        RemoteTrainingBackend::with_transport(transport.clone())
    }

    fn request() -> FitRequest {
        FitRequest {
            params: AlgorithmParams::NaiveBayes { lambda: 1.0 },
            data: TrainingSet::Unlabeled {
                train: vec![vec![1.0]],
                test: vec![],
            },
            clear_threshold: false,
        }
    }

    async fn wait_for_calls(transport: &ScriptedTransport, n: usize) {
        for _ in 0..100 {
            if transport.calls().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_open_session_sends_label() {
        let transport = Arc::new(
            ScriptedTransport::new().respond("sessions", Ok(json!({"session_id": "s-1"}))),
        );

        let session = backend(&transport).open_session("build-7").await.unwrap();

        assert_eq!(session.id(), "s-1");
        let calls = transport.calls();
        assert_eq!(calls[0].path, "sessions");
        assert_eq!(calls[0].body, Some(json!({"label": "build-7"})));
    }

    #[tokio::test]
    async fn test_fit_decodes_artifact_and_evaluation() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("sessions", Ok(json!({"session_id": "s-1"})))
                .respond(
                    "/fit",
                    Ok(json!({
                        "artifact": {"format": "nb-v1", "data": "AQID"},
                        "evaluation": {
                            "kind": "predictions",
                            "points": [{"predicted": 1.0, "actual": 0.0}]
                        }
                    })),
                ),
        );

        let session = backend(&transport).open_session("build-7").await.unwrap();
        let output = session.fit(request()).await.unwrap();

        assert_eq!(output.artifact.format, "nb-v1");
        assert_eq!(output.artifact.bytes, vec![1, 2, 3]);
        assert_eq!(
            output.evaluation,
            Evaluation::Predictions {
                points: vec![PredictedVsActual::new(1.0, 0.0)]
            }
        );
        assert_eq!(transport.calls()[1].path, "sessions/s-1/fit");
    }

    #[tokio::test]
    async fn test_engine_rejection_is_training_error() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("sessions", Ok(json!({"session_id": "s-1"})))
                .respond(
                    "/fit",
                    Err(EngineError::Status {
                        status: 422,
                        url: "sessions/s-1/fit".into(),
                        message: "labels must be 0 or 1".into(),
                    }),
                ),
        );

        let session = backend(&transport).open_session("b").await.unwrap();
        let err = session.fit(request()).await.unwrap_err();

        assert!(matches!(err, BackendError::Training(ref m) if m.contains("labels")));
    }

    #[tokio::test]
    async fn test_garbled_response_is_protocol_error() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("sessions", Ok(json!({"session_id": "s-1"})))
                .respond("/cluster", Ok(json!({"clusters": [0, 1]}))),
        );

        let session = backend(&transport).open_session("b").await.unwrap();
        let err = session.cluster(&[vec![0.0]], 2, 10).await.unwrap_err();

        assert!(matches!(err, BackendError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_guard_deletes_session_once() {
        let transport = Arc::new(
            ScriptedTransport::new().respond("sessions", Ok(json!({"session_id": "s-9"}))),
        );

        let guard = SessionGuard::open(&backend(&transport), "b").await.unwrap();
        drop(guard);
        wait_for_calls(&transport, 2).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let deletes: Vec<_> = transport
            .calls()
            .into_iter()
            .filter(|c| c.method == "DELETE")
            .collect();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].path, "sessions/s-9");
    }

    #[test]
    fn test_closed_session_survives_runtime_shutdown() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("sessions", Ok(json!({"session_id": "s-4"})))
                .with_delete_delay(Duration::from_millis(20)),
        );
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let guard = SessionGuard::open(&backend(&transport), "b").await.unwrap();
            guard.close().await;
        });
        drop(runtime);

        let deletes = transport.completed_deletes();
        assert_eq!(deletes, vec!["sessions/s-4".to_string()]);
    }

    #[tokio::test]
    async fn test_close_reports_engine_failure() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("sessions", Ok(json!({"session_id": "s-5"})))
                .fail_deletes(),
        );

        let mut session = backend(&transport).open_session("b").await.unwrap();
        let err = session.close().await.unwrap_err();

        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_predict_sends_encoded_artifact() {
        let transport = Arc::new(
            ScriptedTransport::new().respond("predict", Ok(json!({"predictions": [0.5, 1.5]}))),
        );
        let artifact = TrainedArtifact {
            format: "lr-v1".to_string(),
            bytes: vec![1, 2, 3],
        };

        let out = backend(&transport)
            .predict(&artifact, &[vec![1.0], vec![2.0]])
            .await
            .unwrap();

        assert_eq!(out, vec![0.5, 1.5]);
        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["artifact"]["data"], "AQID");
        assert_eq!(body["rows"], json!([[1.0], [2.0]]));
    }
}
