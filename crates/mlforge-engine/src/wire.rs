//! Request and response bodies of the engine API.
//!
//! Artifacts travel base64-encoded; everything else reuses the port types.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use mlforge_core::ports::{Evaluation, FitOutput, TrainedArtifact};

use crate::error::EngineError;

#[derive(Debug, Serialize)]
pub struct OpenSessionRequest<'a> {
    pub label: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct OpenSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireArtifact {
    pub format: String,
    /// Base64 of the artifact bytes.
    pub data: String,
}

impl From<&TrainedArtifact> for WireArtifact {
    fn from(artifact: &TrainedArtifact) -> Self {
        Self {
            format: artifact.format.clone(),
            data: STANDARD.encode(&artifact.bytes),
        }
    }
}

impl TryFrom<WireArtifact> for TrainedArtifact {
    type Error = EngineError;

    fn try_from(wire: WireArtifact) -> Result<Self, Self::Error> {
        let bytes = STANDARD
            .decode(wire.data.as_bytes())
            .map_err(|e| EngineError::InvalidResponse(format!("artifact is not base64: {e}")))?;
        Ok(Self {
            format: wire.format,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FitResponse {
    pub artifact: WireArtifact,
    pub evaluation: Evaluation,
}

impl TryFrom<FitResponse> for FitOutput {
    type Error = EngineError;

    fn try_from(response: FitResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            artifact: response.artifact.try_into()?,
            evaluation: response.evaluation,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ClusterRequest<'a> {
    pub points: &'a [Vec<f64>],
    pub num_clusters: u32,
    pub iterations: u32,
}

#[derive(Debug, Deserialize)]
pub struct ClusterResponse {
    pub assignments: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub artifact: WireArtifact,
    pub rows: &'a [Vec<f64>],
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<f64>,
}
