//! Persisted artifact format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Feature;
use crate::ports::TrainedArtifact;

/// Timestamp suffix of artifact file names (`yyyyMMddHHmmssSSS`).
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Self-describing blob written for every completed build.
///
/// Carries enough to decode prediction rows without re-reading the
/// analysis: input features in training order and the imputation means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub algorithm_name: String,
    pub algorithm_class: String,
    pub features: Vec<Feature>,
    pub response_variable: Option<String>,
    #[serde(default)]
    pub means: BTreeMap<String, f64>,
    pub artifact_format: String,
    #[serde(with = "base64_bytes")]
    pub artifact: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl ArtifactBundle {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn trained_artifact(&self) -> TrainedArtifact {
        TrainedArtifact {
            format: self.artifact_format.clone(),
            bytes: self.artifact.clone(),
        }
    }
}

/// `<model name>.<timestamp>`
pub fn artifact_file_name(model_name: &str, at: DateTime<Utc>) -> String {
    format!("{model_name}.{}", at.format(ARTIFACT_TIMESTAMP_FORMAT))
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
