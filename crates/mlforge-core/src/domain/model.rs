//! Model domain types.
//!
//! A `Model` is one build attempt for exactly one analysis and one dataset
//! version. It is created in the `building` state and is the only entity the
//! asynchronous build job writes to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ModelSummary, Owner};

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Building,
    Completed,
    Failed,
}

impl ModelStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Building)
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ModelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "building" => Ok(Self::Building),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown model status '{other}'")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

/// A storage type paired with a location.
///
/// Used both for the configured root a model is written under and for the
/// final artifact path recorded after a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDescriptor {
    /// Adapter family, e.g. `file` or `hdfs`.
    pub storage_type: String,
    pub location: String,
}

impl StorageDescriptor {
    pub fn new(storage_type: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            storage_type: storage_type.into(),
            location: location.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.storage_type.trim().is_empty() || self.location.trim().is_empty()
    }
}

/// Token proving ownership of an in-flight build.
///
/// Terminal writes only succeed when they present the lease that claimed
/// the build, so a stale or concurrent job can never overwrite a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildLease(String);

impl BuildLease {
    /// Generate a fresh random lease.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub analysis_id: i64,
    pub dataset_version_id: i64,
    pub owner: Owner,
    /// Root the artifact should be written under; settings default when absent.
    pub storage_target: Option<StorageDescriptor>,
    /// Artifact location, set at most once on the first successful build.
    pub storage: Option<StorageDescriptor>,
    pub status: ModelStatus,
    /// Failure detail for `failed` models.
    pub error: Option<String>,
    pub summary: Option<ModelSummary>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Whether the model has a usable artifact.
    pub fn is_ready(&self) -> bool {
        self.storage.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// A model to be inserted. New models always start in `building`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModel {
    pub name: String,
    pub analysis_id: i64,
    pub dataset_version_id: i64,
    pub owner: Owner,
    pub storage_target: Option<StorageDescriptor>,
}
