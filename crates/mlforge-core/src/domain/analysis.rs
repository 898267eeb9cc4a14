//! Analysis domain types.
//!
//! An analysis binds an algorithm, its hyperparameters and a feature
//! selection to a project. It is edited incrementally before a build and
//! frozen into a [`Workflow`](super::Workflow) once a build starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Owner;

/// Hyperparameters keyed by name, values kept as the user entered them.
pub type HyperParameters = BTreeMap<String, String>;

/// Configuration keys stored against an analysis.
pub mod config_keys {
    pub const ALGORITHM_NAME: &str = "algorithmName";
    pub const ALGORITHM_TYPE: &str = "algorithmType";
    pub const RESPONSE: &str = "responseVariable";
    pub const TRAIN_DATA_FRACTION: &str = "trainDataFraction";
}

// ─────────────────────────────────────────────────────────────────────────────
// Algorithm Class
// ─────────────────────────────────────────────────────────────────────────────

/// Family of algorithms an analysis belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlgorithmClass {
    Classification,
    NumericalPrediction,
    Clustering,
    AnomalyDetection,
    Recommendation,
}

impl AlgorithmClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "Classification",
            Self::NumericalPrediction => "Numerical_Prediction",
            Self::Clustering => "Clustering",
            Self::AnomalyDetection => "Anomaly_Detection",
            Self::Recommendation => "Recommendation",
        }
    }

    /// Whether rows are paired with a label from the response column.
    pub const fn is_supervised(self) -> bool {
        matches!(self, Self::Classification | Self::NumericalPrediction)
    }
}

impl fmt::Display for AlgorithmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AlgorithmClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "classification" => Ok(Self::Classification),
            "numerical_prediction" => Ok(Self::NumericalPrediction),
            "clustering" => Ok(Self::Clustering),
            "anomaly_detection" => Ok(Self::AnomalyDetection),
            "recommendation" => Ok(Self::Recommendation),
            _ => Err(format!("unknown algorithm class '{s}'")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Features
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    Numerical,
    Categorical,
}

impl FeatureType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numerical => "NUMERICAL",
            Self::Categorical => "CATEGORICAL",
        }
    }
}

impl FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NUMERICAL" => Ok(Self::Numerical),
            "CATEGORICAL" => Ok(Self::Categorical),
            other => Err(format!("unknown feature type '{other}'")),
        }
    }
}

/// How a missing value in an included column is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImputeOption {
    Discard,
    ReplaceWithMean,
    RegressionImputation,
}

impl ImputeOption {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discard => "DISCARD",
            Self::ReplaceWithMean => "REPLACE_WITH_MEAN",
            Self::RegressionImputation => "REGRESSION_IMPUTATION",
        }
    }
}

impl FromStr for ImputeOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DISCARD" => Ok(Self::Discard),
            "REPLACE_WITH_MEAN" => Ok(Self::ReplaceWithMean),
            "REGRESSION_IMPUTATION" => Ok(Self::RegressionImputation),
            other => Err(format!("unknown impute option '{other}'")),
        }
    }
}

/// A per-analysis feature customization.
///
/// `index` is the zero-based column position in the dataset version and is
/// stable for the lifetime of that version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub index: usize,
    pub feature_type: FeatureType,
    pub impute_option: ImputeOption,
    pub include: bool,
}

impl Feature {
    /// Included numerical feature that discards rows with missing values.
    pub fn numerical(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            feature_type: FeatureType::Numerical,
            impute_option: ImputeOption::Discard,
            include: true,
        }
    }

    #[must_use]
    pub const fn with_impute(mut self, impute_option: ImputeOption) -> Self {
        self.impute_option = impute_option;
        self
    }

    #[must_use]
    pub const fn excluded(mut self) -> Self {
        self.include = false;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted analysis.
///
/// Algorithm selection, response variable and train fraction live in the
/// analysis configuration map (see [`config_keys`]); hyperparameters and
/// feature customizations are stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub owner: Owner,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An analysis to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnalysis {
    pub project_id: i64,
    pub name: String,
    pub owner: Owner,
    pub comments: Option<String>,
}
