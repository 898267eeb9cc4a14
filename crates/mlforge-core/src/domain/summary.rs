//! Evaluation summaries captured after training.
//!
//! Stored alongside the model as a tagged JSON value.

use serde::{Deserialize, Serialize};

/// One scored or predicted test point next to its true label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedVsActual {
    pub predicted: f64,
    pub actual: f64,
}

impl PredictedVsActual {
    pub const fn new(predicted: f64, actual: f64) -> Self {
        Self { predicted, actual }
    }
}

/// A point on a ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
}

/// Summary for algorithms whose decision threshold was cleared, so the
/// backend reports raw scores instead of hard labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilisticClassificationSummary {
    pub roc_curve: Vec<RocPoint>,
    pub auc: f64,
    pub predicted_vs_actual: Vec<PredictedVsActual>,
}

/// Summary for tree/Bayes classifiers and regressors.
///
/// `error` is the misclassification rate for classification and the mean
/// squared error for numerical prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassClassificationAndRegressionSummary {
    pub error: f64,
    pub predicted_vs_actual: Vec<PredictedVsActual>,
}

/// Summary for centroid-based clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub train_data_compute_cost: f64,
    pub test_data_compute_cost: f64,
}

/// Algorithm-class-specific evaluation metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSummary {
    ProbabilisticClassification(ProbabilisticClassificationSummary),
    ClassClassificationAndRegression(ClassClassificationAndRegressionSummary),
    Cluster(ClusterSummary),
}

impl ModelSummary {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProbabilisticClassification(_) => "probabilistic_classification",
            Self::ClassClassificationAndRegression(_) => "class_classification_and_regression",
            Self::Cluster(_) => "cluster",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_is_tagged() {
        let summary = ModelSummary::Cluster(ClusterSummary {
            train_data_compute_cost: 1.5,
            test_data_compute_cost: 2.0,
        });

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "cluster");
        assert_eq!(json["train_data_compute_cost"], 1.5);

        let back: ModelSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), "cluster");
    }
}
