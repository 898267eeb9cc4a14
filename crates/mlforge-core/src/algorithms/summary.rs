//! Evaluation metrics and summary assembly.

use crate::domain::{
    AlgorithmClass, ClassClassificationAndRegressionSummary, ClusterSummary, ModelSummary,
    PredictedVsActual, ProbabilisticClassificationSummary, RocPoint,
};
use crate::ports::{BackendError, CoreError, Evaluation};

/// Most predicted-vs-actual points kept in a stored summary.
pub const SUMMARY_SAMPLE_SIZE: usize = 10_000;

/// Which summary variant an algorithm produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    /// Threshold is cleared; the backend reports scores.
    Probabilistic,
    ClassAndRegression,
    Cluster,
}

impl SummaryKind {
    pub const fn clears_threshold(self) -> bool {
        matches!(self, Self::Probabilistic)
    }
}

/// Route raw backend evaluation into the summary variant for `kind`.
pub fn summarize(
    kind: SummaryKind,
    class: AlgorithmClass,
    evaluation: Evaluation,
) -> Result<ModelSummary, CoreError> {
    match (kind, evaluation) {
        (SummaryKind::Probabilistic, Evaluation::Predictions { points }) => {
            let roc_curve = roc_curve(&points);
            let auc = area_under_curve(&roc_curve);
            Ok(ModelSummary::ProbabilisticClassification(
                ProbabilisticClassificationSummary {
                    roc_curve,
                    auc,
                    predicted_vs_actual: capped(points),
                },
            ))
        }
        (SummaryKind::ClassAndRegression, Evaluation::Predictions { points }) => {
            let error = match class {
                AlgorithmClass::NumericalPrediction => mean_squared_error(&points),
                _ => misclassification_rate(&points),
            };
            Ok(ModelSummary::ClassClassificationAndRegression(
                ClassClassificationAndRegressionSummary {
                    error,
                    predicted_vs_actual: capped(points),
                },
            ))
        }
        (SummaryKind::Cluster, Evaluation::ClusterCost { train, test }) => {
            Ok(ModelSummary::Cluster(ClusterSummary {
                train_data_compute_cost: train,
                test_data_compute_cost: test,
            }))
        }
        (kind, _) => Err(CoreError::Backend(BackendError::Protocol(format!(
            "evaluation output does not match the {kind:?} summary"
        )))),
    }
}

fn capped(mut points: Vec<PredictedVsActual>) -> Vec<PredictedVsActual> {
    points.truncate(SUMMARY_SAMPLE_SIZE);
    points
}

/// ROC curve of scored binary predictions, from (0, 0) to (1, 1).
///
/// A point is added after each distinct score; an `actual` above 0.5 counts
/// as positive.
pub fn roc_curve(points: &[PredictedVsActual]) -> Vec<RocPoint> {
    let positives = points.iter().filter(|p| p.actual > 0.5).count();
    let negatives = points.len() - positives;

    let mut curve = vec![RocPoint {
        false_positive_rate: 0.0,
        true_positive_rate: 0.0,
    }];
    if positives == 0 || negatives == 0 {
        curve.push(RocPoint {
            false_positive_rate: 1.0,
            true_positive_rate: 1.0,
        });
        return curve;
    }

    let mut sorted: Vec<&PredictedVsActual> = points.iter().collect();
    sorted.sort_by(|a, b| b.predicted.total_cmp(&a.predicted));

    let (mut tp, mut fp) = (0usize, 0usize);
    for (i, point) in sorted.iter().enumerate() {
        if point.actual > 0.5 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = sorted
            .get(i + 1)
            .is_none_or(|next| next.predicted != point.predicted);
        if last_of_score {
            curve.push(RocPoint {
                false_positive_rate: fp as f64 / negatives as f64,
                true_positive_rate: tp as f64 / positives as f64,
            });
        }
    }
    curve
}

/// Trapezoidal area under a curve ordered by false positive rate.
pub fn area_under_curve(curve: &[RocPoint]) -> f64 {
    curve
        .windows(2)
        .map(|w| {
            let width = w[1].false_positive_rate - w[0].false_positive_rate;
            width * (w[0].true_positive_rate + w[1].true_positive_rate) / 2.0
        })
        .sum()
}

/// Fraction of points whose rounded prediction differs from the label.
pub fn misclassification_rate(points: &[PredictedVsActual]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let wrong = points
        .iter()
        .filter(|p| (p.predicted.round() - p.actual).abs() > f64::EPSILON)
        .count();
    wrong as f64 / points.len() as f64
}

pub fn mean_squared_error(points: &[PredictedVsActual]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points
        .iter()
        .map(|p| (p.predicted - p.actual).powi(2))
        .sum::<f64>()
        / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pva(pairs: &[(f64, f64)]) -> Vec<PredictedVsActual> {
        pairs
            .iter()
            .map(|(p, a)| PredictedVsActual::new(*p, *a))
            .collect()
    }

    #[test]
    fn test_perfect_ranking_has_auc_one() {
        let points = pva(&[(0.9, 1.0), (0.8, 1.0), (0.3, 0.0), (0.1, 0.0)]);
        let curve = roc_curve(&points);
        assert_eq!(curve.first().unwrap().true_positive_rate, 0.0);
        assert_eq!(curve.last().unwrap().false_positive_rate, 1.0);
        assert!((area_under_curve(&curve) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tied_scores_give_diagonal() {
        let points = pva(&[(0.5, 1.0), (0.5, 0.0)]);
        let auc = area_under_curve(&roc_curve(&points));
        assert!((auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_roc() {
        let points = pva(&[(0.5, 1.0), (0.7, 1.0)]);
        assert_eq!(roc_curve(&points).len(), 2);
    }

    #[test]
    fn test_error_metrics() {
        let points = pva(&[(1.0, 1.0), (0.0, 1.0), (2.0, 2.0), (0.9, 1.0)]);
        assert!((misclassification_rate(&points) - 0.25).abs() < 1e-12);

        let points = pva(&[(1.0, 2.0), (3.0, 3.0)]);
        assert!((mean_squared_error(&points) - 0.5).abs() < 1e-12);
        assert_eq!(mean_squared_error(&[]), 0.0);
    }

    #[test]
    fn test_summarize_routes_by_kind_and_class() {
        let eval = || Evaluation::Predictions {
            points: pva(&[(1.0, 2.0), (3.0, 3.0)]),
        };

        let regression = summarize(
            SummaryKind::ClassAndRegression,
            AlgorithmClass::NumericalPrediction,
            eval(),
        )
        .unwrap();
        let ModelSummary::ClassClassificationAndRegression(s) = regression else {
            panic!("wrong variant");
        };
        assert!((s.error - 0.5).abs() < 1e-12);

        let classification = summarize(
            SummaryKind::ClassAndRegression,
            AlgorithmClass::Classification,
            eval(),
        )
        .unwrap();
        let ModelSummary::ClassClassificationAndRegression(s) = classification else {
            panic!("wrong variant");
        };
        assert!((s.error - 0.5).abs() < 1e-12);

        let probabilistic =
            summarize(SummaryKind::Probabilistic, AlgorithmClass::Classification, eval()).unwrap();
        assert_eq!(probabilistic.kind(), "probabilistic_classification");
    }

    #[test]
    fn test_summarize_rejects_mismatched_output() {
        let err = summarize(
            SummaryKind::Cluster,
            AlgorithmClass::Clustering,
            Evaluation::Predictions { points: vec![] },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Backend(BackendError::Protocol(_))));
    }

    #[test]
    fn test_sample_is_capped() {
        let points = vec![PredictedVsActual::new(1.0, 1.0); SUMMARY_SAMPLE_SIZE + 5];
        let summary = summarize(
            SummaryKind::ClassAndRegression,
            AlgorithmClass::Classification,
            Evaluation::Predictions { points },
        )
        .unwrap();
        let ModelSummary::ClassClassificationAndRegression(s) = summary else {
            panic!("wrong variant");
        };
        assert_eq!(s.predicted_vs_actual.len(), SUMMARY_SAMPLE_SIZE);
    }
}
