//! Algorithm dispatch.
//!
//! A registry maps `(algorithm class, algorithm name)` to a [`Trainer`].
//! Trainers parse string hyperparameters into typed [`AlgorithmParams`],
//! hand the prepared data to a backend session and turn the evaluation
//! output into the matching [`ModelSummary`] variant. They never fit
//! anything themselves.

pub mod params;
mod summary;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{AlgorithmClass, HyperParameters, ModelSummary};
use crate::ports::{
    AlgorithmParams, CoreError, FitRequest, TrainedArtifact, TrainingSession, TrainingSet,
};
use params::{ParamReader, keys};

pub use summary::{
    SUMMARY_SAMPLE_SIZE, SummaryKind, area_under_curve, mean_squared_error,
    misclassification_rate, roc_curve, summarize,
};

/// Names of the built-in algorithms.
pub mod names {
    pub const LOGISTIC_REGRESSION: &str = "LOGISTIC_REGRESSION";
    pub const SVM: &str = "SVM";
    pub const DECISION_TREE: &str = "DECISION_TREE";
    pub const NAIVE_BAYES: &str = "NAIVE_BAYES";
    pub const LINEAR_REGRESSION: &str = "LINEAR_REGRESSION";
    pub const RIDGE_REGRESSION: &str = "RIDGE_REGRESSION";
    pub const LASSO_REGRESSION: &str = "LASSO_REGRESSION";
    pub const K_MEANS: &str = "K_MEANS";
}

/// Iterations used when clustering ad-hoc points.
pub const CLUSTER_POINTS_ITERATIONS: u32 = 100;

/// Result of a successful training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub artifact: TrainedArtifact,
    pub summary: ModelSummary,
}

/// Uniform training capability for one algorithm under one class.
#[async_trait]
pub trait Trainer: Send + Sync {
    fn name(&self) -> &str;

    fn class(&self) -> AlgorithmClass;

    /// Defaults applied to keys the analysis leaves unset.
    fn default_hyper_parameters(&self) -> HyperParameters;

    /// Parse hyperparameters; fails with `InvalidHyperParameter`.
    fn parse_params(&self, hyper: &HyperParameters) -> Result<AlgorithmParams, CoreError>;

    /// Fit on `data` within `session` and summarize the evaluation.
    async fn train(
        &self,
        session: &dyn TrainingSession,
        data: TrainingSet,
        params: AlgorithmParams,
    ) -> Result<TrainedModel, CoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend-delegating trainer
// ─────────────────────────────────────────────────────────────────────────────

type ParseFn = fn(&ParamReader<'_>) -> Result<AlgorithmParams, CoreError>;

/// A [`Trainer`] that delegates fitting to the backend session.
#[derive(Clone)]
pub struct BackendTrainer {
    name: &'static str,
    class: AlgorithmClass,
    summary: SummaryKind,
    keys: &'static [&'static str],
    parse: ParseFn,
}

impl BackendTrainer {
    pub const fn new(
        name: &'static str,
        class: AlgorithmClass,
        summary: SummaryKind,
        keys: &'static [&'static str],
        parse: ParseFn,
    ) -> Self {
        Self {
            name,
            class,
            summary,
            keys,
            parse,
        }
    }
}

#[async_trait]
impl Trainer for BackendTrainer {
    fn name(&self) -> &str {
        self.name
    }

    fn class(&self) -> AlgorithmClass {
        self.class
    }

    fn default_hyper_parameters(&self) -> HyperParameters {
        params::defaults_for(self.keys)
    }

    fn parse_params(&self, hyper: &HyperParameters) -> Result<AlgorithmParams, CoreError> {
        (self.parse)(&ParamReader::new(self.name, hyper))
    }

    async fn train(
        &self,
        session: &dyn TrainingSession,
        data: TrainingSet,
        params: AlgorithmParams,
    ) -> Result<TrainedModel, CoreError> {
        let labeled = matches!(data, TrainingSet::Labeled { .. });
        if labeled != self.class.is_supervised() {
            return Err(CoreError::DatasetPreparation(format!(
                "{} expects {} data",
                self.name,
                if self.class.is_supervised() {
                    "labeled"
                } else {
                    "unlabeled"
                }
            )));
        }

        let output = session
            .fit(FitRequest {
                params,
                data,
                clear_threshold: self.summary.clears_threshold(),
            })
            .await?;

        Ok(TrainedModel {
            artifact: output.artifact,
            summary: summarize(self.summary, self.class, output.evaluation)?,
        })
    }
}

const SGD_KEYS: &[&str] = &[
    keys::LEARNING_RATE,
    keys::ITERATIONS,
    keys::REG_TYPE,
    keys::REG_PARAMETER,
    keys::SGD_DATA_FRACTION,
];
const TREE_KEYS: &[&str] = &[
    keys::NUM_CLASSES,
    keys::IMPURITY,
    keys::MAX_DEPTH,
    keys::MAX_BINS,
];
const BAYES_KEYS: &[&str] = &[keys::LAMBDA];
const LINEAR_KEYS: &[&str] = &[
    keys::ITERATIONS,
    keys::LEARNING_RATE,
    keys::SGD_DATA_FRACTION,
];
const REGULARIZED_KEYS: &[&str] = &[
    keys::ITERATIONS,
    keys::LEARNING_RATE,
    keys::REG_PARAMETER,
    keys::SGD_DATA_FRACTION,
];
const KMEANS_KEYS: &[&str] = &[keys::NUM_CLUSTERS, keys::ITERATIONS];

const REG_TYPES: &[&str] = &["L1", "L2"];
const IMPURITIES: &[&str] = &["gini", "entropy", "variance"];

fn logistic_regression(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::LogisticRegression {
        learning_rate: r.positive(keys::LEARNING_RATE)?,
        iterations: r.u32_at_least(keys::ITERATIONS, 1)?,
        reg_type: r.one_of(keys::REG_TYPE, REG_TYPES)?,
        reg_param: r.f64(keys::REG_PARAMETER)?,
        sgd_data_fraction: r.fraction(keys::SGD_DATA_FRACTION)?,
    })
}

fn svm(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::Svm {
        iterations: r.u32_at_least(keys::ITERATIONS, 1)?,
        reg_type: r.one_of(keys::REG_TYPE, REG_TYPES)?,
        reg_param: r.f64(keys::REG_PARAMETER)?,
        learning_rate: r.positive(keys::LEARNING_RATE)?,
        sgd_data_fraction: r.fraction(keys::SGD_DATA_FRACTION)?,
    })
}

fn decision_tree(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::DecisionTree {
        num_classes: r.u32_at_least(keys::NUM_CLASSES, 2)?,
        impurity: r.one_of(keys::IMPURITY, IMPURITIES)?,
        max_depth: r.u32_at_least(keys::MAX_DEPTH, 1)?,
        max_bins: r.u32_at_least(keys::MAX_BINS, 2)?,
    })
}

fn naive_bayes(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::NaiveBayes {
        lambda: r.f64(keys::LAMBDA)?,
    })
}

fn linear_regression(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::LinearRegression {
        iterations: r.u32_at_least(keys::ITERATIONS, 1)?,
        learning_rate: r.positive(keys::LEARNING_RATE)?,
        sgd_data_fraction: r.fraction(keys::SGD_DATA_FRACTION)?,
    })
}

fn ridge_regression(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::RidgeRegression {
        iterations: r.u32_at_least(keys::ITERATIONS, 1)?,
        learning_rate: r.positive(keys::LEARNING_RATE)?,
        reg_param: r.f64(keys::REG_PARAMETER)?,
        sgd_data_fraction: r.fraction(keys::SGD_DATA_FRACTION)?,
    })
}

fn lasso_regression(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::LassoRegression {
        iterations: r.u32_at_least(keys::ITERATIONS, 1)?,
        learning_rate: r.positive(keys::LEARNING_RATE)?,
        reg_param: r.f64(keys::REG_PARAMETER)?,
        sgd_data_fraction: r.fraction(keys::SGD_DATA_FRACTION)?,
    })
}

fn k_means(r: &ParamReader<'_>) -> Result<AlgorithmParams, CoreError> {
    Ok(AlgorithmParams::KMeans {
        num_clusters: r.u32_at_least(keys::NUM_CLUSTERS, 1)?,
        iterations: r.u32_at_least(keys::ITERATIONS, 1)?,
    })
}

type Builtin = (&'static str, SummaryKind, &'static [&'static str], ParseFn);

const SUPERVISED: &[Builtin] = &[
    (
        names::LOGISTIC_REGRESSION,
        SummaryKind::Probabilistic,
        SGD_KEYS,
        logistic_regression,
    ),
    (names::SVM, SummaryKind::Probabilistic, SGD_KEYS, svm),
    (
        names::DECISION_TREE,
        SummaryKind::ClassAndRegression,
        TREE_KEYS,
        decision_tree,
    ),
    (
        names::NAIVE_BAYES,
        SummaryKind::ClassAndRegression,
        BAYES_KEYS,
        naive_bayes,
    ),
    (
        names::LINEAR_REGRESSION,
        SummaryKind::ClassAndRegression,
        LINEAR_KEYS,
        linear_regression,
    ),
    (
        names::RIDGE_REGRESSION,
        SummaryKind::ClassAndRegression,
        REGULARIZED_KEYS,
        ridge_regression,
    ),
    (
        names::LASSO_REGRESSION,
        SummaryKind::ClassAndRegression,
        REGULARIZED_KEYS,
        lasso_regression,
    ),
];

const UNSUPERVISED: &[Builtin] = &[(names::K_MEANS, SummaryKind::Cluster, KMEANS_KEYS, k_means)];

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Trainers keyed by `(class, NAME)`.
#[derive(Clone)]
pub struct AlgorithmRegistry {
    trainers: BTreeMap<(AlgorithmClass, String), Arc<dyn Trainer>>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl AlgorithmRegistry {
    /// A registry with no trainers.
    pub fn empty() -> Self {
        Self {
            trainers: BTreeMap::new(),
        }
    }

    /// Every built-in algorithm. Supervised algorithms are available under
    /// both classification and numerical prediction; K-means under clustering.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for class in [
            AlgorithmClass::Classification,
            AlgorithmClass::NumericalPrediction,
        ] {
            for &(name, summary, key_set, parse) in SUPERVISED {
                registry.register(Arc::new(BackendTrainer::new(
                    name, class, summary, key_set, parse,
                )));
            }
        }
        for &(name, summary, key_set, parse) in UNSUPERVISED {
            registry.register(Arc::new(BackendTrainer::new(
                name,
                AlgorithmClass::Clustering,
                summary,
                key_set,
                parse,
            )));
        }
        registry
    }

    /// Add or replace the trainer for its `(class, name)`.
    pub fn register(&mut self, trainer: Arc<dyn Trainer>) {
        let key = (trainer.class(), trainer.name().to_ascii_uppercase());
        self.trainers.insert(key, trainer);
    }

    /// Resolve a trainer from the class and name stored on an analysis.
    ///
    /// Unknown classes and names fail with `UnsupportedAlgorithm`.
    pub fn resolve(&self, class: &str, name: &str) -> Result<Arc<dyn Trainer>, CoreError> {
        let parsed: AlgorithmClass = class.parse().map_err(|_| {
            CoreError::UnsupportedAlgorithm(format!("unknown algorithm class '{class}'"))
        })?;
        self.trainers
            .get(&(parsed, name.trim().to_ascii_uppercase()))
            .cloned()
            .ok_or_else(|| {
                CoreError::UnsupportedAlgorithm(format!(
                    "no '{name}' algorithm for class {parsed}"
                ))
            })
    }

    /// Defaults for the first trainer registered under `name`, any class.
    pub fn default_hyper_parameters(&self, name: &str) -> Option<HyperParameters> {
        let name = name.trim().to_ascii_uppercase();
        self.trainers
            .iter()
            .find(|((_, n), _)| *n == name)
            .map(|(_, trainer)| trainer.default_hyper_parameters())
    }

    /// Registered algorithm names for `class`, sorted.
    pub fn names(&self, class: AlgorithmClass) -> Vec<&str> {
        self.trainers
            .keys()
            .filter(|(c, _)| *c == class)
            .map(|(_, n)| n.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PredictedVsActual;
    use crate::ports::{BackendError, Evaluation, FitOutput, LabeledPoint};
    use mockall::mock;

    mock! {
        Session {}

        #[async_trait]
        impl TrainingSession for Session {
            fn id(&self) -> &str;
            async fn fit(&self, request: FitRequest) -> Result<FitOutput, BackendError>;
            async fn cluster(
                &self,
                points: &[Vec<f64>],
                num_clusters: u32,
                iterations: u32,
            ) -> Result<Vec<u32>, BackendError>;
            async fn close(&mut self) -> Result<(), BackendError>;
            fn stop(&mut self);
        }
    }

    fn labeled() -> TrainingSet {
        let point = |label: f64, x: f64| LabeledPoint {
            label,
            features: vec![x],
        };
        TrainingSet::Labeled {
            train: vec![point(0.0, 1.0), point(1.0, 5.0)],
            test: vec![point(1.0, 4.0)],
        }
    }

    fn artifact() -> TrainedArtifact {
        TrainedArtifact {
            format: "test".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_registry_resolves_builtins() {
        let registry = AlgorithmRegistry::with_builtins();

        let trainer = registry.resolve("Classification", "naive_bayes").unwrap();
        assert_eq!(trainer.name(), names::NAIVE_BAYES);
        assert_eq!(trainer.class(), AlgorithmClass::Classification);

        let trainer = registry.resolve("Numerical_Prediction", "LASSO_REGRESSION").unwrap();
        assert_eq!(trainer.class(), AlgorithmClass::NumericalPrediction);

        assert!(registry.resolve("Clustering", names::K_MEANS).is_ok());
        assert_eq!(registry.names(AlgorithmClass::Classification).len(), 7);
    }

    #[test]
    fn test_registry_rejects_unknown() {
        let registry = AlgorithmRegistry::with_builtins();
        for (class, name) in [
            ("Classification", "RANDOM_FOREST"),
            ("Clustering", names::NAIVE_BAYES),
            ("Anomaly_Detection", names::K_MEANS),
            ("Regression", names::SVM),
        ] {
            assert!(matches!(
                registry.resolve(class, name),
                Err(CoreError::UnsupportedAlgorithm(_))
            ));
        }
    }

    #[test]
    fn test_default_hyper_parameters() {
        let registry = AlgorithmRegistry::with_builtins();
        let defaults = registry.default_hyper_parameters("DECISION_TREE").unwrap();
        assert_eq!(defaults[keys::IMPURITY], "gini");
        assert_eq!(defaults[keys::MAX_DEPTH], "5");
        assert!(registry.default_hyper_parameters("ALS").is_none());
    }

    #[test]
    fn test_parse_params_uses_defaults() {
        let registry = AlgorithmRegistry::with_builtins();
        let trainer = registry.resolve("Classification", names::SVM).unwrap();
        let params = trainer.parse_params(&HyperParameters::new()).unwrap();
        assert_eq!(
            params,
            AlgorithmParams::Svm {
                iterations: 100,
                reg_type: "L2".to_string(),
                reg_param: 0.001,
                learning_rate: 0.1,
                sgd_data_fraction: 1.0,
            }
        );
    }

    #[test]
    fn test_invalid_hyper_parameter() {
        let registry = AlgorithmRegistry::with_builtins();
        let trainer = registry.resolve("Classification", names::DECISION_TREE).unwrap();
        let hyper = HyperParameters::from([(keys::IMPURITY.to_string(), "purity".to_string())]);
        assert!(matches!(
            trainer.parse_params(&hyper),
            Err(CoreError::InvalidHyperParameter { ref key, .. }) if key == keys::IMPURITY
        ));
    }

    #[tokio::test]
    async fn test_probabilistic_trainer_clears_threshold() {
        let mut session = MockSession::new();
        session
            .expect_fit()
            .withf(|request| request.clear_threshold)
            .times(1)
            .returning(|_| {
                Ok(FitOutput {
                    artifact: artifact(),
                    evaluation: Evaluation::Predictions {
                        points: vec![PredictedVsActual::new(0.8, 1.0)],
                    },
                })
            });

        let trainer = AlgorithmRegistry::with_builtins()
            .resolve("Classification", names::LOGISTIC_REGRESSION)
            .unwrap();
        let params = trainer.parse_params(&HyperParameters::new()).unwrap();
        let trained = trainer.train(&session, labeled(), params).await.unwrap();

        assert_eq!(trained.artifact, artifact());
        assert_eq!(trained.summary.kind(), "probabilistic_classification");
    }

    #[tokio::test]
    async fn test_regression_trainer_reports_mse() {
        let mut session = MockSession::new();
        session
            .expect_fit()
            .withf(|request| !request.clear_threshold)
            .times(1)
            .returning(|_| {
                Ok(FitOutput {
                    artifact: artifact(),
                    evaluation: Evaluation::Predictions {
                        points: vec![PredictedVsActual::new(3.0, 4.0)],
                    },
                })
            });

        let trainer = AlgorithmRegistry::with_builtins()
            .resolve("Numerical_Prediction", names::LINEAR_REGRESSION)
            .unwrap();
        let params = trainer.parse_params(&HyperParameters::new()).unwrap();
        let trained = trainer.train(&session, labeled(), params).await.unwrap();

        let ModelSummary::ClassClassificationAndRegression(summary) = trained.summary else {
            panic!("wrong summary variant");
        };
        assert!((summary.error - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_shape_mismatch_never_calls_backend() {
        let mut session = MockSession::new();
        session.expect_fit().never();

        let trainer = AlgorithmRegistry::with_builtins()
            .resolve("Clustering", names::K_MEANS)
            .unwrap();
        let params = trainer.parse_params(&HyperParameters::new()).unwrap();
        let err = trainer.train(&session, labeled(), params).await.unwrap_err();
        assert!(matches!(err, CoreError::DatasetPreparation(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let mut session = MockSession::new();
        session
            .expect_fit()
            .returning(|_| Err(BackendError::Training("diverged".to_string())));

        let trainer = AlgorithmRegistry::with_builtins()
            .resolve("Classification", names::NAIVE_BAYES)
            .unwrap();
        let params = trainer.parse_params(&HyperParameters::new()).unwrap();
        let err = trainer.train(&session, labeled(), params).await.unwrap_err();
        assert!(matches!(err, CoreError::Backend(BackendError::Training(_))));
    }
}
