//! Frozen workflow facts.

use serde::{Deserialize, Serialize};

use super::{Feature, HyperParameters};

/// Immutable snapshot of an analysis, captured when a build is submitted.
///
/// The build job owns its copy, so edits to the analysis while a build is in
/// flight never reach the running job. Algorithm name and class are kept as
/// stored; resolving them is the dispatcher's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub analysis_id: i64,
    pub algorithm_name: String,
    pub algorithm_class: String,
    pub response_variable: Option<String>,
    /// Fraction of valid rows sampled into the training set, in (0, 1].
    pub train_data_fraction: f64,
    /// Included features in declaration order.
    pub features: Vec<Feature>,
    pub hyper_parameters: HyperParameters,
}

impl Workflow {
    /// Included features, skipping the response column when it was selected.
    pub fn input_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(move |f| {
            f.include && self.response_variable.as_deref() != Some(f.name.as_str())
        })
    }
}
