//! Feature preparation.
//!
//! Turns raw delimited rows of a dataset version into fixed-width numeric
//! vectors (optionally labeled) and splits them into train and test sets.
//!
//! # Structure
//!
//! - `encoder` - Missing-value tokens and the token-to-number encoder seam
//! - `split` - Seeded Bernoulli train/test partitioning
//! - `defaults` - Default feature customizations from a dataset sample

mod defaults;
mod encoder;
mod split;

use std::collections::BTreeMap;

use crate::domain::{Feature, ImputeOption, Workflow};
use crate::ports::{CoreError, LabeledPoint, TrainingSet};

pub use defaults::default_features;
pub use encoder::{FeatureEncoder, MISSING_TOKENS, NumericEncoder, is_missing};
pub use split::{RANDOM_SEED, SplitMix64, bernoulli_split};

/// Column mapping resolved against a dataset header.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePlan {
    /// Input features in declaration order.
    pub inputs: Vec<Feature>,
    /// Column index of the response variable for supervised analyses.
    pub response_index: Option<usize>,
    /// The response column as a feature, so labels go through the same
    /// encoder as inputs.
    pub response: Option<Feature>,
    /// Number of columns in the header.
    pub width: usize,
}

impl FeaturePlan {
    /// Resolve `workflow` against `header`.
    ///
    /// Feature columns come from each feature's stored index; the response
    /// column is looked up by name and takes its type from the matching
    /// feature customization (numerical if there is none). Unsupervised
    /// plans carry no response.
    pub fn new(
        workflow: &Workflow,
        header: &str,
        separator: char,
        supervised: bool,
    ) -> Result<Self, CoreError> {
        let columns: Vec<&str> = header.split(separator).map(str::trim).collect();
        let width = columns.len();

        let inputs: Vec<Feature> = workflow.input_features().cloned().collect();
        if inputs.is_empty() {
            return Err(CoreError::DatasetPreparation(
                "analysis has no included features".to_string(),
            ));
        }
        if let Some(feature) = inputs.iter().find(|f| f.index >= width) {
            return Err(CoreError::DatasetPreparation(format!(
                "feature '{}' refers to column {} but the header has {width} columns",
                feature.name, feature.index
            )));
        }
        for feature in inputs
            .iter()
            .filter(|f| f.impute_option == ImputeOption::RegressionImputation)
        {
            tracing::warn!(
                feature = %feature.name,
                "Regression imputation is not supported; missing values will be discarded"
            );
        }

        let response = if supervised {
            let response = workflow.response_variable.as_deref().ok_or_else(|| {
                CoreError::DatasetPreparation(
                    "supervised analysis has no response variable".to_string(),
                )
            })?;
            let index = columns
                .iter()
                .position(|c| *c == response)
                .ok_or_else(|| {
                    CoreError::DatasetPreparation(format!(
                        "response variable '{response}' is not in the dataset header"
                    ))
                })?;
            let feature = workflow
                .features
                .iter()
                .find(|f| f.name == response)
                .map_or_else(
                    || Feature::numerical(response, index),
                    |f| Feature {
                        index,
                        ..f.clone()
                    },
                );
            Some(feature)
        } else {
            None
        };

        Ok(Self {
            inputs,
            response_index: response.as_ref().map(|f| f.index),
            response,
            width,
        })
    }

    fn min_columns(&self) -> usize {
        self.inputs
            .iter()
            .map(|f| f.index)
            .chain(self.response_index)
            .max()
            .map_or(0, |max| max + 1)
    }
}

/// One valid row after encoding and imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    pub label: Option<f64>,
    pub features: Vec<f64>,
}

/// Output of [`prepare`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    pub rows: Vec<PreparedRow>,
    /// Column means used for `REPLACE_WITH_MEAN` features, by feature name.
    pub means: BTreeMap<String, f64>,
    /// Rows dropped for missing values.
    pub discarded: usize,
    supervised: bool,
}

impl PreparedData {
    /// Split into disjoint train and test sets, sampling each row into
    /// the training set with probability `fraction`.
    pub fn split(self, fraction: f64) -> TrainingSet {
        let (train, test) = bernoulli_split(self.rows, fraction, RANDOM_SEED);
        if self.supervised {
            let label = |rows: Vec<PreparedRow>| -> Vec<LabeledPoint> {
                rows.into_iter()
                    .map(|r| LabeledPoint {
                        label: r.label.unwrap_or_default(),
                        features: r.features,
                    })
                    .collect()
            };
            TrainingSet::Labeled {
                train: label(train),
                test: label(test),
            }
        } else {
            let unlabel = |rows: Vec<PreparedRow>| -> Vec<Vec<f64>> {
                rows.into_iter().map(|r| r.features).collect()
            };
            TrainingSet::Unlabeled {
                train: unlabel(train),
                test: unlabel(test),
            }
        }
    }
}

/// Convert data lines (header already removed) into numeric rows.
///
/// Blank lines are skipped. A row missing a value in an included column is
/// discarded or filled with the column mean per the feature's impute option;
/// a row missing its label is discarded. Short rows and unparsable values
/// fail with [`CoreError::DatasetPreparation`].
pub fn prepare<'a>(
    plan: &FeaturePlan,
    lines: impl IntoIterator<Item = &'a str>,
    separator: char,
    encoder: &dyn FeatureEncoder,
) -> Result<PreparedData, CoreError> {
    let min_columns = plan.min_columns();
    let mut tokenized = Vec::new();
    // Header is line 1.
    for (offset, line) in lines.into_iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = offset + 2;
        let tokens: Vec<&str> = line.split(separator).collect();
        if tokens.len() < min_columns {
            return Err(CoreError::DatasetPreparation(format!(
                "line {line_no} has {} columns, expected at least {min_columns}",
                tokens.len()
            )));
        }
        tokenized.push((line_no, tokens));
    }

    let means = column_means(plan, &tokenized, encoder)?;

    let mut rows = Vec::with_capacity(tokenized.len());
    let mut discarded = 0;
    'rows: for (line_no, tokens) in &tokenized {
        let label = match &plan.response {
            Some(response) if is_missing(tokens[response.index]) => {
                discarded += 1;
                continue;
            }
            Some(response) => Some(
                encoder
                    .encode(response, tokens[response.index])
                    .map_err(|e| CoreError::DatasetPreparation(format!("line {line_no}: label {e}")))?,
            ),
            None => None,
        };

        let mut features = Vec::with_capacity(plan.inputs.len());
        for feature in &plan.inputs {
            let token = tokens[feature.index];
            if is_missing(token) {
                match feature.impute_option {
                    ImputeOption::ReplaceWithMean => {
                        let mean = means.get(&feature.name).ok_or_else(|| {
                            CoreError::DatasetPreparation(format!(
                                "column '{}' has no values to compute a mean from",
                                feature.name
                            ))
                        })?;
                        features.push(*mean);
                    }
                    ImputeOption::Discard | ImputeOption::RegressionImputation => {
                        discarded += 1;
                        continue 'rows;
                    }
                }
            } else {
                let value = encoder
                    .encode(feature, token)
                    .map_err(|e| CoreError::DatasetPreparation(format!("line {line_no}: {e}")))?;
                features.push(value);
            }
        }

        rows.push(PreparedRow { label, features });
    }

    Ok(PreparedData {
        rows,
        means,
        discarded,
        supervised: plan.response_index.is_some(),
    })
}

fn column_means(
    plan: &FeaturePlan,
    rows: &[(usize, Vec<&str>)],
    encoder: &dyn FeatureEncoder,
) -> Result<BTreeMap<String, f64>, CoreError> {
    let mut means = BTreeMap::new();
    for feature in plan
        .inputs
        .iter()
        .filter(|f| f.impute_option == ImputeOption::ReplaceWithMean)
    {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (line_no, tokens) in rows {
            let token = tokens[feature.index];
            if is_missing(token) {
                continue;
            }
            sum += encoder
                .encode(feature, token)
                .map_err(|e| CoreError::DatasetPreparation(format!("line {line_no}: {e}")))?;
            count += 1;
        }
        if count > 0 {
            means.insert(feature.name.clone(), sum / count as f64);
        }
    }
    Ok(means)
}

/// Decode one prediction row, given as one token per input feature in
/// training order.
pub fn decode_row(
    tokens: &[String],
    features: &[Feature],
    means: &BTreeMap<String, f64>,
    encoder: &dyn FeatureEncoder,
) -> Result<Vec<f64>, CoreError> {
    if tokens.len() != features.len() {
        return Err(CoreError::InvalidInput(format!(
            "expected {} values per row, got {}",
            features.len(),
            tokens.len()
        )));
    }

    tokens
        .iter()
        .zip(features)
        .map(|(token, feature)| {
            if is_missing(token) {
                return match feature.impute_option {
                    ImputeOption::ReplaceWithMean => {
                        means.get(&feature.name).copied().ok_or_else(|| {
                            CoreError::InvalidInput(format!(
                                "missing value for '{}' and no mean was recorded",
                                feature.name
                            ))
                        })
                    }
                    _ => Err(CoreError::InvalidInput(format!(
                        "missing value for '{}'",
                        feature.name
                    ))),
                };
            }
            encoder
                .encode(feature, token)
                .map_err(CoreError::InvalidInput)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureType, HyperParameters};

    fn workflow(features: Vec<Feature>, response: Option<&str>) -> Workflow {
        Workflow {
            analysis_id: 1,
            algorithm_name: "NAIVE_BAYES".to_string(),
            algorithm_class: "Classification".to_string(),
            response_variable: response.map(str::to_string),
            train_data_fraction: 0.7,
            features,
            hyper_parameters: HyperParameters::new(),
        }
    }

    #[test]
    fn test_plan_resolves_response_by_name() {
        let wf = workflow(
            vec![Feature::numerical("a", 0), Feature::numerical("b", 2)],
            Some("Class"),
        );
        let plan = FeaturePlan::new(&wf, "a, Class ,b", ',', true).unwrap();
        assert_eq!(plan.response_index, Some(1));
        assert_eq!(plan.width, 3);
        assert_eq!(plan.min_columns(), 3);
    }

    #[test]
    fn test_plan_rejects_unknown_response() {
        let wf = workflow(vec![Feature::numerical("a", 0)], Some("label"));
        let err = FeaturePlan::new(&wf, "a,b", ',', true).unwrap_err();
        assert!(matches!(err, CoreError::DatasetPreparation(_)));
    }

    #[test]
    fn test_unsupervised_plan_ignores_response() {
        let wf = workflow(vec![Feature::numerical("a", 0)], None);
        let plan = FeaturePlan::new(&wf, "a,b", ',', false).unwrap();
        assert_eq!(plan.response_index, None);
    }

    #[test]
    fn test_prepare_discards_and_imputes() {
        let wf = workflow(
            vec![
                Feature::numerical("x", 0),
                Feature::numerical("y", 1).with_impute(ImputeOption::ReplaceWithMean),
            ],
            Some("label"),
        );
        let plan = FeaturePlan::new(&wf, "x,y,label", ',', true).unwrap();
        let lines = ["1,2,0", "NA,4,1", "3,,1", "", "5,6,", "7,8,0"];

        let prepared = prepare(&plan, lines, ',', &NumericEncoder).unwrap();

        // "NA,4,1" drops on x, "5,6," drops on the label.
        assert_eq!(prepared.discarded, 2);
        assert_eq!(prepared.rows.len(), 3);
        // Mean of y over 2, 4, 6, 8.
        assert_eq!(prepared.means.get("y"), Some(&5.0));
        assert_eq!(prepared.rows[1].features, vec![3.0, 5.0]);
        assert_eq!(prepared.rows[2].label, Some(0.0));
    }

    #[test]
    fn test_label_goes_through_encoder() {
        struct YesNo;
        impl FeatureEncoder for YesNo {
            fn encode(&self, feature: &Feature, token: &str) -> Result<f64, String> {
                match (feature.feature_type, token.trim()) {
                    (FeatureType::Categorical, "yes") => Ok(1.0),
                    (FeatureType::Categorical, "no") => Ok(0.0),
                    _ => NumericEncoder.encode(feature, token),
                }
            }
        }

        let mut answer = Feature::numerical("answer", 1);
        answer.feature_type = FeatureType::Categorical;
        let wf = workflow(vec![Feature::numerical("age", 0), answer], Some("answer"));
        let plan = FeaturePlan::new(&wf, "age,answer", ',', true).unwrap();

        let prepared = prepare(&plan, ["31,yes", "40,no"], ',', &YesNo).unwrap();
        let labels: Vec<Option<f64>> = prepared.rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec![Some(1.0), Some(0.0)]);

        let err = prepare(&plan, ["31,maybe"], ',', &YesNo).unwrap_err();
        assert!(matches!(err, CoreError::DatasetPreparation(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_prepare_short_row_fails() {
        let wf = workflow(vec![Feature::numerical("x", 2)], None);
        let plan = FeaturePlan::new(&wf, "a,b,x", ',', false).unwrap();
        let err = prepare(&plan, ["1,2,3", "4,5"], ',', &NumericEncoder).unwrap_err();
        assert!(matches!(err, CoreError::DatasetPreparation(ref m) if m.contains("line 3")));
    }

    #[test]
    fn test_prepare_non_numeric_fails() {
        let wf = workflow(vec![Feature::numerical("x", 0)], None);
        let plan = FeaturePlan::new(&wf, "x", ',', false).unwrap();
        let err = prepare(&plan, ["1", "two"], ',', &NumericEncoder).unwrap_err();
        assert!(matches!(err, CoreError::DatasetPreparation(_)));
    }

    #[test]
    fn test_split_preserves_all_valid_rows() {
        let wf = workflow(vec![Feature::numerical("x", 0)], Some("y"));
        let plan = FeaturePlan::new(&wf, "x\ty", '\t', true).unwrap();
        let lines: Vec<String> = (0..200).map(|i| format!("{i}\t{}", i % 2)).collect();

        let prepared = prepare(&plan, lines.iter().map(String::as_str), '\t', &NumericEncoder)
            .unwrap();
        let valid = prepared.rows.len();
        let set = prepared.split(0.7);

        assert_eq!(set.train_len() + set.test_len(), valid);
        let TrainingSet::Labeled { train, test } = set else {
            panic!("expected labeled set");
        };
        assert!(train.iter().all(|p| !test.contains(p)));
    }

    #[test]
    fn test_decode_row() {
        let features = vec![
            Feature::numerical("a", 0),
            Feature::numerical("b", 3).with_impute(ImputeOption::ReplaceWithMean),
        ];
        let means = BTreeMap::from([("b".to_string(), 4.5)]);
        let row = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

        assert_eq!(
            decode_row(&row(&["1", "NA"]), &features, &means, &NumericEncoder).unwrap(),
            vec![1.0, 4.5]
        );
        assert!(matches!(
            decode_row(&row(&["1"]), &features, &means, &NumericEncoder),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            decode_row(&row(&["x", "2"]), &features, &means, &NumericEncoder),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            decode_row(&row(&["", "2"]), &features, &means, &NumericEncoder),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
