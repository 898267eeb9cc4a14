//! Default feature customizations inferred from a dataset sample.

use super::encoder::is_missing;
use crate::domain::{Feature, FeatureType, ImputeOption, SamplePoints};

/// One included feature per header column.
///
/// A column is NUMERICAL when every non-missing sampled token parses as a
/// number, otherwise CATEGORICAL. Every feature discards missing values.
pub fn default_features(sample: &SamplePoints) -> Vec<Feature> {
    sample
        .header()
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let numeric = sample
                .rows
                .iter()
                .filter_map(|row| row.get(index))
                .filter(|token| !is_missing(token))
                .all(|token| token.trim().parse::<f64>().is_ok());
            Feature {
                name: name.to_string(),
                index,
                feature_type: if numeric {
                    FeatureType::Numerical
                } else {
                    FeatureType::Categorical
                },
                impute_option: ImputeOption::Discard,
                include: true,
            }
        })
        .collect()
}
