//! Token-to-number encoding for feature columns.

use crate::domain::{Feature, FeatureType};

/// Tokens treated as a missing value (after trimming).
pub const MISSING_TOKENS: &[&str] = &["", "NA"];

pub fn is_missing(token: &str) -> bool {
    MISSING_TOKENS.contains(&token.trim())
}

/// Turns one non-missing token of a feature column into a number.
///
/// Implementations must be deterministic: the same token of the same feature
/// always maps to the same value, at training time and at prediction time.
pub trait FeatureEncoder: Send + Sync {
    fn encode(&self, feature: &Feature, token: &str) -> Result<f64, String>;
}

/// Parses every column as a floating-point number.
///
/// Categorical columns are expected to be pre-encoded as numeric codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericEncoder;

impl FeatureEncoder for NumericEncoder {
    fn encode(&self, feature: &Feature, token: &str) -> Result<f64, String> {
        let token = token.trim();
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(match feature.feature_type {
                FeatureType::Numerical => {
                    format!("'{token}' is not a number in column '{}'", feature.name)
                }
                FeatureType::Categorical => format!(
                    "'{token}' is not a numeric category code in column '{}'",
                    feature.name
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokens() {
        assert!(is_missing(""));
        assert!(is_missing("  NA "));
        assert!(!is_missing("na"));
        assert!(!is_missing("0"));
    }

    #[test]
    fn test_numeric_encoder() {
        let feature = Feature::numerical("x", 0);
        assert_eq!(NumericEncoder.encode(&feature, " 2.5 "), Ok(2.5));
        assert!(NumericEncoder.encode(&feature, "abc").is_err());
        assert!(NumericEncoder.encode(&feature, "NaN").is_err());
    }
}
