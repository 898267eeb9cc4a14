//! Hyperparameter keys, defaults and typed parsing.

use crate::domain::HyperParameters;
use crate::ports::CoreError;

pub mod keys {
    pub const LEARNING_RATE: &str = "Learning_Rate";
    pub const ITERATIONS: &str = "Iterations";
    pub const REG_TYPE: &str = "Reg_Type";
    pub const REG_PARAMETER: &str = "Reg_Parameter";
    pub const SGD_DATA_FRACTION: &str = "SGD_Data_Fraction";
    pub const NUM_CLASSES: &str = "Num_Classes";
    pub const IMPURITY: &str = "Impurity";
    pub const MAX_DEPTH: &str = "Max_Depth";
    pub const MAX_BINS: &str = "Max_Bins";
    pub const LAMBDA: &str = "Lambda";
    pub const NUM_CLUSTERS: &str = "Num_Clusters";
}

/// Default value for a hyperparameter key.
pub fn default_value(key: &str) -> Option<&'static str> {
    Some(match key {
        keys::LEARNING_RATE => "0.1",
        keys::ITERATIONS => "100",
        keys::REG_TYPE => "L2",
        keys::REG_PARAMETER => "0.001",
        keys::SGD_DATA_FRACTION => "1.0",
        keys::NUM_CLASSES => "2",
        keys::IMPURITY => "gini",
        keys::MAX_DEPTH => "5",
        keys::MAX_BINS => "100",
        keys::LAMBDA => "1.0",
        keys::NUM_CLUSTERS => "3",
        _ => return None,
    })
}

/// Defaults for every key in `keys`.
pub fn defaults_for(keys: &[&str]) -> HyperParameters {
    keys.iter()
        .filter_map(|key| default_value(key).map(|v| ((*key).to_string(), v.to_string())))
        .collect()
}

/// Typed access to an analysis' hyperparameters, with defaults filled in.
///
/// Every getter fails with [`CoreError::InvalidHyperParameter`] naming the
/// algorithm, the key and the offending value.
pub struct ParamReader<'a> {
    algorithm: &'a str,
    supplied: &'a HyperParameters,
}

impl<'a> ParamReader<'a> {
    pub const fn new(algorithm: &'a str, supplied: &'a HyperParameters) -> Self {
        Self {
            algorithm,
            supplied,
        }
    }

    fn raw(&self, key: &str) -> Result<&str, CoreError> {
        self.supplied
            .get(key)
            .map(|v| v.trim())
            .or_else(|| default_value(key))
            .ok_or_else(|| self.invalid(key, "", "no value and no default"))
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> CoreError {
        CoreError::InvalidHyperParameter {
            algorithm: self.algorithm.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn f64(&self, key: &str) -> Result<f64, CoreError> {
        let raw = self.raw(key)?;
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(self.invalid(key, raw, "expected a number")),
        }
    }

    /// A number that must be strictly positive.
    pub fn positive(&self, key: &str) -> Result<f64, CoreError> {
        let value = self.f64(key)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(self.invalid(key, self.raw(key)?, "must be greater than 0"))
        }
    }

    /// A number in `(0, 1]`.
    pub fn fraction(&self, key: &str) -> Result<f64, CoreError> {
        let value = self.f64(key)?;
        if value > 0.0 && value <= 1.0 {
            Ok(value)
        } else {
            Err(self.invalid(key, self.raw(key)?, "must be in (0, 1]"))
        }
    }

    pub fn u32(&self, key: &str) -> Result<u32, CoreError> {
        let raw = self.raw(key)?;
        raw.parse::<u32>()
            .map_err(|_| self.invalid(key, raw, "expected a non-negative integer"))
    }

    /// An integer of at least `min`.
    pub fn u32_at_least(&self, key: &str, min: u32) -> Result<u32, CoreError> {
        let value = self.u32(key)?;
        if value >= min {
            Ok(value)
        } else {
            Err(self.invalid(key, self.raw(key)?, &format!("must be at least {min}")))
        }
    }

    /// One of `allowed`, compared case-insensitively and returned as listed.
    pub fn one_of(&self, key: &str, allowed: &[&'static str]) -> Result<String, CoreError> {
        let raw = self.raw(key)?;
        allowed
            .iter()
            .find(|a| a.eq_ignore_ascii_case(raw))
            .map(|a| (*a).to_string())
            .ok_or_else(|| self.invalid(key, raw, &format!("expected one of {allowed:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let supplied = HyperParameters::new();
        let reader = ParamReader::new("SVM", &supplied);
        assert_eq!(reader.u32(keys::ITERATIONS).unwrap(), 100);
        assert_eq!(reader.one_of(keys::REG_TYPE, &["L1", "L2"]).unwrap(), "L2");
    }

    #[test]
    fn test_supplied_value_wins() {
        let supplied = HyperParameters::from([(keys::LEARNING_RATE.to_string(), " 0.5".to_string())]);
        let reader = ParamReader::new("SVM", &supplied);
        assert_eq!(reader.positive(keys::LEARNING_RATE).unwrap(), 0.5);
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let supplied = HyperParameters::from([
            (keys::ITERATIONS.to_string(), "ten".to_string()),
            (keys::SGD_DATA_FRACTION.to_string(), "1.5".to_string()),
        ]);
        let reader = ParamReader::new("LINEAR_REGRESSION", &supplied);

        match reader.u32(keys::ITERATIONS).unwrap_err() {
            CoreError::InvalidHyperParameter {
                algorithm,
                key,
                value,
                ..
            } => {
                assert_eq!(algorithm, "LINEAR_REGRESSION");
                assert_eq!(key, keys::ITERATIONS);
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(reader.fraction(keys::SGD_DATA_FRACTION).is_err());
    }

    #[test]
    fn test_unknown_key_without_default() {
        let supplied = HyperParameters::new();
        let reader = ParamReader::new("X", &supplied);
        assert!(reader.f64("Momentum").is_err());
    }

    #[test]
    fn test_defaults_for() {
        let defaults = defaults_for(&[keys::LAMBDA, keys::NUM_CLUSTERS]);
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[keys::LAMBDA], "1.0");
    }
}
