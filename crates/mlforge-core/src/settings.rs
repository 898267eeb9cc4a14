//! Settings domain types and validation.
//!
//! Pure domain types with no infrastructure dependencies. Persisted as a
//! single JSON document by the settings repository.

use serde::{Deserialize, Serialize};

/// Storage type used when a model has no explicit storage target.
pub const DEFAULT_STORAGE_TYPE: &str = "file";

/// Maximum number of build jobs running at once.
pub const DEFAULT_MAX_CONCURRENT_BUILDS: u32 = 4;

/// Namenode authority used for `hdfs:///path` URIs without one.
pub const DEFAULT_HDFS_AUTHORITY: &str = "localhost:9000";

/// Port of the WebHDFS REST gateway on the namenode host.
pub const DEFAULT_WEBHDFS_PORT: u16 = 9870;

/// Base URL of the training engine.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8090";

/// Application settings structure.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Storage type for artifacts of models without a storage target.
    pub default_storage_type: Option<String>,

    /// Root location for artifacts; the data directory's `models/` when unset.
    pub default_storage_location: Option<String>,

    /// Upper bound on concurrently running build jobs (1-64).
    pub max_concurrent_builds: Option<u32>,

    /// Abort a fit that runs longer than this many seconds.
    pub training_timeout_secs: Option<u64>,

    pub hdfs_default_authority: Option<String>,

    pub webhdfs_port: Option<u16>,

    /// Training engine base URL.
    pub engine_url: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            default_storage_type: Some(DEFAULT_STORAGE_TYPE.to_string()),
            default_storage_location: None,
            max_concurrent_builds: Some(DEFAULT_MAX_CONCURRENT_BUILDS),
            training_timeout_secs: None,
            hdfs_default_authority: Some(DEFAULT_HDFS_AUTHORITY.to_string()),
            webhdfs_port: Some(DEFAULT_WEBHDFS_PORT),
            engine_url: Some(DEFAULT_ENGINE_URL.to_string()),
        }
    }

    #[must_use]
    pub fn effective_storage_type(&self) -> &str {
        self.default_storage_type
            .as_deref()
            .unwrap_or(DEFAULT_STORAGE_TYPE)
    }

    #[must_use]
    pub fn effective_max_concurrent_builds(&self) -> usize {
        self.max_concurrent_builds
            .unwrap_or(DEFAULT_MAX_CONCURRENT_BUILDS) as usize
    }

    #[must_use]
    pub fn effective_hdfs_authority(&self) -> &str {
        self.hdfs_default_authority
            .as_deref()
            .unwrap_or(DEFAULT_HDFS_AUTHORITY)
    }

    #[must_use]
    pub const fn effective_webhdfs_port(&self) -> u16 {
        match self.webhdfs_port {
            Some(port) => port,
            None => DEFAULT_WEBHDFS_PORT,
        }
    }

    #[must_use]
    pub fn effective_engine_url(&self) -> &str {
        self.engine_url.as_deref().unwrap_or(DEFAULT_ENGINE_URL)
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref storage_type) = other.default_storage_type {
            self.default_storage_type.clone_from(storage_type);
        }
        if let Some(ref location) = other.default_storage_location {
            self.default_storage_location.clone_from(location);
        }
        if let Some(ref builds) = other.max_concurrent_builds {
            self.max_concurrent_builds = *builds;
        }
        if let Some(ref timeout) = other.training_timeout_secs {
            self.training_timeout_secs = *timeout;
        }
        if let Some(ref authority) = other.hdfs_default_authority {
            self.hdfs_default_authority.clone_from(authority);
        }
        if let Some(ref port) = other.webhdfs_port {
            self.webhdfs_port = *port;
        }
        if let Some(ref url) = other.engine_url {
            self.engine_url.clone_from(url);
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = set field to None/null
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub default_storage_type: Option<Option<String>>,
    pub default_storage_location: Option<Option<String>>,
    pub max_concurrent_builds: Option<Option<u32>>,
    pub training_timeout_secs: Option<Option<u64>>,
    pub hdfs_default_authority: Option<Option<String>>,
    pub webhdfs_port: Option<Option<u16>>,
    pub engine_url: Option<Option<String>>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Max concurrent builds must be between 1 and 64, got {0}")]
    InvalidConcurrency(u32),

    #[error("Training timeout must be at least 1 second")]
    InvalidTimeout,

    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),

    #[error("Engine URL must start with http:// or https://, got '{0}'")]
    InvalidEngineUrl(String),

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(builds) = settings.max_concurrent_builds {
        if !(1..=64).contains(&builds) {
            return Err(SettingsError::InvalidConcurrency(builds));
        }
    }

    if settings.training_timeout_secs == Some(0) {
        return Err(SettingsError::InvalidTimeout);
    }

    let non_empty = [
        ("Default storage type", &settings.default_storage_type),
        ("Default storage location", &settings.default_storage_location),
        ("HDFS authority", &settings.hdfs_default_authority),
    ];
    for (name, value) in non_empty {
        if value.as_ref().is_some_and(|v| v.trim().is_empty()) {
            return Err(SettingsError::EmptyValue(name));
        }
    }

    if let Some(url) = &settings.engine_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidEngineUrl(url.clone()));
        }
    }

    Ok(())
}

impl SettingsUpdate {
    /// Build a single-field update from a `key=value` pair as typed on the
    /// command line. An empty value clears the field.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, SettingsError> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<Option<T>, SettingsError> {
            if value.is_empty() {
                return Ok(None);
            }
            value
                .parse()
                .map(Some)
                .map_err(|_| SettingsError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                })
        }
        let text = || (!value.is_empty()).then(|| value.to_string());

        let mut update = Self::default();
        match key {
            "default_storage_type" => update.default_storage_type = Some(text()),
            "default_storage_location" => update.default_storage_location = Some(text()),
            "max_concurrent_builds" => update.max_concurrent_builds = Some(parse(key, value)?),
            "training_timeout_secs" => update.training_timeout_secs = Some(parse(key, value)?),
            "hdfs_default_authority" => update.hdfs_default_authority = Some(text()),
            "webhdfs_port" => update.webhdfs_port = Some(parse(key, value)?),
            "engine_url" => update.engine_url = Some(text()),
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.default_storage_type.as_deref(), Some("file"));
        assert_eq!(settings.default_storage_location, None);
        assert_eq!(settings.max_concurrent_builds, Some(4));
        assert_eq!(settings.training_timeout_secs, None);
        assert_eq!(settings.webhdfs_port, Some(DEFAULT_WEBHDFS_PORT));
    }

    #[test]
    fn test_validate_settings_valid() {
        assert!(validate_settings(&Settings::with_defaults()).is_ok());
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        for builds in [0, 65] {
            let settings = Settings {
                max_concurrent_builds: Some(builds),
                ..Default::default()
            };
            assert!(matches!(
                validate_settings(&settings),
                Err(SettingsError::InvalidConcurrency(b)) if b == builds
            ));
        }
    }

    #[test]
    fn test_validate_zero_timeout() {
        let settings = Settings {
            training_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_validate_empty_location() {
        let settings = Settings {
            default_storage_location: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::EmptyValue(_))
        ));
    }

    #[test]
    fn test_validate_engine_url() {
        let settings = Settings {
            engine_url: Some("localhost:8090".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidEngineUrl(_))
        ));
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = Settings::with_defaults();
        let update = SettingsUpdate {
            max_concurrent_builds: Some(Some(8)),
            engine_url: Some(None),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.max_concurrent_builds, Some(8));
        assert_eq!(settings.engine_url, None);
        assert_eq!(settings.effective_engine_url(), DEFAULT_ENGINE_URL);
        assert_eq!(settings.webhdfs_port, Some(DEFAULT_WEBHDFS_PORT));
    }

    #[test]
    fn test_effective_values_fall_back() {
        let settings = Settings::default();
        assert_eq!(settings.effective_storage_type(), "file");
        assert_eq!(settings.effective_max_concurrent_builds(), 4);
        assert_eq!(settings.effective_hdfs_authority(), "localhost:9000");
        assert_eq!(settings.effective_webhdfs_port(), 9870);
    }

    #[test]
    fn test_update_from_key_value() {
        let update = SettingsUpdate::from_key_value("training_timeout_secs", "30").unwrap();
        assert_eq!(update.training_timeout_secs, Some(Some(30)));

        let clear = SettingsUpdate::from_key_value("default_storage_location", "").unwrap();
        assert_eq!(clear.default_storage_location, Some(None));

        assert!(matches!(
            SettingsUpdate::from_key_value("webhdfs_port", "abc"),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert!(matches!(
            SettingsUpdate::from_key_value("proxy_port", "8080"),
            Err(SettingsError::UnknownKey(_))
        ));
    }
}
