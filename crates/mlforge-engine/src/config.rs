//! Configuration for the remote training engine client.

use std::time::Duration;

use mlforge_core::settings::Settings;

/// Configuration for [`RemoteTrainingBackend`](crate::RemoteTrainingBackend).
///
/// # Example
///
/// ```
/// use mlforge_engine::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig::new("http://engine:8090")
///     .with_timeout(Duration::from_secs(120))
///     .with_max_retries(1);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the engine's REST API.
    pub(crate) base_url: String,
    pub(crate) user_agent: String,
    /// Per-request timeout. Fits run inside one request, so keep it generous.
    pub(crate) timeout: Duration,
    /// Retries for requests that never reached the engine or found it busy.
    pub(crate) max_retries: u8,
    pub(crate) retry_base_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: mlforge_core::settings::DEFAULT_ENGINE_URL.to_string(),
            user_agent: concat!("mlforge-engine/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(3600),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Engine URL from settings. The request timeout follows the training
    /// timeout when one is set, with a minute of slack.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let config = Self::new(settings.effective_engine_url());
        match settings.training_timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs.saturating_add(60))),
            None => config,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub const fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.base_url, "http://localhost:8090");
        assert_eq!(config.max_retries, 3);
        assert!(config.user_agent.starts_with("mlforge-engine/"));
    }

    #[test]
    fn test_from_settings_follows_training_timeout() {
        let settings = Settings {
            engine_url: Some("http://engine:9000".to_string()),
            training_timeout_secs: Some(300),
            ..Settings::with_defaults()
        };

        let config = EngineConfig::from_settings(&settings);
        assert_eq!(config.base_url(), "http://engine:9000");
        assert_eq!(config.timeout, Duration::from_secs(360));
    }
}
