//! JSON-over-HTTP transport to the engine.
//!
//! The backend only speaks in JSON values and paths, so tests can swap in a
//! scripted transport without a server.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Sends requests to the engine's REST API.
#[async_trait]
pub trait EngineTransport: Send + Sync {
    /// `POST` a JSON body to `path` and return the decoded JSON response.
    async fn post(&self, path: &str, body: Value) -> EngineResult<Value>;

    async fn delete(&self, path: &str) -> EngineResult<()>;
}

/// Error body the engine sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Production transport using reqwest.
///
/// Requests that fail before reaching the engine, and `503 Service
/// Unavailable` answers, are retried with exponential backoff. Anything
/// else fails immediately so a fit is never submitted twice.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
    max_retries: u8,
    retry_base_delay: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| EngineError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| EngineError::Network {
                url: config.base_url.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    fn url(&self, path: &str) -> EngineResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| EngineError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn send_with_retry(
        &self,
        request: impl Fn() -> reqwest::RequestBuilder + Send + Sync,
        url: &Url,
    ) -> EngineResult<reqwest::Response> {
        let mut attempt: u8 = 0;
        loop {
            if attempt > 0 {
                let delay = self.retry_base_delay * 2u32.pow(u32::from(attempt) - 1);
                tokio::time::sleep(delay).await;
            }
            let can_retry = attempt < self.max_retries;
            attempt += 1;

            match request().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if status == reqwest::StatusCode::SERVICE_UNAVAILABLE && can_retry {
                        debug!(%url, attempt, "Engine busy, retrying");
                        continue;
                    }
                    let text = response.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<ErrorBody>(&text)
                        .map_or(text, |body| body.error);
                    return Err(EngineError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                        message,
                    });
                }
                Err(e) if e.is_connect() && can_retry => {
                    debug!(%url, attempt, error = %e, "Engine unreachable, retrying");
                }
                Err(e) => {
                    return Err(EngineError::Network {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl EngineTransport for ReqwestTransport {
    async fn post(&self, path: &str, body: Value) -> EngineResult<Value> {
        let url = self.url(path)?;
        let response = self
            .send_with_retry(|| self.client.post(url.clone()).json(&body), &url)
            .await?;
        response
            .json()
            .await
            .map_err(|e| EngineError::InvalidResponse(format!("{url}: {e}")))
    }

    async fn delete(&self, path: &str) -> EngineResult<()> {
        let url = self.url(path)?;
        self.send_with_retry(|| self.client.delete(url.clone()), &url)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Scripted transport for testing
// ============================================================================
