//! HDFS adapter speaking the WebHDFS REST protocol.
//!
//! Namenode operations that move data (`OPEN`, `CREATE`) answer with a
//! redirect to a datanode. Redirects are followed by hand so the data is
//! only ever sent to the datanode.

use async_trait::async_trait;
use reqwest::{Method, StatusCode, redirect};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;
use url::Url;

use mlforge_core::ports::{BlobReader, StorageAdapter, StorageError, StorageUri};
use mlforge_core::settings::Settings;

use crate::local::PARTIAL_SUFFIX;

/// Path prefix of the WebHDFS REST API.
const WEBHDFS_PREFIX: &str = "/webhdfs/v1";

/// Connection settings for [`HdfsAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdfsConfig {
    /// `host:port` used for `hdfs:///path` URIs that carry no authority.
    pub default_authority: String,
    /// Port of the namenode's HTTP endpoint.
    pub webhdfs_port: u16,
    /// Value of the `user.name` query parameter, when set.
    pub user: Option<String>,
    pub timeout: Duration,
}

impl HdfsConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            default_authority: settings.effective_hdfs_authority().to_string(),
            webhdfs_port: settings.effective_webhdfs_port(),
            user: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Boolean result body returned by `RENAME` and `DELETE`.
#[derive(Debug, Deserialize)]
struct BooleanResponse {
    boolean: bool,
}

/// Reads and writes `hdfs://` URIs.
///
/// Writes go to a `.partial` file that is renamed over the target once the
/// upload has finished.
pub struct HdfsAdapter {
    client: reqwest::Client,
    config: HdfsConfig,
}

impl HdfsAdapter {
    pub fn new(config: HdfsConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| StorageError::Remote(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Namenode REST URL for `op` on the path of `uri`.
    fn op_url(
        &self,
        uri: &StorageUri,
        path: &str,
        op: &str,
        extra: &[(&str, &str)],
    ) -> Result<Url, StorageError> {
        if uri.scheme != StorageUri::HDFS {
            return Err(StorageError::InvalidUri(format!("{uri} is not an HDFS URI")));
        }
        let authority = uri
            .authority
            .as_deref()
            .unwrap_or(&self.config.default_authority);
        let host = authority
            .rsplit_once(':')
            .map_or(authority, |(host, _)| host);

        let mut url = Url::parse(&format!("http://{host}:{}", self.config.webhdfs_port))
            .map_err(|e| StorageError::InvalidUri(format!("{uri}: {e}")))?;
        url.set_path(&format!("{WEBHDFS_PREFIX}{path}"));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op);
            for (key, value) in extra {
                query.append_pair(key, value);
            }
            if let Some(user) = &self.config.user {
                query.append_pair("user.name", user);
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, StorageError> {
        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(body);
        }
        request
            .send()
            .await
            .map_err(|e| StorageError::Remote(format!("{url}: {e}")))
    }

    /// Send a namenode request and, when redirected, repeat it against the
    /// datanode with the body attached.
    async fn send_redirected(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, StorageError> {
        let response = self.send(method.clone(), url.clone(), None).await?;
        if !response.status().is_redirection() {
            return Ok(response);
        }
        let location = redirect_location(&response)?;
        debug!(%location, "Following WebHDFS redirect");
        self.send(method, location, body).await
    }

    async fn boolean_op(&self, method: Method, url: Url) -> Result<bool, StorageError> {
        let response = check_status(self.send(method, url.clone(), None).await?, &url)?;
        let result: BooleanResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Remote(format!("{url}: unexpected response: {e}")))?;
        Ok(result.boolean)
    }
}

fn redirect_location(response: &reqwest::Response) -> Result<Url, StorageError> {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| StorageError::Remote("redirect without a Location header".to_string()))?;
    Url::parse(location).map_err(|e| StorageError::Remote(format!("bad redirect '{location}': {e}")))
}

fn check_status(response: reqwest::Response, url: &Url) -> Result<reqwest::Response, StorageError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(StorageError::NotFound(url.path().to_string())),
        status => Err(StorageError::Remote(format!("{url} returned {status}"))),
    }
}

#[async_trait]
impl StorageAdapter for HdfsAdapter {
    fn storage_type(&self) -> &str {
        StorageUri::HDFS
    }

    async fn read(&self, uri: &StorageUri) -> Result<BlobReader, StorageError> {
        let url = self.op_url(uri, &uri.path, "OPEN", &[])?;
        let response = check_status(self.send_redirected(Method::GET, url.clone(), None).await?, &url)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Remote(format!("{url}: {e}")))?;
        debug!(uri = %uri, bytes = bytes.len(), "Read HDFS blob");
        Ok(Box::new(Cursor::new(bytes.to_vec())))
    }

    async fn write(&self, uri: &StorageUri, data: &[u8]) -> Result<(), StorageError> {
        let partial = format!("{}{PARTIAL_SUFFIX}", uri.path);

        let create = self.op_url(uri, &partial, "CREATE", &[("overwrite", "true")])?;
        check_status(
            self.send_redirected(Method::PUT, create.clone(), Some(data.to_vec()))
                .await?,
            &create,
        )?;

        // RENAME refuses to replace an existing file.
        let delete = self.op_url(uri, &uri.path, "DELETE", &[])?;
        self.boolean_op(Method::DELETE, delete).await?;

        let rename = self.op_url(uri, &partial, "RENAME", &[("destination", &uri.path)])?;
        if !self.boolean_op(Method::PUT, rename).await? {
            return Err(StorageError::Remote(format!(
                "rename of {partial} to {} was refused",
                uri.path
            )));
        }

        debug!(uri = %uri, bytes = data.len(), "Wrote HDFS blob");
        Ok(())
    }
}
