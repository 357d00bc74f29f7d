//! Release controller and product life-cycle HTTP client
//!
//! Implements the core data-source traits over the release controller's
//! JSON API (`/api/v1/releasestreams/*`, `/graph`) and the public product
//! life-cycle API.

use async_trait::async_trait;
use payload_health_core::lifecycle::supported_range;
use payload_health_core::{
    Architecture, GraphDocument, HealthResult, LifecycleSource, MinorRange,
    ProductLifeCycleResponse, ReleaseKind, ReleaseMap, ReleaseSource, UpgradeGraph,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::Result;

/// Accepted payloads per stream
pub const ACCEPTED_RELEASE_PATH: &str = "/api/v1/releasestreams/accepted";
/// Every built payload per stream
pub const ALL_RELEASE_PATH: &str = "/api/v1/releasestreams/all";
/// Product life-cycle endpoint for OpenShift 4
pub const DEFAULT_LIFECYCLE_URL: &str = "https://access.redhat.com/product-life-cycles/api/v1/products?name=Openshift%20Container%20Platform%204";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Release controller base URL used for every architecture instead of
    /// the per-architecture default (mirrors, tests)
    pub release_controller_url: Option<String>,
    /// Product life-cycle API URL
    pub lifecycle_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            release_controller_url: std::env::var("RELEASE_CONTROLLER_URL").ok(),
            lifecycle_url: std::env::var("LIFECYCLE_API_URL")
                .unwrap_or_else(|_| DEFAULT_LIFECYCLE_URL.to_string()),
            timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Point every architecture at one release controller
    pub fn with_release_controller_url(mut self, url: &str) -> Self {
        self.release_controller_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Use a different life-cycle API endpoint
    pub fn with_lifecycle_url(mut self, url: &str) -> Self {
        self.lifecycle_url = url.to_string();
        self
    }
}

/// HTTP client for release data
#[derive(Debug, Clone)]
pub struct ReleaseControllerClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ReleaseControllerClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("payload-health/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Client)?;

        Ok(ReleaseControllerClient {
            config,
            http_client,
        })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL of the release controller for `arch`
    pub fn controller_url(&self, arch: Architecture) -> String {
        self.config
            .release_controller_url
            .clone()
            .unwrap_or_else(|| arch.release_controller_url())
    }

    /// GET `url` and decode the body as JSON
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "fetching");
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| ClientError::Http {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Release stream map for `kind`
    pub async fn release_map(&self, arch: Architecture, kind: ReleaseKind) -> Result<ReleaseMap> {
        let path = match kind {
            ReleaseKind::Accepted => ACCEPTED_RELEASE_PATH,
            ReleaseKind::All => ALL_RELEASE_PATH,
        };
        let url = format!("{}{}", self.controller_url(arch), path);
        let map: ReleaseMap = self.get_json(&url).await?;
        debug!(url = %url, streams = map.len(), "decoded release streams");
        Ok(map)
    }

    /// Upgrade graph for `channel`, converted to predecessor form
    pub async fn upgrade_graph(&self, arch: Architecture, channel: &str) -> Result<UpgradeGraph> {
        let url = format!("{}/graph?channel={}", self.controller_url(arch), channel);
        let doc: GraphDocument = self.get_json(&url).await?;
        debug!(
            url = %url,
            nodes = doc.nodes.len(),
            edges = doc.edges.len(),
            "decoded upgrade graph"
        );
        UpgradeGraph::from_document(&doc).map_err(|source| ClientError::InvalidGraph { url, source })
    }

    /// Raw life-cycle document
    pub async fn lifecycle(&self) -> Result<ProductLifeCycleResponse> {
        self.get_json(&self.config.lifecycle_url).await
    }
}

#[async_trait]
impl ReleaseSource for ReleaseControllerClient {
    async fn fetch_release_map(
        &self,
        arch: Architecture,
        kind: ReleaseKind,
    ) -> HealthResult<ReleaseMap> {
        Ok(self.release_map(arch, kind).await?)
    }

    async fn fetch_upgrade_graph(
        &self,
        arch: Architecture,
        channel: &str,
    ) -> HealthResult<UpgradeGraph> {
        Ok(self.upgrade_graph(arch, channel).await?)
    }

    fn base_url(&self, arch: Architecture) -> String {
        self.controller_url(arch)
    }
}

#[async_trait]
impl LifecycleSource for ReleaseControllerClient {
    async fn supported_minor_range(&self) -> HealthResult<MinorRange> {
        let doc = self.lifecycle().await?;
        let range = supported_range(&doc, &self.config.lifecycle_url)?;
        info!(
            oldest = range.oldest,
            newest = range.newest,
            "resolved supported releases"
        );
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig {
            release_controller_url: None,
            lifecycle_url: DEFAULT_LIFECYCLE_URL.to_string(),
            timeout_secs: 5,
        }
        .with_release_controller_url("http://127.0.0.1:9000/");
        assert_eq!(
            config.release_controller_url.as_deref(),
            Some("http://127.0.0.1:9000")
        );
    }

    #[test]
    fn test_controller_url_defaults_per_arch() {
        let client = ReleaseControllerClient::new(ClientConfig {
            release_controller_url: None,
            lifecycle_url: DEFAULT_LIFECYCLE_URL.to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            client.base_url(Architecture::Ppc64le),
            "https://ppc64le.ocp.releases.ci.openshift.org"
        );
    }

    #[test]
    fn test_controller_url_override() {
        let config = ClientConfig {
            release_controller_url: None,
            lifecycle_url: DEFAULT_LIFECYCLE_URL.to_string(),
            timeout_secs: 5,
        }
        .with_release_controller_url("http://mirror.test");
        let client = ReleaseControllerClient::new(config).unwrap();
        assert_eq!(client.base_url(Architecture::Arm64), "http://mirror.test");
        assert_eq!(client.base_url(Architecture::Amd64), "http://mirror.test");
    }
}
