//! Error types for release-controller-client

use payload_health_core::{HealthError, InvalidEdge};
use thiserror::Error;

/// Errors that can occur while talking to the release controller or the
/// product life-cycle API
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Request failed before a response arrived
    #[error("error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-OK status
    #[error("non-OK http response code from {url}: {status}")]
    Status { url: String, status: u16 },

    /// Response body was not the expected JSON document
    #[error("error decoding {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Graph document referenced nodes it does not contain
    #[error("invalid upgrade graph from {url}: {source}")]
    InvalidGraph {
        url: String,
        #[source]
        source: InvalidEdge,
    },
}

impl ClientError {
    /// URL the failed request was made against, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            ClientError::Client(_) => None,
            ClientError::Http { url, .. }
            | ClientError::Status { url, .. }
            | ClientError::Decode { url, .. }
            | ClientError::InvalidGraph { url, .. } => Some(url),
        }
    }
}

impl From<ClientError> for HealthError {
    fn from(err: ClientError) -> Self {
        let url = err.url().unwrap_or_default().to_string();
        match err {
            ClientError::Client(e) => HealthError::Config(e.to_string()),
            ClientError::Http { source, .. } => HealthError::fetch(url, source),
            ClientError::Status { status, .. } => {
                HealthError::fetch(url, format!("non-OK http response code: {}", status))
            }
            ClientError::Decode { source, .. } => HealthError::decode(url, source),
            ClientError::InvalidGraph { source, .. } => HealthError::decode(url, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_fetch_error() {
        let err: HealthError = ClientError::Status {
            url: "https://rc.test/api/v1/releasestreams/all".to_string(),
            status: 502,
        }
        .into();
        match err {
            HealthError::Fetch { url, detail } => {
                assert!(url.ends_with("/releasestreams/all"));
                assert!(detail.contains("502"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_maps_to_decode_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: HealthError = ClientError::Decode {
            url: "https://rc.test/graph?channel=stable".to_string(),
            source,
        }
        .into();
        assert!(matches!(err, HealthError::Decode { .. }));
    }

    #[test]
    fn test_invalid_graph_maps_to_decode_error() {
        let err: HealthError = ClientError::InvalidGraph {
            url: "https://rc.test/graph?channel=stable".to_string(),
            source: InvalidEdge {
                edge: 0,
                index: 7,
                nodes: 2,
            },
        }
        .into();
        assert!(err.to_string().contains("references node 7"));
    }
}
