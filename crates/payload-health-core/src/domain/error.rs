//! Error taxonomy for payload health evaluation.

/// Failure to extract structure from a single stream name, payload name or
/// timestamp. Always recoverable: the offending item is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("not a z-stream release name: {name}")]
    StreamName { name: String },

    #[error("could not determine minor version of {name}")]
    MinorVersion { name: String },

    #[error("could not extract date from payload {payload}")]
    MissingTimestamp { payload: String },

    #[error("failed to parse time string {raw} of payload {payload}")]
    InvalidTimestamp { payload: String, raw: String },
}

/// Fatal errors surfaced by report generation.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// Transport failure or non-OK status from an external source.
    #[error("error fetching {url}: {detail}")]
    Fetch { url: String, detail: String },

    /// Structured data from an external source could not be decoded.
    #[error("error decoding {url}: {detail}")]
    Decode { url: String, detail: String },

    /// Invalid or contradictory configuration, detected before any fetch.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HealthError {
    /// Shorthand for a [`HealthError::Fetch`].
    pub fn fetch(url: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        HealthError::Fetch {
            url: url.into(),
            detail: detail.to_string(),
        }
    }

    /// Shorthand for a [`HealthError::Decode`].
    pub fn decode(url: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        HealthError::Decode {
            url: url.into(),
            detail: detail.to_string(),
        }
    }
}

/// Result type for payload health operations.
pub type HealthResult<T> = std::result::Result<T, HealthError>;
