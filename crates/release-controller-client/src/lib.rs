//! Release-Controller-Client: HTTP data sources for payload health reports
//!
//! This crate fetches release-stream maps and upgrade graphs from the
//! release controller of each architecture, and the supported minor range
//! from the product life-cycle API.
//!
//! ## Data source layer
//!
//! Focus: transport and decoding. Every failure surfaces as a fatal
//! `HealthError::Fetch` or `HealthError::Decode`; nothing is retried.

pub mod controller;
pub mod error;

pub use controller::{
    ClientConfig, ReleaseControllerClient, ACCEPTED_RELEASE_PATH, ALL_RELEASE_PATH,
    DEFAULT_LIFECYCLE_URL,
};
pub use error::ClientError;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
