//! Data-source seams for report generation.
//!
//! These traits define where release data comes from:
//! - `ReleaseSource`: release-stream maps and the upgrade graph of a release controller
//! - `LifecycleSource`: the currently supported minor range
//!
//! The HTTP implementation lives in `release-controller-client`; in-memory
//! fakes for tests are in [`crate::fakes`].

use async_trait::async_trait;

use crate::domain::{Architecture, HealthResult, MinorRange, ReleaseKind, ReleaseMap, UpgradeGraph};

/// Upgrade graph channel that only records successful edges.
pub const STABLE_CHANNEL: &str = "stable";

/// Release controller data for an architecture.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Stream → payload names for the accepted or the full payload set.
    async fn fetch_release_map(
        &self,
        arch: Architecture,
        kind: ReleaseKind,
    ) -> HealthResult<ReleaseMap>;

    /// Predecessor view of the upgrade graph for `channel`.
    ///
    /// The stable channel only includes successful edges; nightly and
    /// prerelease channels include any attempted upgrade.
    async fn fetch_upgrade_graph(
        &self,
        arch: Architecture,
        channel: &str,
    ) -> HealthResult<UpgradeGraph>;

    /// Base URL used when linking to streams in the report.
    fn base_url(&self, arch: Architecture) -> String;
}

/// Source of the currently supported minor versions.
#[async_trait]
pub trait LifecycleSource: Send + Sync {
    async fn supported_minor_range(&self) -> HealthResult<MinorRange>;
}
