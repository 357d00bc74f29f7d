//! In-memory fakes for the data-source traits (testing only)
//!
//! Provides `MemoryReleaseSource` and `StaticLifecycleSource`, which record
//! how often they were called so tests can assert that nothing was fetched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    Architecture, HealthError, HealthResult, MinorRange, ReleaseKind, ReleaseMap, UpgradeGraph,
};
use crate::source::{LifecycleSource, ReleaseSource};

// ---------------------------------------------------------------------------
// MemoryReleaseSource
// ---------------------------------------------------------------------------

/// Release controller backed by fixed maps, one set per architecture.
#[derive(Debug, Default)]
pub struct MemoryReleaseSource {
    maps: Mutex<HashMap<(Architecture, ReleaseKind), ReleaseMap>>,
    graphs: Mutex<HashMap<(Architecture, String), UpgradeGraph>>,
    failing: Mutex<Option<String>>,
    fetches: AtomicUsize,
}

impl MemoryReleaseSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_releases(self, arch: Architecture, kind: ReleaseKind, map: ReleaseMap) -> Self {
        self.maps.lock().unwrap().insert((arch, kind), map);
        self
    }

    pub fn with_graph(self, arch: Architecture, channel: &str, graph: UpgradeGraph) -> Self {
        self.graphs
            .lock()
            .unwrap()
            .insert((arch, channel.to_string()), graph);
        self
    }

    /// Make every subsequent fetch fail with a [`HealthError::Fetch`].
    pub fn failing(self, detail: &str) -> Self {
        *self.failing.lock().unwrap() = Some(detail.to_string());
        self
    }

    /// Number of fetch calls served (including failed ones).
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_failure(&self, what: &str) -> HealthResult<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.failing.lock().unwrap().as_ref() {
            Some(detail) => Err(HealthError::fetch(format!("memory://{}", what), detail)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReleaseSource for MemoryReleaseSource {
    async fn fetch_release_map(
        &self,
        arch: Architecture,
        kind: ReleaseKind,
    ) -> HealthResult<ReleaseMap> {
        self.check_failure(kind.as_str())?;
        Ok(self
            .maps
            .lock()
            .unwrap()
            .get(&(arch, kind))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_upgrade_graph(
        &self,
        arch: Architecture,
        channel: &str,
    ) -> HealthResult<UpgradeGraph> {
        self.check_failure("graph")?;
        Ok(self
            .graphs
            .lock()
            .unwrap()
            .get(&(arch, channel.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn base_url(&self, arch: Architecture) -> String {
        format!("https://{}.release-controller.test", arch)
    }
}

// ---------------------------------------------------------------------------
// StaticLifecycleSource
// ---------------------------------------------------------------------------

/// Life-cycle source returning a fixed range.
#[derive(Debug)]
pub struct StaticLifecycleSource {
    range: MinorRange,
    lookups: AtomicUsize,
}

impl StaticLifecycleSource {
    pub fn new(range: MinorRange) -> Self {
        Self {
            range,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LifecycleSource for StaticLifecycleSource {
    async fn supported_minor_range(&self) -> HealthResult<MinorRange> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.range)
    }
}
