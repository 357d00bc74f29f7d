//! Release streams, payload maps and the minor-version window under analysis.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{HealthError, HealthResult};

/// Which payload set of the release controller to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    /// Payloads promoted after passing verification.
    Accepted,
    /// Every built payload, accepted or not.
    All,
}

impl ReleaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseKind::Accepted => "accepted",
            ReleaseKind::All => "all",
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release stream name → payload names.
///
/// Decodes directly from the release controller's
/// `{"4.12.0-0.nightly": ["4.12.0-0.nightly-2024-01-01-000000", ...]}` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseMap(BTreeMap<String, Vec<String>>);

impl ReleaseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fakes.
    pub fn with_stream<I, S>(mut self, stream: impl Into<String>, payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(stream, payloads.into_iter().map(Into::into).collect());
        self
    }

    pub fn insert(&mut self, stream: impl Into<String>, payloads: Vec<String>) {
        self.0.insert(stream.into(), payloads);
    }

    pub fn get(&self, stream: &str) -> Option<&[String]> {
        self.0.get(stream).map(Vec::as_slice)
    }

    /// Streams in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for ReleaseMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        ReleaseMap(iter.into_iter().collect())
    }
}

/// Inclusive window of minor versions `[oldest, newest]` to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorRange {
    pub oldest: u32,
    pub newest: u32,
}

impl MinorRange {
    /// Build a range, rejecting `newest < oldest`.
    pub fn new(oldest: u32, newest: u32) -> HealthResult<Self> {
        if newest < oldest {
            return Err(HealthError::Config(format!(
                "invalid release range (4.{} -> 4.{}), newest must not be older than oldest",
                oldest, newest
            )));
        }
        Ok(Self { oldest, newest })
    }

    pub fn contains(&self, minor: u32) -> bool {
        minor >= self.oldest && minor <= self.newest
    }
}

/// Hardware architecture; selects which release controller to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Amd64,
    Arm64,
    Multi,
    Ppc64le,
    S390x,
}

impl Architecture {
    pub const ALL: [Architecture; 5] = [
        Architecture::Amd64,
        Architecture::Arm64,
        Architecture::Multi,
        Architecture::Ppc64le,
        Architecture::S390x,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
            Architecture::Multi => "multi",
            Architecture::Ppc64le => "ppc64le",
            Architecture::S390x => "s390x",
        }
    }

    /// Base URL of the release controller serving this architecture.
    pub fn release_controller_url(&self) -> String {
        format!("https://{}.ocp.releases.ci.openshift.org", self.as_str())
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| HealthError::Config(format!("unknown architecture: {}", s)))
    }
}
