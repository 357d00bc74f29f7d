//! Per-stream health report: assembly and rendering.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{days, HealthResult, MinorRange};
use crate::staleness::StalenessOutcome;
use crate::version::parse_payload_minor;

/// Messages collected for one release stream. Only ever appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReport {
    pub healthy: Vec<String>,
    pub unhealthy: Vec<String>,
}

impl ReleaseReport {
    pub fn is_healthy(&self) -> bool {
        self.unhealthy.is_empty()
    }
}

/// The three staleness passes merged into a report.
#[derive(Debug, Clone, Default)]
pub struct StalenessFindings {
    /// Accepted payloads against the accepted limit.
    pub accepted: StalenessOutcome,
    /// All payloads against the accepted limit: were there recent builds at all?
    pub built_recent: StalenessOutcome,
    /// All payloads against the built limit.
    pub built_stale: StalenessOutcome,
}

/// Health of every analyzed stream plus the context needed to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    streams: BTreeMap<String, ReleaseReport>,
    pub oldest_minor: u32,
    pub newest_minor: u32,
    pub base_url: String,
}

impl Report {
    pub fn new(range: MinorRange, base_url: impl Into<String>) -> Self {
        Self {
            streams: BTreeMap::new(),
            oldest_minor: range.oldest,
            newest_minor: range.newest,
            base_url: base_url.into(),
        }
    }

    /// Entry for `stream`, created empty on first access.
    pub fn stream_mut(&mut self, stream: &str) -> &mut ReleaseReport {
        self.streams.entry(stream.to_string()).or_default()
    }

    pub fn get(&self, stream: &str) -> Option<&ReleaseReport> {
        self.streams.get(stream)
    }

    /// Streams in name order.
    pub fn streams(&self) -> impl Iterator<Item = (&str, &ReleaseReport)> {
        self.streams.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn unhealthy_count(&self) -> usize {
        self.streams.values().filter(|r| !r.is_healthy()).count()
    }

    pub fn push_unhealthy(&mut self, stream: &str, message: impl Into<String>) {
        self.stream_mut(stream).unhealthy.push(message.into());
    }

    pub fn push_healthy(&mut self, stream: &str, message: impl Into<String>) {
        self.stream_mut(stream).healthy.push(message.into());
    }

    /// Append the accepted/built payload findings.
    ///
    /// Order: missing accepted payloads, stale accepted payloads, missing
    /// builds, stale builds.
    pub fn apply_staleness(&mut self, findings: &StalenessFindings, accepted_limit: Duration) {
        for stream in &findings.accepted.empty {
            debug!(stream = %stream, "examining stream which has no accepted payloads");
            // an entirely empty stream is reported once, as having no builds
            if findings.built_recent.is_empty_stream(stream) {
                continue;
            }
            if !findings.built_recent.is_stale_stream(stream) {
                self.push_unhealthy(
                    stream,
                    "Has no accepted payloads, but the stream contains recently built payloads",
                );
            } else {
                self.push_unhealthy(
                    stream,
                    "Has no accepted payloads, but the stream contains built payloads",
                );
            }
        }

        for (stream, age) in &findings.accepted.stale {
            self.push_unhealthy(
                stream,
                format!(
                    "Most recently accepted payload > {:.1} days, last accepted was {} ago",
                    days(accepted_limit),
                    describe_age(*age)
                ),
            );
        }

        for stream in &findings.built_recent.empty {
            self.push_unhealthy(stream, "Has no built payloads");
        }

        for (stream, age) in &findings.built_stale.stale {
            self.push_unhealthy(
                stream,
                format!("Most recently built payload was {} ago", describe_age(*age)),
            );
        }
    }

    /// Stream names, highest minor first; equal minors keep name order.
    /// Names without a `4.<minor>.<patch>` version sort after all others.
    fn sorted_streams(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.streams.keys().map(String::as_str).collect();
        names.sort_by_key(|name| std::cmp::Reverse(parse_payload_minor(name)));
        names
    }

    /// Plain-text report.
    ///
    /// Healthy streams are omitted unless `include_healthy`; in that mode
    /// unhealthy lines carry a warning marker and healthy lines follow them.
    pub fn render(&self, include_healthy: bool) -> String {
        let mut out = String::new();

        for name in self.sorted_streams() {
            let stream = &self.streams[name];
            if stream.is_healthy() && !include_healthy {
                continue;
            }

            out.push_str(&format!("{}/#{}\n", self.base_url, name));

            let prefix = if include_healthy { "*WARNING:* " } else { "" };
            for msg in &stream.unhealthy {
                out.push_str(&format!("  * {}{}\n", prefix, msg));
            }
            if include_healthy {
                for msg in &stream.healthy {
                    out.push_str(&format!("  * {}\n", msg));
                }
            }
            out.push('\n');
        }

        if !include_healthy && out.is_empty() {
            out.push_str("No unhealthy payload streams detected\n");
        }
        out.push_str(&format!(
            "\nIgnored releases older than 4.{}.z and newer than 4.{}.z\n",
            self.oldest_minor, self.newest_minor
        ));
        out
    }

    pub fn to_json_pretty(&self) -> HealthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> HealthResult<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

fn describe_age(age: Option<Duration>) -> String {
    match age {
        Some(age) => format!("{:.1} days", days(age)),
        None => "an unknown time".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> MinorRange {
        MinorRange::new(10, 14).unwrap()
    }

    fn outcome(empty: &[&str], stale: &[(&str, Option<Duration>)]) -> StalenessOutcome {
        StalenessOutcome {
            empty: empty.iter().map(|s| s.to_string()).collect(),
            stale: stale.iter().map(|(s, a)| (s.to_string(), *a)).collect(),
        }
    }

    #[test]
    fn test_render_sorts_by_descending_minor() {
        let mut report = Report::new(range(), "https://rc.test");
        report.push_unhealthy("4.10.0-0.nightly", "a");
        report.push_unhealthy("4.12.0-0.nightly", "b");
        report.push_unhealthy("4.12.0-0.ci", "c");
        report.push_unhealthy("4.9.0-0.ci", "d");

        let text = report.render(false);
        let headers: Vec<&str> = text.lines().filter(|l| l.starts_with("https://")).collect();
        assert_eq!(
            headers,
            vec![
                "https://rc.test/#4.12.0-0.ci",
                "https://rc.test/#4.12.0-0.nightly",
                "https://rc.test/#4.10.0-0.nightly",
                "https://rc.test/#4.9.0-0.ci",
            ]
        );
    }

    #[test]
    fn test_render_puts_unversioned_names_last() {
        let mut report = Report::new(range(), "https://rc.test");
        report.push_unhealthy("4-stable", "a");
        report.push_unhealthy("4.0.0-0.ci", "b");
        report.push_unhealthy("4.11.0-0.nightly-arm64", "c");

        let text = report.render(false);
        let headers: Vec<&str> = text.lines().filter(|l| l.starts_with("https://")).collect();
        assert_eq!(
            headers,
            vec![
                "https://rc.test/#4.11.0-0.nightly-arm64",
                "https://rc.test/#4.0.0-0.ci",
                "https://rc.test/#4-stable",
            ]
        );
    }

    #[test]
    fn test_render_unhealthy_only() {
        let mut report = Report::new(range(), "https://rc.test");
        report.push_healthy("4.13.0-0.ci", "fine");
        report.push_unhealthy("4.12.0-0.ci", "broken");
        report.push_healthy("4.12.0-0.ci", "partly fine");

        let expected = "https://rc.test/#4.12.0-0.ci\n  * broken\n\n\nIgnored releases older than 4.10.z and newer than 4.14.z\n";
        assert_eq!(report.render(false), expected);
    }

    #[test]
    fn test_render_include_healthy() {
        let mut report = Report::new(range(), "https://rc.test");
        report.push_healthy("4.13.0-0.ci", "fine");
        report.push_unhealthy("4.12.0-0.ci", "broken");
        report.push_healthy("4.12.0-0.ci", "partly fine");

        let expected = "https://rc.test/#4.13.0-0.ci\n  * fine\n\n\
                        https://rc.test/#4.12.0-0.ci\n  * *WARNING:* broken\n  * partly fine\n\n\
                        \nIgnored releases older than 4.10.z and newer than 4.14.z\n";
        assert_eq!(report.render(true), expected);
    }

    #[test]
    fn test_render_all_healthy() {
        let mut report = Report::new(range(), "https://rc.test");
        report.push_healthy("4.13.0-0.ci", "fine");
        assert_eq!(
            report.render(false),
            "No unhealthy payload streams detected\n\nIgnored releases older than 4.10.z and newer than 4.14.z\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut report = Report::new(range(), "https://rc.test");
        for minor in [11, 14, 12, 10, 13] {
            report.push_unhealthy(&format!("4.{}.0-0.nightly", minor), "x");
            report.push_unhealthy(&format!("4.{}.0-0.ci", minor), "y");
        }
        assert_eq!(report.render(true), report.clone().render(true));
        assert_eq!(report.render(false), report.render(false));
    }

    #[test]
    fn test_apply_staleness_messages() {
        let mut report = Report::new(range(), "https://rc.test");
        let findings = StalenessFindings {
            accepted: outcome(
                &["4.10.0-0.ci", "4.11.0-0.ci", "4.12.0-0.ci"],
                &[("4.13.0-0.ci", Some(Duration::hours(48)))],
            ),
            built_recent: outcome(
                &["4.12.0-0.ci"],
                &[("4.11.0-0.ci", Some(Duration::hours(30)))],
            ),
            built_stale: outcome(
                &["4.12.0-0.ci"],
                &[("4.14.0-0.ci", Some(Duration::hours(96))), ("4.11.0-0.ci", None)],
            ),
        };
        report.apply_staleness(&findings, Duration::hours(24));

        assert_eq!(
            report.get("4.10.0-0.ci").unwrap().unhealthy,
            vec!["Has no accepted payloads, but the stream contains recently built payloads"]
        );
        assert_eq!(
            report.get("4.11.0-0.ci").unwrap().unhealthy,
            vec![
                "Has no accepted payloads, but the stream contains built payloads",
                "Most recently built payload was an unknown time ago",
            ]
        );
        assert_eq!(
            report.get("4.12.0-0.ci").unwrap().unhealthy,
            vec!["Has no built payloads"]
        );
        assert_eq!(
            report.get("4.13.0-0.ci").unwrap().unhealthy,
            vec!["Most recently accepted payload > 1.0 days, last accepted was 2.0 days ago"]
        );
        assert_eq!(
            report.get("4.14.0-0.ci").unwrap().unhealthy,
            vec!["Most recently built payload was 4.0 days ago"]
        );
        assert_eq!(report.unhealthy_count(), 5);
    }

    #[test]
    fn test_json_roundtrip_via_file() {
        let mut report = Report::new(range(), "https://rc.test");
        report.push_unhealthy("4.12.0-0.ci", "broken");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();

        let restored: Report =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, report);
        let v: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(v["streams"]["4.12.0-0.ci"]["unhealthy"][0], "broken");
    }
}
