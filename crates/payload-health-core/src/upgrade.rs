//! Patch- and minor-level upgrade checks against the upgrade graph.
//!
//! For each recent payload of a stream, the graph lists the versions it was
//! upgraded from. A predecessor of the same minor is a patch-level upgrade, a
//! predecessor one minor behind is a minor-level upgrade. Payloads are visited
//! newest first and the first match of each kind wins.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error};

use crate::context::EvalContext;
use crate::domain::{days, ReleaseMap, UpgradeGraph};
use crate::report::Report;
use crate::version::{parse_payload_timestamp, payload_minor};

/// A recorded upgrade into a recent payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeMatch {
    /// Version the payload was upgraded from.
    pub from: String,
    /// Payload the upgrade landed on.
    pub to: String,
    /// Age of the target payload.
    pub age: Duration,
}

impl UpgradeMatch {
    pub fn days(&self) -> f64 {
        days(self.age)
    }
}

/// Upgrade findings for a single stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeFinding {
    pub patch: Option<UpgradeMatch>,
    pub minor: Option<UpgradeMatch>,
}

impl UpgradeFinding {
    pub fn is_complete(&self) -> bool {
        self.patch.is_some() && self.minor.is_some()
    }
}

/// Recent payloads of a stream, newest first, with their ages.
fn recent_payloads<'a>(
    payloads: &'a [String],
    threshold: Duration,
    ctx: &EvalContext,
) -> Vec<(&'a str, Duration)> {
    let mut dated: Vec<(DateTime<Utc>, &str)> = payloads
        .iter()
        .filter_map(|payload| match parse_payload_timestamp(payload, ctx.offset) {
            Ok(ts) => Some((ts, payload.as_str())),
            Err(e) => {
                error!("{}", e);
                None
            }
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    dated
        .into_iter()
        .map(|(ts, payload)| (payload, ctx.now - ts))
        .filter(|(_, age)| *age < threshold)
        .collect()
}

/// Search the graph for the most recent patch- and minor-level upgrades into
/// `payloads`. Scanning stops as soon as both kinds are found.
pub fn find_upgrades(
    graph: &UpgradeGraph,
    payloads: &[String],
    threshold: Duration,
    ctx: &EvalContext,
) -> UpgradeFinding {
    let mut finding = UpgradeFinding::default();

    'payloads: for (payload, age) in recent_payloads(payloads, threshold, ctx) {
        let to_minor = match payload_minor(payload) {
            Ok(minor) => minor,
            Err(e) => {
                debug!(error = %e, "skipping payload");
                continue;
            }
        };

        for from in graph.predecessors(payload) {
            let from_minor = match payload_minor(from) {
                Ok(minor) => minor,
                Err(e) => {
                    debug!(payload = %payload, error = %e, "ignoring upgrade");
                    continue;
                }
            };
            debug!(payload = %payload, from = %from, "payload upgrades from predecessor");

            let slot = if from_minor == to_minor {
                &mut finding.patch
            } else if to_minor.checked_sub(1) == Some(from_minor) {
                &mut finding.minor
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(UpgradeMatch {
                    from: from.clone(),
                    to: payload.to_string(),
                    age,
                });
            }
            if finding.is_complete() {
                break 'payloads;
            }
        }
    }

    finding
}

/// Build the report skeleton: one entry per in-range stream of `releases`,
/// carrying the upgrade messages.
pub fn evaluate_upgrades(
    graph: &UpgradeGraph,
    releases: &ReleaseMap,
    threshold: Duration,
    ctx: &EvalContext,
) -> Report {
    let mut report = Report::new(ctx.range, ctx.base_url.clone());

    for (stream, payloads) in releases.iter() {
        if ctx.stream_minor_in_range(stream).is_none() {
            continue;
        }
        let finding = find_upgrades(graph, payloads, threshold, ctx);
        let entry = report.stream_mut(stream);

        match &finding.patch {
            Some(m) => entry.healthy.push(format!(
                "Has a recent valid patch level upgrade from {} {:.1} days ago",
                m.from,
                m.days()
            )),
            None => entry
                .unhealthy
                .push("Does not have a recent valid patch level upgrade".to_string()),
        }
        match &finding.minor {
            Some(m) => entry.healthy.push(format!(
                "Has a recent valid minor level upgrade from {} {:.1} days ago",
                m.from,
                m.days()
            )),
            None => entry
                .unhealthy
                .push("Does not have a recent valid minor level upgrade".to_string()),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MinorRange;
    use chrono::TimeZone;

    fn ctx() -> EvalContext {
        EvalContext::new(MinorRange::new(9, 14).unwrap(), "https://rc.test")
            .with_now(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap())
    }

    fn payloads(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    const RECENT: &str = "4.12.0-0.nightly-2024-01-09-000000";
    const OLDER: &str = "4.12.0-0.nightly-2024-01-08-000000";
    const ANCIENT: &str = "4.12.0-0.nightly-2023-12-01-000000";

    #[test]
    fn test_patch_and_minor_classification() {
        let graph = UpgradeGraph::new()
            .with_edge("4.12.3", RECENT)
            .with_edge("4.11.20", RECENT)
            .with_edge("4.10.5", RECENT);
        let found = find_upgrades(&graph, &payloads(&[RECENT]), Duration::days(3), &ctx());
        let patch = found.patch.unwrap();
        let minor = found.minor.unwrap();
        assert_eq!(patch.from, "4.12.3");
        assert_eq!(minor.from, "4.11.20");
        assert!((patch.days() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_minor_yields_nothing() {
        let graph = UpgradeGraph::new()
            .with_edge("4.10.5", RECENT)
            .with_edge("4.13.0", RECENT)
            .with_edge("not-a-version", RECENT);
        let found = find_upgrades(&graph, &payloads(&[RECENT]), Duration::days(3), &ctx());
        assert_eq!(found, UpgradeFinding::default());
    }

    #[test]
    fn test_huge_predecessor_minor_is_not_an_upgrade() {
        let to = "4.0.0-0.nightly-2024-01-09-000000";
        let graph = UpgradeGraph::new()
            .with_edge("4.4294967295.0", to)
            .with_edge("4.4294967295.0", RECENT);
        let found = find_upgrades(&graph, &payloads(&[to, RECENT]), Duration::days(3), &ctx());
        assert_eq!(found, UpgradeFinding::default());
    }

    #[test]
    fn test_newest_payload_wins() {
        let graph = UpgradeGraph::new()
            .with_edge("4.12.1", OLDER)
            .with_edge("4.12.2", RECENT);
        // listing order must not matter
        let found = find_upgrades(
            &graph,
            &payloads(&[OLDER, RECENT]),
            Duration::days(3),
            &ctx(),
        );
        assert_eq!(found.patch.unwrap().from, "4.12.2");
    }

    #[test]
    fn test_first_predecessor_wins_within_payload() {
        let graph = UpgradeGraph::new()
            .with_edge("4.12.1", RECENT)
            .with_edge("4.12.2", RECENT);
        let found = find_upgrades(&graph, &payloads(&[RECENT]), Duration::days(3), &ctx());
        assert_eq!(found.patch.unwrap().from, "4.12.1");
    }

    #[test]
    fn test_short_circuit_once_both_found() {
        let graph = UpgradeGraph::new()
            .with_edge("4.12.2", RECENT)
            .with_edge("4.11.9", RECENT)
            .with_edge("4.12.1", OLDER)
            .with_edge("4.11.8", OLDER);
        let found = find_upgrades(
            &graph,
            &payloads(&[RECENT, OLDER]),
            Duration::days(3),
            &ctx(),
        );
        assert_eq!(found.patch.as_ref().unwrap().to, RECENT);
        assert_eq!(found.minor.as_ref().unwrap().to, RECENT);
    }

    #[test]
    fn test_stale_and_undated_payloads_skipped() {
        let graph = UpgradeGraph::new()
            .with_edge("4.12.1", ANCIENT)
            .with_edge("4.12.1", "4.12.5");
        let found = find_upgrades(
            &graph,
            &payloads(&[ANCIENT, "4.12.5"]),
            Duration::days(3),
            &ctx(),
        );
        assert_eq!(found, UpgradeFinding::default());
    }

    #[test]
    fn test_age_equal_to_threshold_is_skipped() {
        let graph = UpgradeGraph::new().with_edge("4.12.1", RECENT);
        let found = find_upgrades(&graph, &payloads(&[RECENT]), Duration::days(1), &ctx());
        assert!(found.patch.is_none());
    }

    #[test]
    fn test_stream_without_predecessors_is_unhealthy_twice() {
        let releases = ReleaseMap::new().with_stream(
            "4.9.0-0.nightly",
            ["4.9.0-0.nightly-2024-01-09-000000"],
        );
        let report = evaluate_upgrades(&UpgradeGraph::new(), &releases, Duration::days(3), &ctx());
        let entry = report.get("4.9.0-0.nightly").unwrap();
        assert!(entry.healthy.is_empty());
        assert_eq!(
            entry.unhealthy,
            vec![
                "Does not have a recent valid patch level upgrade",
                "Does not have a recent valid minor level upgrade",
            ]
        );
    }

    #[test]
    fn test_healthy_messages_and_range_filtering() {
        let graph = UpgradeGraph::new()
            .with_edge("4.12.3", RECENT)
            .with_edge("4.11.20", RECENT);
        let releases = ReleaseMap::new()
            .with_stream("4.12.0-0.nightly", [RECENT])
            .with_stream("4.8.0-0.nightly", Vec::<String>::new());
        let report = evaluate_upgrades(&graph, &releases, Duration::days(3), &ctx());
        assert!(report.get("4.8.0-0.nightly").is_none());
        let entry = report.get("4.12.0-0.nightly").unwrap();
        assert!(entry.unhealthy.is_empty());
        assert_eq!(
            entry.healthy,
            vec![
                "Has a recent valid patch level upgrade from 4.12.3 1.0 days ago",
                "Has a recent valid minor level upgrade from 4.11.20 1.0 days ago",
            ]
        );
    }
}
