//! End-to-end report generation.
//!
//! Resolves the minor window, fetches the accepted and full release maps plus
//! the stable upgrade graph, then runs the upgrade pass and three staleness
//! passes. Any fetch failure aborts generation; there are no retries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, Instrument};

use crate::context::EvalContext;
use crate::domain::{HealthResult, MinorRange, ReleaseKind, ReportOptions};
use crate::obs::{
    emit_range_resolved, emit_report_finished, emit_report_started, emit_staleness_pass,
    report_span,
};
use crate::report::{Report, StalenessFindings};
use crate::source::{LifecycleSource, ReleaseSource, STABLE_CHANNEL};
use crate::staleness::{evaluate_staleness, StalenessOutcome};
use crate::upgrade::evaluate_upgrades;

/// Generates [`Report`]s from injected data sources.
#[derive(Clone)]
pub struct ReportGenerator {
    releases: Arc<dyn ReleaseSource>,
    lifecycle: Arc<dyn LifecycleSource>,
}

impl ReportGenerator {
    pub fn new(releases: Arc<dyn ReleaseSource>, lifecycle: Arc<dyn LifecycleSource>) -> Self {
        Self {
            releases,
            lifecycle,
        }
    }

    /// Generate a report as of now.
    pub async fn generate(&self, opts: &ReportOptions) -> HealthResult<Report> {
        self.generate_at(opts, Utc::now())
            .instrument(report_span(opts.arch))
            .await
    }

    /// Generate a report as of `now`.
    ///
    /// Configuration is validated before anything is fetched.
    pub async fn generate_at(&self, opts: &ReportOptions, now: DateTime<Utc>) -> HealthResult<Report> {
        opts.validate()?;
        let offset = opts.timestamp_offset()?;
        emit_report_started(opts.arch);

        let range = self.resolve_range(opts).await?;
        let base_url = self.releases.base_url(opts.arch);

        let accepted = self
            .releases
            .fetch_release_map(opts.arch, ReleaseKind::Accepted)
            .await?;
        let all = self
            .releases
            .fetch_release_map(opts.arch, ReleaseKind::All)
            .await?;
        let graph = self
            .releases
            .fetch_upgrade_graph(opts.arch, STABLE_CHANNEL)
            .await?;

        let ctx = EvalContext::new(range, base_url)
            .with_now(now)
            .with_offset(offset);

        let mut report = evaluate_upgrades(&graph, &all, opts.upgrade_staleness_limit, &ctx);

        debug!("checking streams for accepted payloads");
        let accepted = evaluate_staleness(&accepted, opts.accepted_staleness_limit, &ctx);
        log_pass("accepted", &accepted);
        debug!("checking streams for all payloads");
        let built_recent = evaluate_staleness(&all, opts.accepted_staleness_limit, &ctx);
        log_pass("built_recent", &built_recent);
        debug!("checking streams for very stale payloads");
        let built_stale = evaluate_staleness(&all, opts.built_staleness_limit, &ctx);
        log_pass("built_stale", &built_stale);

        report.apply_staleness(
            &StalenessFindings {
                accepted,
                built_recent,
                built_stale,
            },
            opts.accepted_staleness_limit,
        );

        emit_report_finished(report.stream_count(), report.unhealthy_count());
        Ok(report)
    }

    /// Explicit bounds win; missing ones come from the life-cycle source, with
    /// the newest bumped by one to cover the upcoming minor.
    async fn resolve_range(&self, opts: &ReportOptions) -> HealthResult<MinorRange> {
        match (opts.oldest_minor, opts.newest_minor) {
            (Some(oldest), Some(newest)) => MinorRange::new(oldest, newest),
            (oldest, newest) => {
                let supported = self.lifecycle.supported_minor_range().await?;
                emit_range_resolved(supported);
                MinorRange::new(
                    oldest.unwrap_or(supported.oldest),
                    newest.unwrap_or(supported.newest.saturating_add(1)),
                )
            }
        }
    }
}

fn log_pass(pass: &str, outcome: &StalenessOutcome) {
    emit_staleness_pass(pass, outcome.empty.len(), outcome.stale.len());
}
