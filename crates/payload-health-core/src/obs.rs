//! Structured observability hooks for report generation.
//!
//! This module provides:
//! - A report-scoped tracing span via [`report_span`]
//! - Emission functions for key lifecycle events: start, range resolution,
//!   pass completion and finish
//!
//! Events are emitted at `info!` level; filter with `RUST_LOG`.

use tracing::info;

use crate::domain::{Architecture, MinorRange};

/// Span covering one report generation.
///
/// # Example
///
/// ```ignore
/// generate(opts).instrument(report_span(Architecture::Amd64)).await
/// // all tracing calls inside are tagged with arch = "amd64"
/// ```
pub fn report_span(arch: Architecture) -> tracing::Span {
    tracing::info_span!("payload_health.report", arch = %arch)
}

/// Emit event: report generation started.
pub fn emit_report_started(arch: Architecture) {
    info!(event = "report.started", arch = %arch);
}

/// Emit event: minor range resolved from the life-cycle source.
pub fn emit_range_resolved(range: MinorRange) {
    info!(
        event = "report.range_resolved",
        oldest = range.oldest,
        newest = range.newest
    );
}

/// Emit event: one staleness pass finished.
pub fn emit_staleness_pass(pass: &str, empty: usize, stale: usize) {
    info!(event = "report.staleness_pass", pass = %pass, empty = empty, stale = stale);
}

/// Emit event: report finished.
pub fn emit_report_finished(streams: usize, unhealthy: usize) {
    info!(
        event = "report.finished",
        streams = streams,
        unhealthy = unhealthy
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_lifecycle_events_are_logged() {
        let span = report_span(Architecture::S390x);
        let _guard = span.enter();
        emit_report_started(Architecture::S390x);
        emit_range_resolved(MinorRange::new(12, 16).unwrap());
        emit_staleness_pass("accepted", 1, 2);
        emit_report_finished(5, 3);

        assert!(logs_contain("report.started"));
        assert!(logs_contain("s390x"));
        assert!(logs_contain("report.range_resolved"));
        assert!(logs_contain("report.staleness_pass"));
        assert!(logs_contain("unhealthy=3"));
    }
}
