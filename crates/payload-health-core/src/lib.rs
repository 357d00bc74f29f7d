//! Payload Health Core Library
//!
//! Evaluates release-controller streams for stale payloads and missing
//! upgrade edges, and renders the result as a health report.

pub mod context;
pub mod domain;
pub mod fakes;
pub mod generate;
pub mod lifecycle;
pub mod obs;
pub mod report;
pub mod source;
pub mod staleness;
pub mod telemetry;
pub mod upgrade;
pub mod version;

pub use context::EvalContext;

pub use domain::{
    days, hours, parse_duration, Architecture, GraphDocument, GraphNode, HealthError,
    HealthResult, InvalidEdge, MinorRange, ParseError, ReleaseKind, ReleaseMap, ReportOptions,
    UpgradeGraph,
};

pub use generate::ReportGenerator;
pub use lifecycle::{supported_range, ProductLifeCycleResponse};
pub use report::{ReleaseReport, Report, StalenessFindings};
pub use source::{LifecycleSource, ReleaseSource, STABLE_CHANNEL};
pub use staleness::{evaluate_staleness, StalenessOutcome};
pub use upgrade::{evaluate_upgrades, find_upgrades, UpgradeFinding, UpgradeMatch};
pub use version::{parse_payload_minor, parse_payload_timestamp, parse_stream_minor};

pub use telemetry::init_tracing;

/// Payload health version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
