//! Domain models for payload health reporting.
//!
//! Canonical definitions for the core entities:
//! - `ReleaseMap`: release stream → payload names, accepted or all
//! - `UpgradeGraph`: target version → versions it was upgraded from
//! - `MinorRange` / `Architecture`: what to analyze and where to read it
//! - `ReportOptions`: thresholds and bounds for one report generation

pub mod error;
pub mod graph;
pub mod options;
pub mod stream;

// Re-export main types and errors
pub use error::{HealthError, HealthResult, ParseError};
pub use graph::{GraphDocument, GraphNode, InvalidEdge, UpgradeGraph};
pub use options::{days, hours, parse_duration, ReportOptions};
pub use stream::{Architecture, MinorRange, ReleaseKind, ReleaseMap};
