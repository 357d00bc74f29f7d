//! Report configuration.
//!
//! [`ReportOptions`] is a plain value: binaries build one from flags, the bot
//! clones it per request to apply overrides, and nothing mutates a shared copy.

use chrono::{Duration, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::error::{HealthError, HealthResult};
use super::stream::{Architecture, MinorRange};

/// Default window for the newest accepted payload.
pub const DEFAULT_ACCEPTED_STALENESS_HOURS: i64 = 24;
/// Default window for the newest built payload.
pub const DEFAULT_BUILT_STALENESS_HOURS: i64 = 72;
/// Default window for a recorded upgrade edge.
pub const DEFAULT_UPGRADE_STALENESS_HOURS: i64 = 72;

/// Inputs of a single report generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// How old the newest accepted payload may be.
    #[serde(with = "duration_secs")]
    pub accepted_staleness_limit: Duration,
    /// How old the newest built payload may be.
    #[serde(with = "duration_secs")]
    pub built_staleness_limit: Duration,
    /// How old a recorded upgrade may be and still count.
    #[serde(with = "duration_secs")]
    pub upgrade_staleness_limit: Duration,
    /// Oldest minor to analyze; looked up from the product life cycle when unset.
    pub oldest_minor: Option<u32>,
    /// Newest minor to analyze; looked up (plus one) when unset.
    pub newest_minor: Option<u32>,
    pub arch: Architecture,
    /// Offset in seconds east of UTC used to read payload timestamps.
    pub timestamp_offset_secs: i32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            accepted_staleness_limit: Duration::hours(DEFAULT_ACCEPTED_STALENESS_HOURS),
            built_staleness_limit: Duration::hours(DEFAULT_BUILT_STALENESS_HOURS),
            upgrade_staleness_limit: Duration::hours(DEFAULT_UPGRADE_STALENESS_HOURS),
            oldest_minor: None,
            newest_minor: None,
            arch: Architecture::default(),
            timestamp_offset_secs: 0,
        }
    }
}

impl ReportOptions {
    /// Reject contradictory settings. Runs before anything is fetched.
    pub fn validate(&self) -> HealthResult<()> {
        if let (Some(oldest), Some(newest)) = (self.oldest_minor, self.newest_minor) {
            MinorRange::new(oldest, newest)?;
        }
        for (name, limit) in [
            ("accepted", self.accepted_staleness_limit),
            ("built", self.built_staleness_limit),
            ("upgrade", self.upgrade_staleness_limit),
        ] {
            if limit <= Duration::zero() {
                return Err(HealthError::Config(format!(
                    "{} staleness limit must be positive",
                    name
                )));
            }
        }
        self.timestamp_offset()?;
        Ok(())
    }

    /// Offset payload timestamps are interpreted in.
    pub fn timestamp_offset(&self) -> HealthResult<FixedOffset> {
        FixedOffset::east_opt(self.timestamp_offset_secs).ok_or_else(|| {
            HealthError::Config(format!(
                "timestamp offset of {} seconds is out of range",
                self.timestamp_offset_secs
            ))
        })
    }
}

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(s|m|h|d)$").expect("valid duration pattern"));

/// Parse `90m`, `24h`, `1.5d` style durations.
pub fn parse_duration(raw: &str) -> HealthResult<Duration> {
    let invalid = || HealthError::Config(format!("invalid duration {:?}, expected e.g. 24h", raw));
    let caps = DURATION_RE.captures(raw.trim()).ok_or_else(invalid)?;
    let value: f64 = caps[1].parse().map_err(|_| invalid())?;
    let unit_secs = match &caps[2] {
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        _ => 86_400.0,
    };
    let millis = value * unit_secs * 1000.0;
    if !millis.is_finite() || millis > i64::MAX as f64 / 2.0 {
        return Err(invalid());
    }
    Ok(Duration::milliseconds(millis.round() as i64))
}

/// Fractional days, the unit every report message uses.
pub fn days(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 86_400_000.0
}

/// Fractional hours, used by the bot help text.
pub fn hours(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 3_600_000.0
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("90m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_duration("1.5d").unwrap(), Duration::hours(36));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("24").is_err());
        assert!(parse_duration("-1h").is_err());
        assert!(parse_duration("1w").is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        let opts = ReportOptions::default();
        assert!(opts.validate().is_ok());
        assert_eq!(opts.accepted_staleness_limit, Duration::hours(24));
        assert_eq!(opts.arch, Architecture::Amd64);
    }

    #[test]
    fn test_validate_rejects_inverted_minor_bounds() {
        let opts = ReportOptions {
            oldest_minor: Some(14),
            newest_minor: Some(12),
            ..ReportOptions::default()
        };
        assert!(matches!(opts.validate(), Err(HealthError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let opts = ReportOptions {
            built_staleness_limit: Duration::zero(),
            ..ReportOptions::default()
        };
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().contains("built"));
    }

    #[test]
    fn test_days_conversion() {
        assert!((days(Duration::hours(36)) - 1.5).abs() < 1e-9);
        assert!((hours(Duration::minutes(90)) - 1.5).abs() < 1e-9);
    }
}
