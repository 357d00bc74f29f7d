//! Extraction of minor versions and build timestamps from release names.
//!
//! Stream names look like `4.12.0-0.nightly` (optionally with an architecture
//! suffix such as `-arm64`), payload names like
//! `4.12.0-0.nightly-2024-01-01-103000`, and graph versions like `4.11.9`.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::domain::ParseError;

static Z_STREAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"4\.(\d+)\.0-0\.(ci|nightly)").expect("valid z-stream pattern"));

static MINOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"4\.(\d+)\.\d+").expect("valid minor pattern"));

// YYYY-MM-DD-HHMMSS
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}-\d{6}$").expect("valid timestamp pattern")
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Minor version of a `4.<minor>.0-0.(ci|nightly)` stream, `None` for anything else.
pub fn parse_stream_minor(name: &str) -> Option<u32> {
    first_capture(&Z_STREAM_RE, name)
}

/// Minor version of any `4.<minor>.<patch>` name.
pub fn parse_payload_minor(name: &str) -> Option<u32> {
    first_capture(&MINOR_RE, name)
}

/// Like [`parse_stream_minor`], with a [`ParseError`] for the caller to log.
pub fn stream_minor(name: &str) -> Result<u32, ParseError> {
    parse_stream_minor(name).ok_or_else(|| ParseError::StreamName {
        name: name.to_string(),
    })
}

/// Like [`parse_payload_minor`], with a [`ParseError`] for the caller to log.
pub fn payload_minor(name: &str) -> Result<u32, ParseError> {
    parse_payload_minor(name).ok_or_else(|| ParseError::MinorVersion {
        name: name.to_string(),
    })
}

/// Build time encoded in the trailing `YYYY-MM-DD-HHMMSS` of a payload name,
/// read as wall-clock time at `offset`.
pub fn parse_payload_timestamp(
    payload: &str,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, ParseError> {
    let raw = TIMESTAMP_RE
        .find(payload)
        .ok_or_else(|| ParseError::MissingTimestamp {
            payload: payload.to_string(),
        })?
        .as_str();
    let invalid = || ParseError::InvalidTimestamp {
        payload: payload.to_string(),
        raw: raw.to_string(),
    };
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(invalid)
}

fn first_capture(re: &Regex, haystack: &str) -> Option<u32> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
