//! Empty/stale classification of release streams.
//!
//! A stream is *empty* when it lists no payloads, *stale* when none of its
//! payloads is younger than the threshold, and fresh otherwise. Fresh streams
//! appear in neither output set.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::context::EvalContext;
use crate::domain::{hours, ReleaseMap};
use crate::version::parse_payload_timestamp;

/// Result of one staleness pass over a [`ReleaseMap`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StalenessOutcome {
    /// In-range streams without any payload.
    pub empty: BTreeSet<String>,
    /// In-range streams without a fresh payload, with the age of their newest
    /// payload. The age is `None` when no payload timestamp could be parsed.
    #[serde(with = "stale_ages")]
    pub stale: BTreeMap<String, Option<Duration>>,
}

impl StalenessOutcome {
    pub fn is_empty_stream(&self, stream: &str) -> bool {
        self.empty.contains(stream)
    }

    pub fn is_stale_stream(&self, stream: &str) -> bool {
        self.stale.contains_key(stream)
    }
}

/// Classify every in-range stream of `releases` against `threshold`.
///
/// A payload is fresh when `now - timestamp < threshold`; an age equal to the
/// threshold is already stale. Payloads without a parseable timestamp are
/// logged and skipped.
pub fn evaluate_staleness(
    releases: &ReleaseMap,
    threshold: Duration,
    ctx: &EvalContext,
) -> StalenessOutcome {
    let mut outcome = StalenessOutcome::default();

    for (stream, payloads) in releases.iter() {
        if ctx.stream_minor_in_range(stream).is_none() {
            continue;
        }
        if payloads.is_empty() {
            debug!(stream = %stream, "release stream has no payloads");
            outcome.empty.insert(stream.to_string());
            continue;
        }

        let mut fresh = false;
        let mut newest: Option<DateTime<Utc>> = None;
        for payload in payloads {
            let ts = match parse_payload_timestamp(payload, ctx.offset) {
                Ok(ts) => ts,
                Err(e) => {
                    error!(stream = %stream, "unable to get payload timestamp: {}", e);
                    continue;
                }
            };
            let age = ctx.now - ts;
            if age < threshold {
                debug!(
                    stream = %stream,
                    payload = %payload,
                    "payload is fresh: {:.1} hours old (threshold is {:.1})",
                    hours(age),
                    hours(threshold)
                );
                fresh = true;
            } else {
                debug!(
                    stream = %stream,
                    payload = %payload,
                    "payload is stale: {:.1} hours old (threshold is {:.1})",
                    hours(age),
                    hours(threshold)
                );
            }
            if newest.map_or(true, |n| ts > n) {
                newest = Some(ts);
            }
        }

        if !fresh {
            debug!(
                stream = %stream,
                url = %ctx.stream_url(stream),
                "release stream does not have a recent payload"
            );
            outcome
                .stale
                .insert(stream.to_string(), newest.map(|ts| ctx.now - ts));
        }
    }

    outcome
}

mod stale_ages {
    use std::collections::BTreeMap;

    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        ages: &BTreeMap<String, Option<Duration>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        ages.iter()
            .map(|(k, v)| (k, v.map(|d| d.num_seconds())))
            .collect::<BTreeMap<_, _>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, Option<Duration>>, D::Error> {
        let raw = BTreeMap::<String, Option<i64>>::deserialize(d)?;
        Ok(raw
            .into_iter()
            .map(|(k, v)| (k, v.map(Duration::seconds)))
            .collect())
    }
}
