//! Shared inputs of one evaluation pass.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::debug;

use crate::domain::MinorRange;
use crate::version::stream_minor;

/// Clock, timestamp offset, minor window and display URL shared by the
/// evaluators. `now` is captured once so every pass of a report agrees on it.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
    pub range: MinorRange,
    pub base_url: String,
}

impl EvalContext {
    pub fn new(range: MinorRange, base_url: impl Into<String>) -> Self {
        Self {
            now: Utc::now(),
            offset: Utc.fix(),
            range,
            base_url: base_url.into(),
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Minor of `stream` when it is a z-stream inside the window.
    pub fn stream_minor_in_range(&self, stream: &str) -> Option<u32> {
        let minor = match stream_minor(stream) {
            Ok(minor) => minor,
            Err(e) => {
                debug!(error = %e, "ignoring non z-stream release");
                return None;
            }
        };
        if !self.range.contains(minor) {
            debug!(
                stream = %stream,
                oldest = self.range.oldest,
                newest = self.range.newest,
                "ignoring release outside the desired minor range"
            );
            return None;
        }
        Some(minor)
    }

    /// Link to a stream on the release controller.
    pub fn stream_url(&self, stream: &str) -> String {
        format!("{}/#{}", self.base_url, stream)
    }
}
