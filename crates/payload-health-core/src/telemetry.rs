//! Tracing setup shared by the `payload-health` CLI and the report bot.
//!
//! Filter directives are read from `PAYLOAD_HEALTH_LOG`, then `RUST_LOG`,
//! and fall back to the level the binary asks for.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "PAYLOAD_HEALTH_LOG";

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber, writing to stderr so report text on
/// stdout stays clean.
///
/// `json` switches to newline-delimited JSON log lines. Only the first call
/// in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if json {
        registry.with(layer.json()).try_init().ok();
    } else {
        registry.with(layer).try_init().ok();
    }
}
