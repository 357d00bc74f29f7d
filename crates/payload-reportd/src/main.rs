//! Payload report bot daemon
//!
//! Answers chat mentions with payload stream health reports. See
//! `commands::help_text` for the command list.

mod bot;
mod chat;
mod commands;
mod dedup;
mod error;
mod server;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use payload_health_core::{parse_duration, Architecture, ReportGenerator, ReportOptions};
use release_controller_client::{ClientConfig, ReleaseControllerClient};
use std::sync::Arc;
use tracing::{warn, Level};

use crate::bot::{BotSettings, ReportBot};
use crate::chat::{SlackClient, DEFAULT_CHAT_API_URL};
use crate::dedup::EventCache;

#[derive(Parser, Debug)]
#[command(name = "payload-reportd")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat bot serving payload stream health reports", long_about = None)]
struct Config {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Address to listen on for chat events
    #[arg(long, env = "PAYLOAD_REPORTD_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: String,

    /// Chat API token
    #[arg(long, env = "TOKEN", hide_env_values = true, default_value = "")]
    token: String,

    /// Chat API `postMessage` endpoint
    #[arg(long, env = "CHAT_API_URL", default_value = DEFAULT_CHAT_API_URL)]
    chat_api_url: String,

    /// Group mentioned when a report request includes `tag`
    #[arg(long, env = "PATCH_MANAGER_GROUP", default_value = "SMZ7PJ1L0")]
    patch_manager_group: String,

    /// The bot's own user id
    #[arg(long, env = "BOT_USER_ID", default_value = "UE23Q9BFY")]
    bot_user_id: String,

    /// Name that replaces the bot's own mention in outgoing messages
    #[arg(long, default_value = "OCP Payload Reporter")]
    bot_name: String,

    /// Number of event ids remembered for de-duplication
    #[arg(long, default_value_t = 4096)]
    dedup_capacity: u64,

    /// How long an event id is remembered
    #[arg(long, default_value = "1h", value_parser = parse_ttl)]
    dedup_ttl: std::time::Duration,

    /// Release controller base URL overriding the per-architecture default
    #[arg(long, env = "RELEASE_CONTROLLER_URL")]
    release_controller_url: Option<String>,

    #[command(flatten)]
    report: ReportDefaults,
}

/// Defaults applied to every `report` command
#[derive(Args, Debug, Clone)]
struct ReportDefaults {
    /// Oldest minor version to analyze (default: oldest supported)
    #[arg(long)]
    oldest_minor: Option<u32>,

    /// Newest minor version to analyze (default: newest supported + 1)
    #[arg(long)]
    newest_minor: Option<u32>,

    /// Max age of the newest accepted payload
    #[arg(long, default_value = "24h", value_parser = parse_duration)]
    accepted_staleness_limit: chrono::Duration,

    /// Max age of the newest built payload
    #[arg(long, default_value = "72h", value_parser = parse_duration)]
    built_staleness_limit: chrono::Duration,

    /// Max age of a recorded upgrade
    #[arg(long, default_value = "72h", value_parser = parse_duration)]
    upgrade_staleness_limit: chrono::Duration,

    /// Architecture used when a request names none
    #[arg(long, default_value = "amd64")]
    arch: Architecture,

    /// Hours east of UTC that payload timestamps are written in
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    timestamp_offset_hours: i32,
}

impl ReportDefaults {
    fn to_options(&self) -> ReportOptions {
        ReportOptions {
            accepted_staleness_limit: self.accepted_staleness_limit,
            built_staleness_limit: self.built_staleness_limit,
            upgrade_staleness_limit: self.upgrade_staleness_limit,
            oldest_minor: self.oldest_minor,
            newest_minor: self.newest_minor,
            arch: self.arch,
            timestamp_offset_secs: self.timestamp_offset_hours.saturating_mul(3600),
        }
    }
}

fn parse_ttl(raw: &str) -> Result<std::time::Duration, String> {
    parse_duration(raw)
        .map_err(|e| e.to_string())?
        .to_std()
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    payload_health_core::init_tracing(config.json, level);

    let defaults = config.report.to_options();
    defaults
        .validate()
        .context("Invalid report defaults")?;
    if config.token.is_empty() {
        warn!("TOKEN is not set, chat messages will be rejected");
    }

    let mut client_config = ClientConfig::from_env();
    if let Some(url) = config.release_controller_url.as_deref() {
        client_config = client_config.with_release_controller_url(url);
    }
    let client = Arc::new(
        ReleaseControllerClient::new(client_config)
            .context("Failed to build release controller client")?,
    );
    let chat = SlackClient::new(config.chat_api_url.as_str(), config.token.as_str())
        .context("Failed to build chat client")?;

    let bot = ReportBot::new(
        ReportGenerator::new(client.clone(), client),
        Arc::new(chat),
        defaults,
        BotSettings {
            patch_manager_group: config.patch_manager_group,
            bot_user_id: config.bot_user_id,
            bot_name: config.bot_name,
        },
        EventCache::new(config.dedup_capacity, config.dedup_ttl),
    );

    server::serve(Arc::new(bot), &config.listen_addr)
        .await
        .with_context(|| format!("Failed to serve on {}", config.listen_addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_config_definition_is_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_config_flags() {
        let config = Config::try_parse_from([
            "payload-reportd",
            "--listen-addr",
            "127.0.0.1:9090",
            "--dedup-ttl",
            "30m",
            "--newest-minor",
            "17",
            "--arch",
            "multi",
        ])
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9090");
        assert_eq!(config.dedup_ttl, std::time::Duration::from_secs(1800));
        let opts = config.report.to_options();
        assert_eq!(opts.newest_minor, Some(17));
        assert_eq!(opts.arch, Architecture::Multi);
        assert_eq!(opts.built_staleness_limit, chrono::Duration::hours(72));
    }

    #[test]
    fn test_parse_ttl_rejects_garbage() {
        assert!(parse_ttl("forever").is_err());
        assert_eq!(parse_ttl("2d").unwrap(), std::time::Duration::from_secs(172_800));
    }
}
