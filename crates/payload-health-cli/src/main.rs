//! Payload Health CLI
//!
//! The `payload-health` command prints the health of the release
//! controller's payload streams.
//!
//! ## Commands
//!
//! - `report`: Check accepted/built staleness and upgrade edges for every
//!   stream in the supported minor range

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use payload_health_core::{
    hours, parse_duration, Architecture, Report, ReportGenerator, ReportOptions,
};
use release_controller_client::{ClientConfig, ReleaseControllerClient};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "payload-health")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Release payload stream health reports", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a payload stream health report
    Report {
        #[command(flatten)]
        report: ReportArgs,

        /// Include healthy streams and messages
        #[arg(long)]
        include_healthy: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        /// Also write the JSON report to this file
        #[arg(long)]
        json_file: Option<PathBuf>,

        /// Release controller base URL overriding the per-architecture default
        #[arg(long, env = "RELEASE_CONTROLLER_URL")]
        release_controller_url: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Report thresholds and bounds
#[derive(Args, Debug, Clone)]
struct ReportArgs {
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

    /// Architecture whose release controller is queried
    #[arg(long, default_value = "amd64")]
    arch: Architecture,

    /// Hours east of UTC that payload timestamps are written in
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    timestamp_offset_hours: i32,
}

impl ReportArgs {
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

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    payload_health_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Report {
            report,
            include_healthy,
            output,
            json_file,
            release_controller_url,
        } => {
            let mut config = ClientConfig::from_env();
            if let Some(url) = release_controller_url.as_deref() {
                config = config.with_release_controller_url(url);
            }
            let client = Arc::new(
                ReleaseControllerClient::new(config)
                    .context("Failed to build release controller client")?,
            );
            let generator = ReportGenerator::new(client.clone(), client);

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            cmd_report(
                &generator,
                &report.to_options(),
                include_healthy,
                output,
                json_file.as_deref(),
                &mut out,
            )
            .await
        }
    }
}

async fn cmd_report(
    generator: &ReportGenerator,
    opts: &ReportOptions,
    include_healthy: bool,
    output: OutputFormat,
    json_file: Option<&std::path::Path>,
    out: &mut impl Write,
) -> Result<()> {
    info!(
        arch = %opts.arch,
        accepted_hours = hours(opts.accepted_staleness_limit),
        built_hours = hours(opts.built_staleness_limit),
        upgrade_hours = hours(opts.upgrade_staleness_limit),
        "generating payload health report"
    );
    let report = generator
        .generate(opts)
        .await
        .context("Failed to generate payload health report")?;

    if let Some(path) = json_file {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    write_report(&report, include_healthy, output, out)
}

fn write_report(
    report: &Report,
    include_healthy: bool,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    match output {
        OutputFormat::Text => write!(out, "{}", report.render(include_healthy))?,
        OutputFormat::Json => writeln!(out, "{}", report.to_json_pretty()?)?,
    }
    out.flush()?;
    Ok(())
}
