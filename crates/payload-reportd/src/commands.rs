//! Chat command parsing and the fixed bot texts.

use payload_health_core::{hours, Architecture, Report, ReportOptions};

/// What a mention asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Report,
    Unknown,
}

impl Command {
    /// `help` wins over `report` when a message contains both.
    pub fn parse(text: &str) -> Self {
        if text.contains("help") {
            Command::Help
        } else if text.contains("report") {
            Command::Report
        } else {
            Command::Unknown
        }
    }
}

/// A `report` command with its arguments applied to a copy of the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub options: ReportOptions,
    pub include_healthy: bool,
    pub tag: bool,
}

impl ReportRequest {
    /// Apply the words of `text` to `defaults`.
    ///
    /// Recognized words are `healthy`, `tag`, `min=N`, `max=N` and
    /// `arch=X`; anything else is ignored. The error is the message posted
    /// back to the thread.
    pub fn parse(text: &str, defaults: &ReportOptions) -> Result<Self, String> {
        let mut request = ReportRequest {
            options: defaults.clone(),
            include_healthy: false,
            tag: false,
        };

        for word in text.split_whitespace() {
            match word {
                "tag" => request.tag = true,
                "healthy" => request.include_healthy = true,
                _ => {}
            }
            let Some((key, value)) = word.split_once('=') else {
                continue;
            };
            match key {
                "min" => {
                    let minor = value.parse::<u32>().map_err(|e| {
                        format!("Error parsing min z-stream version value {:?}: {}", value, e)
                    })?;
                    request.options.oldest_minor = Some(minor);
                }
                "max" => {
                    let minor = value.parse::<u32>().map_err(|e| {
                        format!("Error parsing max z-stream version value {:?}: {}", value, e)
                    })?;
                    request.options.newest_minor = Some(minor);
                }
                "arch" => {
                    let arch = value.parse::<Architecture>().map_err(|e| {
                        format!("Error parsing architecture value {:?}: {}", value, e)
                    })?;
                    request.options.arch = arch;
                }
                _ => {}
            }
        }
        Ok(request)
    }
}

fn bound_label(bound: Option<u32>, fallback: &str) -> String {
    match bound {
        Some(minor) => format!("*4.{}*", minor),
        None => fallback.to_string(),
    }
}

/// Help text listing the commands and the bot's current defaults.
pub fn help_text(defaults: &ReportOptions) -> String {
    let arches = Architecture::ALL
        .iter()
        .map(|a| format!("*{}*", a))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "*help* - this help text
*report* - Generates human reports about which release streams do not have recently built or recently accepted payloads, based on the release info found at {} or the equivalent page for the architecture specified in the request.
Arguments:
  *min=X* - only look at z-streams with a minimum version of X, e.g. *min=9*
  *max=X* - only look at z-streams with a maximum version of X, e.g. *max=12*
  *arch=X* - look at architecture X, where X is one of [{}]
  *healthy* - include healthy z-streams in the report
  *tag* - tag patch manager with the report output
Current settings/defaults:
  Accepted payloads must be newer than *{:.1}* hours
  Payloads must have been built within the last *{:.1}* hours
  Upgrades must have been recorded within the last *{:.1}* hours
  Default: Included releases are >={} and <={}
  Default: Architecture is *{}*
  Default: Fully healthy z-streams are not included in the report",
        Architecture::Amd64.release_controller_url(),
        arches,
        hours(defaults.accepted_staleness_limit),
        hours(defaults.built_staleness_limit),
        hours(defaults.upgrade_staleness_limit),
        bound_label(defaults.oldest_minor, "the oldest supported release"),
        bound_label(defaults.newest_minor, "one past the newest supported release"),
        defaults.arch,
    )
}

/// Thread subject summarizing `report`.
pub fn summary_subject(arch: Architecture, report: &Report) -> String {
    format!(
        "Latest payload stream health report thread for `{}`, `v4.{}` to `v4.{}` ({} of {} streams unhealthy)",
        arch,
        report.oldest_minor,
        report.newest_minor,
        report.unhealthy_count(),
        report.stream_count()
    )
}

/// Prefix `body` with a mention of the patch-manager group.
pub fn tag_group(group_id: &str, include_healthy: bool, body: &str) -> String {
    if include_healthy {
        format!(
            "<!subteam^{}> here is the latest payload health report\n\n{}",
            group_id, body
        )
    } else {
        format!(
            "<!subteam^{}> here are the currently unhealthy payload streams that need investigation:\n\n{}",
            group_id, body
        )
    }
}

pub fn unknown_request(text: &str) -> String {
    format!("Sorry, I couldn't process that request: {}", text)
}

pub fn generation_failed(err: &dyn std::fmt::Display) -> String {
    format!("Sorry, an error occurred generating the report: {}", err)
}
