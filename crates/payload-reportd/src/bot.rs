//! Mention handling: dispatch a chat event to help, report, or a fallback.

use payload_health_core::{ReportGenerator, ReportOptions};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chat::ChatApi;
use crate::commands::{self, Command, ReportRequest};
use crate::dedup::EventCache;
use crate::error::{BotError, BotResult};

/// Identity and mention settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Group mentioned by `tag`
    pub patch_manager_group: String,
    /// The bot's own user id, never echoed back so it cannot trigger itself
    pub bot_user_id: String,
    pub bot_name: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            patch_manager_group: "SMZ7PJ1L0".to_string(),
            bot_user_id: "UE23Q9BFY".to_string(),
            bot_name: "OCP Payload Reporter".to_string(),
        }
    }
}

/// A message event from the chat platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub ts: String,
}

pub struct ReportBot {
    generator: ReportGenerator,
    chat: Arc<dyn ChatApi>,
    defaults: ReportOptions,
    settings: BotSettings,
    events: EventCache,
}

impl ReportBot {
    pub fn new(
        generator: ReportGenerator,
        chat: Arc<dyn ChatApi>,
        defaults: ReportOptions,
        settings: BotSettings,
        events: EventCache,
    ) -> Self {
        Self {
            generator,
            chat,
            defaults,
            settings,
            events,
        }
    }

    /// Post `text` with the bot's own mention replaced by its name.
    async fn send(&self, text: &str, channel: &str, thread_ts: Option<&str>) -> BotResult<String> {
        let mention = format!("@{}", self.settings.bot_user_id);
        let text = text.replace(&mention, &self.settings.bot_name);
        self.chat.post_message(channel, &text, thread_ts).await
    }

    /// Respond to one mention. Duplicate deliveries are ignored.
    pub async fn handle_event(&self, event: &ChatEvent) -> BotResult<()> {
        if !self.events.first_sighting(&event.ts) {
            debug!(ts = %event.ts, "ignoring duplicate event");
            return Ok(());
        }
        debug!(
            ts = %event.ts,
            kind = %event.kind,
            channel = %event.channel,
            user = %event.user,
            remembered = self.events.len(),
            "saw message event"
        );

        let (subject, body) = match Command::parse(&event.text) {
            Command::Help => (commands::help_text(&self.defaults), None),
            Command::Report => match ReportRequest::parse(&event.text, &self.defaults) {
                Ok(request) => self.report(&request).await,
                Err(message) => {
                    warn!(ts = %event.ts, "{}", message);
                    self.send(&message, &event.channel, Some(&event.ts)).await?;
                    return Err(BotError::InvalidArgument(message));
                }
            },
            Command::Unknown => (commands::unknown_request(&event.text), None),
        };

        let thread = self.send(&subject, &event.channel, Some(&event.ts)).await?;
        if let Some(body) = body {
            self.send(&body, &event.channel, Some(&thread)).await?;
        }
        Ok(())
    }

    /// Subject line and, when generation succeeded, the report body.
    async fn report(&self, request: &ReportRequest) -> (String, Option<String>) {
        let arch = request.options.arch;
        let report = match self.generator.generate(&request.options).await {
            Ok(report) => report,
            Err(e) => {
                warn!(arch = %arch, error = %e, "report generation failed");
                return (commands::generation_failed(&e), None);
            }
        };
        info!(
            arch = %arch,
            streams = report.stream_count(),
            unhealthy = report.unhealthy_count(),
            "posting report"
        );

        let mut body = report.render(request.include_healthy);
        if request.tag {
            body = commands::tag_group(
                &self.settings.patch_manager_group,
                request.include_healthy,
                &body,
            );
        }
        (commands::summary_subject(arch, &report), Some(body))
    }
}
