use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vigil_core::alert::Severity;
use vigil_core::channel::ChannelKind;
use vigil_ports::error::NotifyError;
use vigil_ports::outbound::Notifier;
use vigil_ports::types::{Notification, NotifyResult};

use super::{check_status, request_error, HTTP_TIMEOUT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

pub struct DiscordNotifier {
    config: DiscordConfig,
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::Info | Severity::Low => 0x00FF00,
        Severity::Medium => 0xFFFF00,
        Severity::High => 0xFF8000,
        Severity::Critical | Severity::Emergency => 0xFF0000,
    }
}

fn payload(notification: &Notification) -> serde_json::Value {
    let title = if notification.escalation {
        format!("⚠️ Escalated alert - {}", notification.title)
    } else {
        format!("Monitoring alert - {}", notification.title)
    };
    json!({
        "embeds": [{
            "title": title,
            "description": notification.message,
            "color": severity_color(notification.severity),
            "fields": [
                {
                    "name": "Severity",
                    "value": notification.severity.as_str().to_uppercase(),
                    "inline": true
                },
                {
                    "name": "Category",
                    "value": notification.category,
                    "inline": true
                },
                {
                    "name": "Source",
                    "value": notification.source,
                    "inline": true
                },
                {
                    "name": "Level",
                    "value": notification.level.to_string(),
                    "inline": true
                }
            ],
            "timestamp": notification.created_at.to_rfc3339(),
            "footer": { "text": "vigil" }
        }]
    })
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .timeout(HTTP_TIMEOUT)
            .json(&payload(notification))
            .send()
            .await
            .map_err(request_error)?;
        check_status(response.status())?;
        Ok(NotifyResult::default())
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Discord
    }
}
