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
pub struct SlackConfig {
    pub webhook_url: String,
}

pub struct SlackNotifier {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Info | Severity::Low => "good",
        Severity::Medium | Severity::High => "warning",
        Severity::Critical | Severity::Emergency => "danger",
    }
}

fn payload(notification: &Notification) -> serde_json::Value {
    let title = if notification.escalation {
        format!("⚠️ {}", notification.title)
    } else {
        notification.title.clone()
    };
    json!({
        "text": "Monitoring alert",
        "username": "vigil",
        "icon_emoji": ":rotating_light:",
        "attachments": [{
            "color": severity_color(notification.severity),
            "title": title,
            "text": notification.message,
            "fields": [
                {
                    "title": "Severity",
                    "value": notification.severity.as_str().to_uppercase(),
                    "short": true
                },
                {
                    "title": "Category",
                    "value": notification.category,
                    "short": true
                },
                {
                    "title": "Source",
                    "value": notification.source,
                    "short": true
                },
                {
                    "title": "Time",
                    "value": notification.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    "short": true
                }
            ]
        }]
    })
}

#[async_trait]
impl Notifier for SlackNotifier {
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
        ChannelKind::Slack
    }
}
