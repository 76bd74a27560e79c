use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vigil_core::channel::ChannelKind;
use vigil_ports::error::NotifyError;
use vigil_ports::outbound::Notifier;
use vigil_ports::types::{Notification, NotifyResult};

use super::{check_status, request_error, HTTP_TIMEOUT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_ids: Vec<String>,
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn send_url(&self) -> String {
        format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        )
    }
}

fn message_text(notification: &Notification) -> String {
    let mut text = format!(
        "🚨 Monitoring alert\n\n\
         Title: {}\n\
         Severity: {}\n\
         Category: {}\n\
         Source: {}\n\
         Time: {}\n\n\
         {}",
        notification.title,
        notification.severity.as_str().to_uppercase(),
        notification.category,
        notification.source,
        notification.created_at.format("%Y-%m-%d %H:%M:%S"),
        notification.message,
    );
    if notification.escalation {
        text.push_str(&format!(
            "\n\n⚠️ Escalated to level {}",
            notification.level
        ));
    }
    text.push_str(&format!("\n\nAlert id: {}", notification.alert_id));
    text
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Every configured chat is attempted; the first failure is reported
    /// after the loop so one bad chat id does not silence the rest.
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let text = message_text(notification);
        let url = self.send_url();
        let mut first_error = None;

        for chat_id in &self.config.chat_ids {
            let result = self
                .client
                .post(&url)
                .timeout(HTTP_TIMEOUT)
                .json(&json!({ "chat_id": chat_id, "text": text }))
                .send()
                .await
                .map_err(request_error)
                .and_then(|response| check_status(response.status()));
            if let Err(err) = result {
                tracing::warn!(chat_id = %chat_id, error = %err, "telegram send failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(NotifyResult::default()),
        }
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Telegram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::test_fixtures::notification;
    use vigil_core::alert::Severity;

    #[test]
    fn text_carries_alert_id_and_fields() {
        let n = notification(Severity::Critical, false);
        let text = message_text(&n);
        assert!(text.contains("Title: database down"));
        assert!(text.contains("Severity: CRITICAL"));
        assert!(text.contains(&format!("Alert id: {}", n.alert_id)));
        assert!(!text.contains("Escalated"));
    }

    #[test]
    fn escalation_appends_level_note() {
        let n = notification(Severity::Critical, true);
        assert!(message_text(&n).contains("Escalated to level 1"));
    }

    #[test]
    fn send_url_embeds_the_bot_token() {
        let notifier = TelegramNotifier::new(TelegramConfig {
            bot_token: "123:abc".into(),
            chat_ids: vec!["42".into()],
        });
        assert_eq!(
            notifier.send_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
