use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vigil_core::channel::ChannelKind;
use vigil_ports::error::NotifyError;
use vigil_ports::outbound::Notifier;
use vigil_ports::types::{Notification, NotifyResult};

use super::{check_status, request_error, HTTP_TIMEOUT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Raw JSON fan-out: the full notification snapshot is POSTed to every
/// configured URL. Consumers get the same shape the engine sees.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let mut first_error = None;

        for url in &self.config.urls {
            let mut request = self.client.post(url).timeout(HTTP_TIMEOUT);
            for (key, value) in &self.config.headers {
                request = request.header(key, value);
            }
            let result = request
                .json(notification)
                .send()
                .await
                .map_err(request_error)
                .and_then(|response| check_status(response.status()));
            if let Err(err) = result {
                tracing::warn!(url = %url, error = %err, "webhook send failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(NotifyResult::default()),
        }
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Webhook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::test_fixtures::notification;
    use vigil_core::alert::Severity;

    #[test]
    fn notification_serializes_with_escalation_flag() {
        let n = notification(Severity::High, true);
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["title"], "database down");
        assert_eq!(value["severity"], "high");
        assert_eq!(value["escalation"], true);
        assert_eq!(value["level"], 1);
        assert_eq!(value["metadata"]["error_code"], "CONNECTION_TIMEOUT");
    }

    #[test]
    fn headers_default_to_empty() {
        let config: WebhookConfig =
            serde_json::from_str(r#"{"urls": ["https://example.com/hook"]}"#).unwrap();
        assert!(config.headers.is_empty());
        assert_eq!(config.urls.len(), 1);
    }
}
