use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};

use vigil_core::channel::ChannelKind;
use vigil_ports::error::NotifyError;
use vigil_ports::outbound::Notifier;
use vigil_ports::types::{Notification, NotifyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

pub struct EmailNotifier {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Result<Self, NotifyError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::DeliveryFailed(format!("smtp relay: {e}")))?
            .credentials(creds)
            .port(config.smtp_port)
            .build();
        Ok(Self { config, mailer })
    }
}

fn subject(notification: &Notification) -> String {
    let prefix = if notification.escalation {
        "[ESCALATION] "
    } else {
        ""
    };
    format!(
        "{prefix}[{}] {}",
        notification.severity.as_str().to_uppercase(),
        notification.title
    )
}

fn body(notification: &Notification) -> String {
    let mut lines = vec![
        format!("Alert: {}", notification.title),
        format!("Severity: {}", notification.severity.as_str().to_uppercase()),
        format!("Category: {}", notification.category),
        format!("Source: {}", notification.source),
        format!(
            "Time: {}",
            notification.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        String::new(),
        notification.message.clone(),
    ];
    if !notification.metadata.is_empty() {
        lines.push(String::new());
        lines.push("Details:".into());
        for (key, value) in &notification.metadata {
            lines.push(format!("  {key}: {value}"));
        }
    }
    if notification.escalation {
        lines.push(String::new());
        lines.push(format!(
            "This alert escalated to level {} without being resolved.",
            notification.level
        ));
    }
    lines.join("\n")
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        let mut builder = Message::builder()
            .from(
                self.config
                    .from
                    .parse()
                    .map_err(|_| NotifyError::InvalidTarget)?,
            )
            .subject(subject(notification))
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.config.to {
            builder = builder.to(recipient.parse().map_err(|_| NotifyError::InvalidTarget)?);
        }
        let email = builder
            .body(body(notification))
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;
        Ok(NotifyResult::default())
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::test_fixtures::notification;
    use vigil_core::alert::Severity;

    #[test]
    fn subject_carries_severity() {
        let n = notification(Severity::Critical, false);
        assert_eq!(subject(&n), "[CRITICAL] database down");
    }

    #[test]
    fn escalation_prefixes_the_subject() {
        let n = notification(Severity::High, true);
        assert_eq!(subject(&n), "[ESCALATION] [HIGH] database down");
    }

    #[test]
    fn body_includes_metadata_and_escalation_note() {
        let n = notification(Severity::High, true);
        let body = body(&n);
        assert!(body.contains("Source: postgres-primary"));
        assert!(body.contains("error_code: CONNECTION_TIMEOUT"));
        assert!(body.contains("escalated to level 1"));
    }

    #[test]
    fn plain_body_has_no_escalation_note() {
        let n = notification(Severity::Low, false);
        assert!(!body(&n).contains("escalated"));
    }
}
