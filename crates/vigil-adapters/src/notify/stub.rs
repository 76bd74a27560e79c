use async_trait::async_trait;

use vigil_core::channel::ChannelKind;
use vigil_ports::error::NotifyError;
use vigil_ports::outbound::Notifier;
use vigil_ports::types::{Notification, NotifyResult};

/// SMS gateway placeholder. Logs and reports success until a real
/// provider is wired in.
#[derive(Debug, Default)]
pub struct SmsNotifier;

#[async_trait]
impl Notifier for SmsNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        tracing::info!(
            alert_id = %notification.alert_id,
            title = %notification.title,
            "sms transport not wired, dropping notification"
        );
        Ok(NotifyResult::default())
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Sms
    }
}

/// Push-notification placeholder, same contract as [`SmsNotifier`].
#[derive(Debug, Default)]
pub struct PushNotifier;

#[async_trait]
impl Notifier for PushNotifier {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError> {
        tracing::info!(
            alert_id = %notification.alert_id,
            title = %notification.title,
            "push transport not wired, dropping notification"
        );
        Ok(NotifyResult::default())
    }

    fn channel(&self) -> ChannelKind {
        ChannelKind::Push
    }
}
