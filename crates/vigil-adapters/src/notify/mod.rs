mod discord;
mod email;
mod slack;
mod stub;
mod telegram;
mod webhook;

pub use discord::{DiscordConfig, DiscordNotifier};
pub use email::{EmailConfig, EmailNotifier};
pub use slack::{SlackConfig, SlackNotifier};
pub use stub::{PushNotifier, SmsNotifier};
pub use telegram::{TelegramConfig, TelegramNotifier};
pub use webhook::{WebhookConfig, WebhookNotifier};

use vigil_ports::error::NotifyError;

/// Bound on every outbound HTTP call. The service wraps sends in its own
/// timeout as well; this keeps a wedged transport from pinning a
/// connection in the meantime.
pub(crate) const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub(crate) fn request_error(err: reqwest::Error) -> NotifyError {
    if err.is_timeout() {
        NotifyError::Timeout
    } else if err.is_connect() {
        NotifyError::ChannelUnavailable
    } else {
        NotifyError::DeliveryFailed(err.to_string())
    }
}

pub(crate) fn check_status(status: reqwest::StatusCode) -> Result<(), NotifyError> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(NotifyError::RateLimited);
    }
    if !status.is_success() {
        return Err(NotifyError::DeliveryFailed(format!(
            "endpoint returned {status}"
        )));
    }
    Ok(())
}
