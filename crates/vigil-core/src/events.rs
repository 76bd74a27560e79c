use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alert::Severity;
use crate::channel::ChannelKind;
use crate::escalation::EscalationAction;
use crate::ids::AlertId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DomainEvent {
    AlertCreated(AlertCreated),
    AlertSuppressed(AlertSuppressed),
    AlertDeduplicated(AlertDeduplicated),
    AlertAcknowledged(AlertAcknowledged),
    AlertEscalated(AlertEscalated),
    AlertResolved(AlertResolved),
    AlertClosed(AlertClosed),
    NotificationSent(NotificationSent),
    NotificationFailed(NotificationFailed),
    EscalationActionTriggered(EscalationActionTriggered),
}

impl DomainEvent {
    pub fn alert_id(&self) -> AlertId {
        match self {
            Self::AlertCreated(e) => e.alert_id,
            Self::AlertSuppressed(e) => e.alert_id,
            Self::AlertDeduplicated(e) => e.alert_id,
            Self::AlertAcknowledged(e) => e.alert_id,
            Self::AlertEscalated(e) => e.alert_id,
            Self::AlertResolved(e) => e.alert_id,
            Self::AlertClosed(e) => e.alert_id,
            Self::NotificationSent(e) => e.alert_id,
            Self::NotificationFailed(e) => e.alert_id,
            Self::EscalationActionTriggered(e) => e.alert_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::AlertCreated(e) => e.occurred_at,
            Self::AlertSuppressed(e) => e.occurred_at,
            Self::AlertDeduplicated(e) => e.occurred_at,
            Self::AlertAcknowledged(e) => e.occurred_at,
            Self::AlertEscalated(e) => e.occurred_at,
            Self::AlertResolved(e) => e.occurred_at,
            Self::AlertClosed(e) => e.occurred_at,
            Self::NotificationSent(e) => e.occurred_at,
            Self::NotificationFailed(e) => e.occurred_at,
            Self::EscalationActionTriggered(e) => e.occurred_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AlertCreated(_) => "alert.created",
            Self::AlertSuppressed(_) => "alert.suppressed",
            Self::AlertDeduplicated(_) => "alert.deduplicated",
            Self::AlertAcknowledged(_) => "alert.acknowledged",
            Self::AlertEscalated(_) => "alert.escalated",
            Self::AlertResolved(_) => "alert.resolved",
            Self::AlertClosed(_) => "alert.closed",
            Self::NotificationSent(_) => "notification.sent",
            Self::NotificationFailed(_) => "notification.failed",
            Self::EscalationActionTriggered(_) => "escalation.action_triggered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertCreated {
    pub alert_id: AlertId,
    pub severity: Severity,
    pub source: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSuppressed {
    pub alert_id: AlertId,
    pub rule: String,
    pub occurred_at: DateTime<Utc>,
}

/// Carries the id of the *existing* alert that shadows the new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDeduplicated {
    pub alert_id: AlertId,
    pub dedup_key: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertAcknowledged {
    pub alert_id: AlertId,
    pub actor: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEscalated {
    pub alert_id: AlertId,
    pub level: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertResolved {
    pub alert_id: AlertId,
    pub actor: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertClosed {
    pub alert_id: AlertId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationSent {
    pub alert_id: AlertId,
    pub channel: ChannelKind,
    pub escalation: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationFailed {
    pub alert_id: AlertId,
    pub channel: ChannelKind,
    pub error: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationActionTriggered {
    pub alert_id: AlertId,
    pub action: EscalationAction,
    pub level: u32,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2025-03-10T14:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn event_types_are_unique() {
        let types = [
            "alert.created",
            "alert.suppressed",
            "alert.deduplicated",
            "alert.acknowledged",
            "alert.escalated",
            "alert.resolved",
            "alert.closed",
            "notification.sent",
            "notification.failed",
            "escalation.action_triggered",
        ];
        let mut seen = std::collections::HashSet::new();
        for t in &types {
            assert!(seen.insert(t), "duplicate event type: {t}");
        }
    }

    #[test]
    fn escalation_event_carries_level() {
        let alert_id = AlertId::new();
        let event = DomainEvent::AlertEscalated(AlertEscalated {
            alert_id,
            level: 3,
            occurred_at: now(),
        });
        assert_eq!(event.event_type(), "alert.escalated");
        assert_eq!(event.alert_id(), alert_id);
        assert_eq!(event.occurred_at(), now());
    }

    #[test]
    fn failed_notification_keeps_error_text() {
        let event = DomainEvent::NotificationFailed(NotificationFailed {
            alert_id: AlertId::new(),
            channel: ChannelKind::Slack,
            error: "429 rate limited".into(),
            occurred_at: now(),
        });
        if let DomainEvent::NotificationFailed(e) = &event {
            assert_eq!(e.channel, ChannelKind::Slack);
            assert!(e.error.contains("429"));
        }
        assert_eq!(event.event_type(), "notification.failed");
    }
}
