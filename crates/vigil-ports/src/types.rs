use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::alert::{Alert, Severity, Status};
use vigil_core::channel::ChannelKind;
use vigil_core::ids::{AlertId, NotificationId};

/// Alert creation payload, before the engine assigns identity and status.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub category: String,
    pub source: String,
    pub metadata: BTreeMap<String, String>,
    pub dedup_key: Option<String>,
    pub tags: BTreeSet<String>,
}

/// Snapshot handed to channel adapters. Carries everything a transport
/// needs to format a message without reaching back into the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub alert_id: AlertId,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub category: String,
    pub source: String,
    pub status: Status,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub escalation: bool,
    pub level: u32,
}

impl Notification {
    pub fn from_alert(alert: &Alert, escalation: bool) -> Self {
        Self {
            alert_id: alert.id(),
            title: alert.title().to_string(),
            message: alert.message().to_string(),
            severity: alert.severity(),
            category: alert.category().to_string(),
            source: alert.source().to_string(),
            status: alert.status(),
            metadata: alert.metadata().clone(),
            created_at: alert.created_at(),
            escalation,
            level: alert.escalation_level(),
        }
    }
}

/// Delivery metadata returned by notifiers.
#[derive(Debug, Clone, Default)]
pub struct NotifyResult {
    pub external_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Delivered => "delivered",
        }
    }
}

/// One row of the append-only notification audit trail.
#[derive(Debug, Clone)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub alert_id: AlertId,
    pub channel: ChannelKind,
    pub target: String,
    pub delivery: DeliveryStatus,
    pub escalation: bool,
    pub error: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// What a due timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Escalate { level: u32 },
    AutoResolve,
}

/// A one-shot timer waiting in the scheduling queue. All timers for an
/// alert are armed at acceptance and fire independently.
#[derive(Debug, Clone)]
pub struct PendingTimer {
    pub id: String,
    pub alert_id: AlertId,
    pub kind: TimerKind,
    pub fires_at: DateTime<Utc>,
}

/// Filter criteria for querying persisted alerts.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub status: Option<Status>,
    pub severity: Option<Severity>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

/// Counts over the active-alert index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertStats {
    pub total_active: usize,
    pub by_severity: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
}
