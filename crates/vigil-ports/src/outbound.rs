use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_core::alert::Alert;
use vigil_core::channel::ChannelKind;
use vigil_core::events::DomainEvent;
use vigil_core::ids::AlertId;

use crate::error::{NotifyError, PortError};
use crate::types::{AlertFilter, Notification, NotificationRecord, NotifyResult, PendingTimer};

/// One notification transport. Implementations are independently
/// configured and independently fallible; the engine never assumes a
/// channel is reliable.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<NotifyResult, NotifyError>;
    fn channel(&self) -> ChannelKind;
}

/// Write-behind audit store. Failures are logged by callers and never
/// block in-memory processing; the active index stays authoritative.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn save_alert(&self, alert: &Alert) -> Result<(), PortError>;
    async fn save_notification(&self, record: &NotificationRecord) -> Result<(), PortError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Alert>, PortError>;
    async fn find_by_filter(&self, filter: &AlertFilter) -> Result<Vec<Alert>, PortError>;
}

/// Scheduling abstraction replacing per-level callback timers: armed
/// entries become due when their fire time passes, and firing one level
/// never depends on another having fired.
#[async_trait]
pub trait EscalationTimerQueue: Send + Sync {
    async fn enqueue(&self, timer: PendingTimer) -> Result<(), PortError>;
    async fn poll_due(&self, now: DateTime<Utc>) -> Result<Vec<PendingTimer>, PortError>;
    async fn cancel_for_alert(&self, alert_id: AlertId) -> Result<(), PortError>;
    async fn mark_fired(&self, id: &str) -> Result<(), PortError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), PortError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
