pub mod dedup;
pub mod severity;
pub mod status;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::{
    AlertAcknowledged, AlertClosed, AlertCreated, AlertEscalated, AlertResolved, AlertSuppressed,
    DomainEvent,
};
use crate::ids::AlertId;

pub use dedup::DedupKey;
pub use severity::Severity;
pub use status::Status;

pub const RESOLUTION_NOTES_KEY: &str = "resolution_notes";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    id: AlertId,
    title: String,
    message: String,
    severity: Severity,
    category: String,
    source: String,
    status: Status,
    escalation_level: u32,
    dedup_key: Option<DedupKey>,
    tags: BTreeSet<String>,
    metadata: BTreeMap<String, String>,
    created_at: DateTime<Utc>,
    assigned_to: Option<String>,
    acknowledged_by: Option<String>,
    acknowledged_at: Option<DateTime<Utc>>,
    resolved_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        message: String,
        severity: Severity,
        category: String,
        source: String,
        metadata: BTreeMap<String, String>,
        dedup_key: Option<DedupKey>,
        tags: BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> (Self, Vec<DomainEvent>) {
        let id = AlertId::new();
        let alert = Self {
            id,
            title,
            message,
            severity,
            category,
            source: source.clone(),
            status: Status::New,
            escalation_level: 0,
            dedup_key,
            tags,
            metadata,
            created_at: now,
            assigned_to: None,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_by: None,
            resolved_at: None,
        };
        let events = vec![DomainEvent::AlertCreated(AlertCreated {
            alert_id: id,
            severity,
            source,
            occurred_at: now,
        })];
        (alert, events)
    }

    /// Creation-time silencing. Only a fresh alert can be suppressed.
    pub fn suppress(&mut self, rule: &str, now: DateTime<Utc>) -> Vec<DomainEvent> {
        if self.status != Status::New {
            return vec![];
        }
        self.status = Status::Suppressed;
        vec![DomainEvent::AlertSuppressed(AlertSuppressed {
            alert_id: self.id,
            rule: rule.to_string(),
            occurred_at: now,
        })]
    }

    pub fn acknowledge(
        &mut self,
        actor: String,
        now: DateTime<Utc>,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        match self.status {
            Status::Resolved => Err(DomainError::AlertAlreadyResolved),
            Status::Closed => Err(DomainError::AlertClosed),
            Status::Suppressed => Err(DomainError::AlertSuppressed),
            Status::Acknowledged => Ok(vec![]),
            Status::New | Status::InProgress | Status::Escalated => {
                self.status = Status::Acknowledged;
                self.acknowledged_at = Some(now);
                self.acknowledged_by = Some(actor.clone());
                Ok(vec![DomainEvent::AlertAcknowledged(AlertAcknowledged {
                    alert_id: self.id,
                    actor,
                    occurred_at: now,
                })])
            }
        }
    }

    pub fn resolve(
        &mut self,
        actor: String,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        match self.status {
            Status::Resolved | Status::Closed => Ok(vec![]),
            Status::Suppressed => Err(DomainError::AlertSuppressed),
            Status::New | Status::Acknowledged | Status::InProgress | Status::Escalated => {
                self.status = Status::Resolved;
                self.resolved_at = Some(now);
                self.resolved_by = Some(actor.clone());
                if let Some(notes) = notes {
                    self.metadata.insert(RESOLUTION_NOTES_KEY.into(), notes);
                }
                Ok(vec![DomainEvent::AlertResolved(AlertResolved {
                    alert_id: self.id,
                    actor,
                    occurred_at: now,
                })])
            }
        }
    }

    pub fn close(&mut self, now: DateTime<Utc>) -> Result<Vec<DomainEvent>, DomainError> {
        match self.status {
            Status::Closed => Ok(vec![]),
            Status::Resolved => {
                self.status = Status::Closed;
                Ok(vec![DomainEvent::AlertClosed(AlertClosed {
                    alert_id: self.id,
                    occurred_at: now,
                })])
            }
            _ => Err(DomainError::AlertNotResolved),
        }
    }

    /// Time-triggered escalation. Returns no events (and changes nothing)
    /// when the alert is no longer active or the level is stale: timers
    /// for every level are armed at creation and may fire after the alert
    /// left the state they were armed for.
    pub fn escalate(&mut self, level: u32, now: DateTime<Utc>) -> Vec<DomainEvent> {
        if !self.status.is_active() || level <= self.escalation_level {
            return vec![];
        }
        self.escalation_level = level;
        self.status = Status::Escalated;
        vec![DomainEvent::AlertEscalated(AlertEscalated {
            alert_id: self.id,
            level,
            occurred_at: now,
        })]
    }

    pub fn assign(&mut self, actor: String) {
        self.assigned_to = Some(actor);
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn id(&self) -> AlertId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn escalation_level(&self) -> u32 {
        self.escalation_level
    }

    pub fn dedup_key(&self) -> Option<&DedupKey> {
        self.dedup_key.as_ref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.assigned_to.as_deref()
    }

    pub fn acknowledged_by(&self) -> Option<&str> {
        self.acknowledged_by.as_deref()
    }

    pub fn acknowledged_at(&self) -> Option<DateTime<Utc>> {
        self.acknowledged_at
    }

    pub fn resolved_by(&self) -> Option<&str> {
        self.resolved_by.as_deref()
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2025-03-10T14:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn make_alert() -> Alert {
        let (alert, _) = Alert::new(
            "database down".into(),
            "primary refuses connections".into(),
            Severity::Critical,
            "database".into(),
            "postgres-primary".into(),
            BTreeMap::new(),
            Some(DedupKey::new("db-down")),
            BTreeSet::from(["prod".to_string()]),
            now(),
        );
        alert
    }

    #[test]
    fn new_alert_starts_at_level_zero() {
        let alert = make_alert();
        assert_eq!(alert.status(), Status::New);
        assert_eq!(alert.escalation_level(), 0);
        assert!(alert.is_active());
    }

    #[test]
    fn creation_emits_created_event() {
        let (alert, events) = Alert::new(
            "t".into(),
            "m".into(),
            Severity::High,
            "system".into(),
            "server-01".into(),
            BTreeMap::new(),
            None,
            BTreeSet::new(),
            now(),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "alert.created");
        assert_eq!(events[0].alert_id(), alert.id());
    }

    #[test]
    fn acknowledge_records_actor_and_time() {
        let mut alert = make_alert();
        let events = alert.acknowledge("alice".into(), now()).unwrap();
        assert_eq!(alert.status(), Status::Acknowledged);
        assert_eq!(alert.acknowledged_by(), Some("alice"));
        assert_eq!(alert.acknowledged_at(), Some(now()));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "alert.acknowledged");
    }

    #[test]
    fn acknowledge_after_resolve_fails() {
        let mut alert = make_alert();
        alert.resolve("ops".into(), None, now()).unwrap();
        let result = alert.acknowledge("alice".into(), now());
        assert_eq!(result, Err(DomainError::AlertAlreadyResolved));
    }

    #[test]
    fn acknowledge_twice_is_noop() {
        let mut alert = make_alert();
        alert.acknowledge("alice".into(), now()).unwrap();
        let events = alert.acknowledge("bob".into(), now()).unwrap();
        assert!(events.is_empty());
        assert_eq!(alert.acknowledged_by(), Some("alice"));
    }

    #[test]
    fn escalated_alert_can_be_acknowledged() {
        let mut alert = make_alert();
        alert.escalate(1, now());
        let events = alert.acknowledge("alice".into(), now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(alert.status(), Status::Acknowledged);
        // level survives the acknowledgement
        assert_eq!(alert.escalation_level(), 1);
    }

    #[test]
    fn resolve_records_notes_in_metadata() {
        let mut alert = make_alert();
        alert
            .resolve("dba".into(), Some("failover completed".into()), now())
            .unwrap();
        assert_eq!(alert.status(), Status::Resolved);
        assert_eq!(alert.resolved_by(), Some("dba"));
        assert_eq!(
            alert.metadata().get(RESOLUTION_NOTES_KEY).map(String::as_str),
            Some("failover completed")
        );
    }

    #[test]
    fn resolve_twice_is_noop() {
        let mut alert = make_alert();
        alert.resolve("a".into(), None, now()).unwrap();
        let events = alert.resolve("b".into(), None, now()).unwrap();
        assert!(events.is_empty());
        assert_eq!(alert.resolved_by(), Some("a"));
    }

    #[test]
    fn escalation_level_is_monotonic() {
        let mut alert = make_alert();
        assert_eq!(alert.escalate(2, now()).len(), 1);
        assert_eq!(alert.escalation_level(), 2);

        // a stale level-1 timer firing late must not regress the level
        assert!(alert.escalate(1, now()).is_empty());
        assert_eq!(alert.escalation_level(), 2);

        assert_eq!(alert.escalate(3, now()).len(), 1);
        assert_eq!(alert.escalation_level(), 3);
    }

    #[test]
    fn escalate_after_resolve_is_noop() {
        let mut alert = make_alert();
        alert.resolve("ops".into(), None, now()).unwrap();
        let events = alert.escalate(1, now());
        assert!(events.is_empty());
        assert_eq!(alert.status(), Status::Resolved);
        assert_eq!(alert.escalation_level(), 0);
    }

    #[test]
    fn escalate_acknowledged_alert_still_fires() {
        let mut alert = make_alert();
        alert.acknowledge("alice".into(), now()).unwrap();
        let events = alert.escalate(1, now());
        assert_eq!(events.len(), 1);
        assert_eq!(alert.status(), Status::Escalated);
    }

    #[test]
    fn suppress_only_from_new() {
        let mut alert = make_alert();
        let events = alert.suppress("night-window", now());
        assert_eq!(events.len(), 1);
        assert_eq!(alert.status(), Status::Suppressed);

        let mut acked = make_alert();
        acked.acknowledge("alice".into(), now()).unwrap();
        assert!(acked.suppress("night-window", now()).is_empty());
        assert_eq!(acked.status(), Status::Acknowledged);
    }

    #[test]
    fn suppressed_alert_does_not_escalate() {
        let mut alert = make_alert();
        alert.suppress("night-window", now());
        assert!(alert.escalate(1, now()).is_empty());
        assert_eq!(alert.status(), Status::Suppressed);
    }

    #[test]
    fn suppressed_is_terminal_for_transitions() {
        let mut alert = make_alert();
        alert.suppress("night-window", now());
        assert_eq!(
            alert.acknowledge("alice".into(), now()),
            Err(DomainError::AlertSuppressed)
        );
        assert_eq!(
            alert.resolve("alice".into(), None, now()),
            Err(DomainError::AlertSuppressed)
        );
    }

    #[test]
    fn close_requires_resolved() {
        let mut alert = make_alert();
        assert_eq!(alert.close(now()), Err(DomainError::AlertNotResolved));

        alert.resolve("ops".into(), None, now()).unwrap();
        let events = alert.close(now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(alert.status(), Status::Closed);

        // idempotent
        assert!(alert.close(now()).unwrap().is_empty());
    }
}
