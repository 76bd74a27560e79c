use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use vigil_core::alert::{dedup, Alert, DedupKey, Status};
use vigil_core::channel::ChannelKind;
use vigil_core::escalation::{EscalationAction, PolicyRegistry};
use vigil_core::events::{
    AlertDeduplicated, DomainEvent, EscalationActionTriggered, NotificationFailed,
    NotificationSent,
};
use vigil_core::ids::{AlertId, NotificationId};
use vigil_core::suppression::{self, SuppressionRule};
use vigil_ports::error::NotifyError;
use vigil_ports::outbound::{AlertStore, EscalationTimerQueue, EventPublisher, Notifier};
use vigil_ports::types::{
    AlertStats, DeliveryStatus, NewAlert, Notification, NotificationRecord, PendingTimer,
    TimerKind,
};

use crate::error::AppError;

/// Actor recorded when a policy resolves an alert on its own.
pub const AUTO_RESOLVE_ACTOR: &str = "auto-resolver";

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// The alert lifecycle manager. Owns the active-alert index, applies
/// suppression and deduplication at creation, fans notifications out to
/// the configured channels and drives time-triggered escalation.
///
/// The in-memory index is authoritative; the store is a write-behind
/// audit log whose failures are logged and swallowed. The index mutex is
/// never held across an await point, so a hung channel cannot wedge
/// unrelated alerts.
pub struct AlertService<S, Q, P>
where
    S: AlertStore,
    Q: EscalationTimerQueue,
    P: EventPublisher,
{
    store: S,
    timers: Q,
    events: P,
    policies: PolicyRegistry,
    suppression_rules: Vec<SuppressionRule>,
    notifiers: HashMap<ChannelKind, Arc<dyn Notifier>>,
    active: Mutex<HashMap<AlertId, Alert>>,
    send_timeout: Duration,
}

impl<S, Q, P> AlertService<S, Q, P>
where
    S: AlertStore,
    Q: EscalationTimerQueue,
    P: EventPublisher,
{
    pub fn new(
        store: S,
        timers: Q,
        events: P,
        policies: PolicyRegistry,
        suppression_rules: Vec<SuppressionRule>,
        notifiers: HashMap<ChannelKind, Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            store,
            timers,
            events,
            policies,
            suppression_rules,
            notifiers,
            active: Mutex::new(HashMap::new()),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Bound on each outbound channel send. Defaults to 30 seconds.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Create an alert. Always returns an id: a suppressed or
    /// deduplicated alert short-circuits silently, exactly like an
    /// accepted one from the caller's point of view.
    pub async fn create(&self, new_alert: NewAlert, now: DateTime<Utc>) -> AlertId {
        let (mut alert, created_events) = Alert::new(
            new_alert.title,
            new_alert.message,
            new_alert.severity,
            new_alert.category,
            new_alert.source,
            new_alert.metadata,
            new_alert.dedup_key.map(DedupKey::new),
            new_alert.tags,
            now,
        );
        let alert_id = alert.id();

        if let Some(rule) = suppression::first_match(&self.suppression_rules, &alert) {
            let rule_name = rule.name().to_string();
            let suppressed_events = alert.suppress(&rule_name, now);
            tracing::info!(%alert_id, rule = %rule_name, "alert suppressed at creation");
            self.persist(&alert).await;
            self.publish(created_events).await;
            self.publish(suppressed_events).await;
            return alert_id;
        }

        // Dedup check and insertion under one lock: two racing creates
        // with the same key must not both become active.
        let dedup_key = alert.dedup_key().cloned();
        let shadowed_by = {
            let mut active = self.active.lock().unwrap();
            let existing = dedup_key
                .as_ref()
                .and_then(|key| dedup::find_duplicate(key, active.values()).map(Alert::id));
            match existing {
                Some(existing_id) => Some(existing_id),
                None => {
                    active.insert(alert_id, alert.clone());
                    None
                }
            }
        };

        if let Some(existing_id) = shadowed_by {
            let key = dedup_key.map(|k| k.to_string()).unwrap_or_default();
            tracing::info!(%alert_id, %existing_id, dedup_key = %key, "duplicate alert dropped");
            self.publish(vec![DomainEvent::AlertDeduplicated(AlertDeduplicated {
                alert_id: existing_id,
                dedup_key: key,
                occurred_at: now,
            })])
            .await;
            return alert_id;
        }

        tracing::info!(%alert_id, severity = %alert.severity(), source = alert.source(), "alert created");
        self.persist(&alert).await;
        self.publish(created_events).await;

        match self.policies.lookup(alert.severity()) {
            Some(policy) => {
                self.dispatch(&alert, policy.initial_channels(), false, now).await;
                self.arm_timers(&alert).await;
            }
            None => {
                tracing::debug!(%alert_id, severity = %alert.severity(), "no policy for severity, alert will not notify or escalate");
            }
        }

        alert_id
    }

    /// Returns false for an unknown id or an untransitionable status.
    /// Acknowledging does not stop escalation; only resolution does.
    pub async fn acknowledge(&self, alert_id: AlertId, actor: String, now: DateTime<Utc>) -> bool {
        let (snapshot, events) = {
            let mut active = self.active.lock().unwrap();
            let Some(alert) = active.get_mut(&alert_id) else {
                return false;
            };
            match alert.acknowledge(actor, now) {
                Ok(events) => (alert.clone(), events),
                Err(err) => {
                    tracing::debug!(%alert_id, error = %err, "acknowledge rejected");
                    return false;
                }
            }
        };
        tracing::info!(%alert_id, actor = snapshot.acknowledged_by().unwrap_or(""), "alert acknowledged");
        self.persist(&snapshot).await;
        self.publish(events).await;
        true
    }

    /// Returns false for an unknown id. The only caller-reachable way to
    /// permanently halt escalation. Pending timers are cancelled as an
    /// optimization; a timer that slips through no-ops on the terminal
    /// status check in [`escalate`](Self::escalate).
    pub async fn resolve(
        &self,
        alert_id: AlertId,
        actor: String,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        let (snapshot, events) = {
            let mut active = self.active.lock().unwrap();
            let Some(alert) = active.get_mut(&alert_id) else {
                return false;
            };
            match alert.resolve(actor, notes, now) {
                Ok(events) => (alert.clone(), events),
                Err(err) => {
                    tracing::debug!(%alert_id, error = %err, "resolve rejected");
                    return false;
                }
            }
        };
        if let Err(err) = self.timers.cancel_for_alert(alert_id).await {
            tracing::warn!(%alert_id, error = %err, "failed to cancel pending escalation timers");
        }
        tracing::info!(%alert_id, actor = snapshot.resolved_by().unwrap_or(""), "alert resolved");
        self.persist(&snapshot).await;
        self.publish(events).await;
        true
    }

    /// External record-keeping transition; the engine never closes alerts
    /// itself. Only a resolved alert can be closed.
    pub async fn close(&self, alert_id: AlertId, now: DateTime<Utc>) -> bool {
        let (snapshot, events) = {
            let mut active = self.active.lock().unwrap();
            let Some(alert) = active.get_mut(&alert_id) else {
                return false;
            };
            match alert.close(now) {
                Ok(events) => (alert.clone(), events),
                Err(err) => {
                    tracing::debug!(%alert_id, error = %err, "close rejected");
                    return false;
                }
            }
        };
        self.persist(&snapshot).await;
        self.publish(events).await;
        true
    }

    /// Timer-driven escalation to `level`. Not part of the caller-facing
    /// surface: the scheduler invokes it when an armed timer fires.
    ///
    /// Silently abandoned when the alert is unknown, no longer active,
    /// already past `level`, or its policy has no channels for the level.
    /// A resolve racing this call wins or loses on the index lock; a
    /// late read may still emit one final round, which is the documented
    /// best-effort behavior.
    pub async fn escalate(&self, alert_id: AlertId, level: u32, now: DateTime<Utc>) {
        let (snapshot, events, channels, action) = {
            let mut active = self.active.lock().unwrap();
            let Some(alert) = active.get_mut(&alert_id) else {
                return;
            };
            let Some(policy) = self.policies.lookup(alert.severity()) else {
                return;
            };
            let channels = policy.channels_at(level).to_vec();
            if channels.is_empty() {
                return;
            }
            let action = policy.action_at(level);
            let events = alert.escalate(level, now);
            if events.is_empty() {
                return;
            }
            (alert.clone(), events, channels, action)
        };

        tracing::warn!(%alert_id, level, "alert escalated");
        self.persist(&snapshot).await;
        self.publish(events).await;
        self.dispatch(&snapshot, &channels, true, now).await;
        if let Some(action) = action {
            self.execute_action(&snapshot, action, level, now).await;
        }
    }

    /// Drain due timers once. Called by the scheduler loop; exposed so
    /// tests and embedders can drive time explicitly.
    pub async fn fire_due_timers(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let due = self.timers.poll_due(now).await?;
        let fired = due.len();
        for timer in due {
            match timer.kind {
                TimerKind::Escalate { level } => {
                    self.escalate(timer.alert_id, level, now).await;
                }
                TimerKind::AutoResolve => {
                    self.auto_resolve(timer.alert_id, now).await;
                }
            }
            if let Err(err) = self.timers.mark_fired(&timer.id).await {
                tracing::warn!(timer_id = %timer.id, error = %err, "failed to mark timer fired");
            }
        }
        Ok(fired)
    }

    pub fn get(&self, alert_id: AlertId) -> Option<Alert> {
        self.active.lock().unwrap().get(&alert_id).cloned()
    }

    /// Tracked alerts that still hold an active status, oldest first.
    pub fn active_alerts(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .active
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.is_active())
            .cloned()
            .collect();
        alerts.sort_by_key(Alert::created_at);
        alerts
    }

    /// Counts over the tracked index, including resolved alerts that have
    /// not been swept away (the engine never deletes).
    pub fn stats(&self) -> AlertStats {
        let active = self.active.lock().unwrap();
        let mut stats = AlertStats::default();
        for alert in active.values() {
            if alert.is_active() {
                stats.total_active += 1;
            }
            *stats
                .by_severity
                .entry(alert.severity().as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_status
                .entry(alert.status().as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }

    async fn auto_resolve(&self, alert_id: AlertId, now: DateTime<Utc>) {
        let still_open = self
            .get(alert_id)
            .map(|a| a.status() != Status::Resolved && a.status() != Status::Closed)
            .unwrap_or(false);
        if !still_open {
            return;
        }
        tracing::info!(%alert_id, "auto-resolve deadline reached");
        self.resolve(alert_id, AUTO_RESOLVE_ACTOR.into(), None, now).await;
    }

    /// Arm one independent timer per scheduled level, plus the optional
    /// auto-resolve deadline. All fire times are measured from the
    /// alert's creation timestamp, not from each other.
    async fn arm_timers(&self, alert: &Alert) {
        let Some(policy) = self.policies.lookup(alert.severity()) else {
            return;
        };
        let mut pending: Vec<PendingTimer> = policy
            .scheduled_levels()
            .map(|(level, delay)| PendingTimer {
                id: Uuid::new_v4().to_string(),
                alert_id: alert.id(),
                kind: TimerKind::Escalate { level },
                fires_at: alert.created_at() + delay,
            })
            .collect();
        if let Some(delay) = policy.auto_resolve_after() {
            pending.push(PendingTimer {
                id: Uuid::new_v4().to_string(),
                alert_id: alert.id(),
                kind: TimerKind::AutoResolve,
                fires_at: alert.created_at() + delay,
            });
        }
        for timer in pending {
            if let Err(err) = self.timers.enqueue(timer).await {
                tracing::warn!(alert_id = %alert.id(), error = %err, "failed to arm escalation timer");
            }
        }
    }

    /// Concurrent per-channel fan-out. Every send gets its own timeout,
    /// every attempt gets an audit record; one channel failing or hanging
    /// neither blocks the others nor reaches the caller.
    async fn dispatch(
        &self,
        alert: &Alert,
        channels: &[ChannelKind],
        escalation: bool,
        now: DateTime<Utc>,
    ) {
        if channels.is_empty() {
            return;
        }
        let notification = Notification::from_alert(alert, escalation);
        let sends = channels.iter().map(|&kind| {
            let notification = notification.clone();
            async move {
                let outcome = match self.notifiers.get(&kind) {
                    Some(notifier) => {
                        match tokio::time::timeout(self.send_timeout, notifier.notify(&notification))
                            .await
                        {
                            Ok(Ok(_)) => Ok(()),
                            Ok(Err(err)) => Err(err.to_string()),
                            Err(_) => Err(NotifyError::Timeout.to_string()),
                        }
                    }
                    None => Err(format!("no adapter configured for channel {kind}")),
                };
                (kind, outcome)
            }
        });
        let results = futures::future::join_all(sends).await;

        let mut events = Vec::with_capacity(results.len());
        for (kind, outcome) in results {
            let (delivery, error) = match outcome {
                Ok(()) => (DeliveryStatus::Sent, None),
                Err(err) => {
                    tracing::warn!(alert_id = %alert.id(), channel = %kind, error = %err, "notification failed");
                    (DeliveryStatus::Failed, Some(err))
                }
            };
            let record = NotificationRecord {
                id: NotificationId::new(),
                alert_id: alert.id(),
                channel: kind,
                target: "system".into(),
                delivery,
                escalation,
                error: error.clone(),
                sent_at: now,
            };
            if let Err(err) = self.store.save_notification(&record).await {
                tracing::warn!(alert_id = %alert.id(), error = %err, "failed to record notification");
            }
            events.push(match error {
                None => DomainEvent::NotificationSent(NotificationSent {
                    alert_id: alert.id(),
                    channel: kind,
                    escalation,
                    occurred_at: now,
                }),
                Some(error) => DomainEvent::NotificationFailed(NotificationFailed {
                    alert_id: alert.id(),
                    channel: kind,
                    error,
                    occurred_at: now,
                }),
            });
        }
        self.publish(events).await;
    }

    /// Policy-declared side effect for a level. Everything except
    /// auto-resolve is a named stub: the transports behind paging and
    /// broadcast live outside this engine.
    async fn execute_action(
        &self,
        alert: &Alert,
        action: EscalationAction,
        level: u32,
        now: DateTime<Utc>,
    ) {
        self.publish(vec![DomainEvent::EscalationActionTriggered(
            EscalationActionTriggered {
                alert_id: alert.id(),
                action,
                level,
                occurred_at: now,
            },
        )])
        .await;
        match action {
            EscalationAction::NotifyNextLevel => {
                // the level's fan-out already went out
            }
            EscalationAction::EscalateManager => {
                tracing::info!(alert_id = %alert.id(), "escalating to manager");
            }
            EscalationAction::CallOnDuty => {
                tracing::info!(alert_id = %alert.id(), "calling on-duty engineer");
            }
            EscalationAction::TriggerPaging => {
                tracing::info!(alert_id = %alert.id(), "triggering paging system");
            }
            EscalationAction::SmsBroadcast => {
                tracing::info!(alert_id = %alert.id(), "broadcasting sms");
            }
            EscalationAction::AutoResolve => {
                self.resolve(alert.id(), AUTO_RESOLVE_ACTOR.into(), None, now).await;
            }
        }
    }

    async fn persist(&self, alert: &Alert) {
        if let Err(err) = self.store.save_alert(alert).await {
            tracing::warn!(alert_id = %alert.id(), error = %err, "failed to persist alert, in-memory state stays authoritative");
        }
    }

    async fn publish(&self, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }
        if let Err(err) = self.events.publish(events).await {
            tracing::warn!(error = %err, "failed to publish domain events");
        }
    }
}
