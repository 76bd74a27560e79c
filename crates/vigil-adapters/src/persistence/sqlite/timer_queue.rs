use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_core::ids::AlertId;
use vigil_ports::error::PortError;
use vigil_ports::outbound::EscalationTimerQueue;
use vigil_ports::types::{PendingTimer, TimerKind};

use super::SqliteDb;

fn kind_columns(kind: TimerKind) -> (&'static str, u32) {
    match kind {
        TimerKind::Escalate { level } => ("escalate", level),
        TimerKind::AutoResolve => ("auto_resolve", 0),
    }
}

#[async_trait]
impl EscalationTimerQueue for SqliteDb {
    async fn enqueue(&self, timer: PendingTimer) -> Result<(), PortError> {
        let (kind, level) = kind_columns(timer.kind);

        sqlx::query(
            "INSERT INTO escalation_timers (id, alert_id, kind, level, fires_at, status)
             VALUES (?, ?, ?, ?, ?, 'pending')",
        )
        .bind(&timer.id)
        .bind(timer.alert_id.to_string())
        .bind(kind)
        .bind(level)
        .bind(timer.fires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn poll_due(&self, now: DateTime<Utc>) -> Result<Vec<PendingTimer>, PortError> {
        let rows: Vec<(String, String, String, i64, String)> = sqlx::query_as(
            "SELECT id, alert_id, kind, level, fires_at
             FROM escalation_timers
             WHERE status = 'pending' AND fires_at <= ?
             ORDER BY fires_at ASC",
        )
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        let mut due = Vec::with_capacity(rows.len());
        for (id, alert_id, kind, level, fires_at) in rows {
            let kind = match kind.as_str() {
                "auto_resolve" => TimerKind::AutoResolve,
                _ => TimerKind::Escalate {
                    level: level as u32,
                },
            };
            due.push(PendingTimer {
                id,
                alert_id: AlertId::parse(&alert_id)
                    .map_err(|e| PortError::Persistence(e.to_string()))?,
                kind,
                fires_at: DateTime::parse_from_rfc3339(&fires_at)
                    .map_err(|e| PortError::Persistence(e.to_string()))?
                    .with_timezone(&Utc),
            });
        }
        Ok(due)
    }

    async fn cancel_for_alert(&self, alert_id: AlertId) -> Result<(), PortError> {
        sqlx::query(
            "UPDATE escalation_timers SET status = 'cancelled'
             WHERE alert_id = ? AND status = 'pending'",
        )
        .bind(alert_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn mark_fired(&self, id: &str) -> Result<(), PortError> {
        sqlx::query("UPDATE escalation_timers SET status = 'fired' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        Ok(())
    }
}
