use async_trait::async_trait;

use vigil_core::events::DomainEvent;
use vigil_ports::error::PortError;
use vigil_ports::outbound::EventPublisher;

use super::SqliteDb;

/// Append-only event log. One row per domain event, payload as JSON.
#[async_trait]
impl EventPublisher for SqliteDb {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), PortError> {
        for event in events {
            let data = serde_json::to_string(&event)
                .map_err(|e| PortError::Persistence(e.to_string()))?;

            sqlx::query(
                "INSERT INTO events (event_type, alert_id, data, occurred_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(event.event_type())
            .bind(event.alert_id().to_string())
            .bind(&data)
            .bind(event.occurred_at().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use vigil_core::events::{AlertEscalated, AlertResolved};
    use vigil_core::ids::AlertId;

    fn ts(s: &str) -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn events_append_in_order() {
        let db = SqliteDb::new("sqlite::memory:").await.unwrap();
        let alert_id = AlertId::new();

        db.publish(vec![
            DomainEvent::AlertEscalated(AlertEscalated {
                alert_id,
                level: 1,
                occurred_at: ts("2025-03-10T14:05:00Z"),
            }),
            DomainEvent::AlertResolved(AlertResolved {
                alert_id,
                actor: "ops".into(),
                occurred_at: ts("2025-03-10T14:10:00Z"),
            }),
        ])
        .await
        .unwrap();

        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT event_type, alert_id FROM events ORDER BY id")
                .fetch_all(db.pool())
                .await
                .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "alert.escalated");
        assert_eq!(rows[1].0, "alert.resolved");
        assert_eq!(rows[0].1, alert_id.to_string());
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let db = SqliteDb::new("sqlite::memory:").await.unwrap();
        db.publish(vec![]).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
