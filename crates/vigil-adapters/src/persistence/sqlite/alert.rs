use async_trait::async_trait;

use vigil_core::alert::Alert;
use vigil_ports::error::PortError;
use vigil_ports::outbound::AlertStore;
use vigil_ports::types::{AlertFilter, NotificationRecord};

use super::SqliteDb;

#[async_trait]
impl AlertStore for SqliteDb {
    async fn save_alert(&self, alert: &Alert) -> Result<(), PortError> {
        let id = alert.id().to_string();
        let dedup_key = alert.dedup_key().map(|k| k.as_str().to_string());
        let status = alert.status().as_str();
        let severity = alert.severity().as_str();
        let data =
            serde_json::to_string(alert).map_err(|e| PortError::Persistence(e.to_string()))?;
        let created_at = alert.created_at().to_rfc3339();

        sqlx::query(
            "INSERT INTO alerts (id, dedup_key, status, severity, category, source, data, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                dedup_key = excluded.dedup_key,
                status = excluded.status,
                severity = excluded.severity,
                category = excluded.category,
                source = excluded.source,
                data = excluded.data",
        )
        .bind(&id)
        .bind(&dedup_key)
        .bind(status)
        .bind(severity)
        .bind(alert.category())
        .bind(alert.source())
        .bind(&data)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn save_notification(&self, record: &NotificationRecord) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO notifications (id, alert_id, channel, target, status, escalation, error, sent_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(record.id.to_string())
        .bind(record.alert_id.to_string())
        .bind(record.channel.as_str())
        .bind(&record.target)
        .bind(record.delivery.as_str())
        .bind(record.escalation as i32)
        .bind(&record.error)
        .bind(record.sent_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Alert>, PortError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        match row {
            Some((data,)) => {
                let alert: Alert = serde_json::from_str(&data)
                    .map_err(|e| PortError::Persistence(e.to_string()))?;
                Ok(Some(alert))
            }
            None => Ok(None),
        }
    }

    async fn find_by_filter(&self, filter: &AlertFilter) -> Result<Vec<Alert>, PortError> {
        let mut sql = String::from("SELECT data FROM alerts WHERE 1=1");
        let mut binds: Vec<String> = Vec::new();

        if let Some(status) = &filter.status {
            sql.push_str(" AND status = ?");
            binds.push(status.as_str().to_string());
        }
        if let Some(severity) = &filter.severity {
            sql.push_str(" AND severity = ?");
            binds.push(severity.as_str().to_string());
        }
        if let Some(category) = &filter.category {
            sql.push_str(" AND category = ?");
            binds.push(category.clone());
        }
        if let Some(source) = &filter.source {
            sql.push_str(" AND source = ?");
            binds.push(source.clone());
        }

        sql.push_str(" ORDER BY created_at DESC");

        let per_page = if filter.per_page == 0 {
            50
        } else {
            filter.per_page
        };
        let offset = filter.page.saturating_sub(1) * per_page;
        sql.push_str(&format!(" LIMIT {per_page} OFFSET {offset}"));

        let mut query = sqlx::query_as::<_, (String,)>(&sql);
        for b in &binds {
            query = query.bind(b);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        let mut alerts = Vec::with_capacity(rows.len());
        for (data,) in rows {
            let alert: Alert =
                serde_json::from_str(&data).map_err(|e| PortError::Persistence(e.to_string()))?;
            alerts.push(alert);
        }
        Ok(alerts)
    }
}
