//! SQLite implementation of the risk event log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;
use vigil_core::{
    Error, IpRiskSummary, NewRiskEvent, RiskEvent, RiskEventKind, error::StorageError,
    repositories::RiskEventLog,
};

pub struct SqliteRiskEventLog {
    pool: SqlitePool,
}

impl SqliteRiskEventLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteRiskEvent {
    id: i64,
    ip: String,
    email: Option<String>,
    user_agent: Option<String>,
    kind: String,
    score_delta: i32,
    details: Option<String>,
    created_at: i64,
}

impl TryFrom<SqliteRiskEvent> for RiskEvent {
    type Error = Error;

    fn try_from(row: SqliteRiskEvent) -> Result<Self, Error> {
        let kind = RiskEventKind::from_str(&row.kind)
            .map_err(StorageError::Database)?;

        Ok(RiskEvent {
            id: row.id,
            ip: row.ip,
            email: row.email,
            user_agent: row.user_agent,
            kind,
            score_delta: row.score_delta,
            details: row.details,
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
        })
    }
}

#[async_trait]
impl RiskEventLog for SqliteRiskEventLog {
    async fn append_deduped(
        &self,
        event: NewRiskEvent,
        window_start: DateTime<Utc>,
    ) -> Result<bool, Error> {
        // Single statement so the dedup check and the insert cannot interleave
        // with a concurrent scorer of the same address.
        let result = sqlx::query(
            r#"
            INSERT INTO risk_events (ip, email, user_agent, kind, score_delta, details, created_at)
            SELECT ?, ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM risk_events
                WHERE ip = ? AND kind = ? AND created_at >= ?
            )
            "#,
        )
        .bind(&event.ip)
        .bind(&event.email)
        .bind(&event.user_agent)
        .bind(event.kind.as_str())
        .bind(event.score_delta)
        .bind(&event.details)
        .bind(Utc::now().timestamp())
        .bind(&event.ip)
        .bind(event.kind.as_str())
        .bind(window_start.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to append risk event");
            StorageError::Database("Failed to append risk event".to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<RiskEvent>, Error> {
        let rows = sqlx::query_as::<_, SqliteRiskEvent>(
            r#"
            SELECT id, ip, email, user_agent, kind, score_delta, details, created_at
            FROM risk_events
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list risk events");
            StorageError::Database("Failed to list risk events".to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn top_ips(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<IpRiskSummary>, Error> {
        #[derive(sqlx::FromRow)]
        struct Row {
            ip: String,
            events: i64,
            total_score_delta: i64,
            last_seen: i64,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT
                ip,
                COUNT(*) AS events,
                SUM(score_delta) AS total_score_delta,
                MAX(created_at) AS last_seen
            FROM risk_events
            WHERE created_at >= ?
            GROUP BY ip
            ORDER BY total_score_delta DESC, events DESC
            LIMIT ?
            "#,
        )
        .bind(since.timestamp())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to aggregate top addresses");
            StorageError::Database("Failed to aggregate top addresses".to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| IpRiskSummary {
                ip: row.ip,
                events: row.events,
                total_score_delta: row.total_score_delta,
                last_seen: DateTime::from_timestamp(row.last_seen, 0).expect("Invalid timestamp"),
            })
            .collect())
    }
}
