//! SQLite implementation of the address block list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use vigil_core::{BlockedIp, Error, error::StorageError, repositories::BlockList};

pub struct SqliteBlockList {
    pool: SqlitePool,
}

impl SqliteBlockList {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteBlockedIp {
    id: i64,
    ip: String,
    blocked_until: i64,
    reason: String,
    created_at: i64,
}

impl From<SqliteBlockedIp> for BlockedIp {
    fn from(row: SqliteBlockedIp) -> Self {
        BlockedIp {
            id: row.id,
            ip: row.ip,
            blocked_until: DateTime::from_timestamp(row.blocked_until, 0)
                .expect("Invalid timestamp"),
            reason: row.reason,
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
        }
    }
}

#[async_trait]
impl BlockList for SqliteBlockList {
    async fn find(&self, ip: &str) -> Result<Option<BlockedIp>, Error> {
        let row = sqlx::query_as::<_, SqliteBlockedIp>(
            "SELECT id, ip, blocked_until, reason, created_at FROM blocked_ips WHERE ip = ?",
        )
        .bind(ip)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up block entry");
            StorageError::Database("Failed to look up block entry".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn upsert(
        &self,
        ip: &str,
        blocked_until: DateTime<Utc>,
        reason: &str,
    ) -> Result<BlockedIp, Error> {
        // The unique index on ip serializes concurrent bans of one address:
        // the insert race loser lands in the DO UPDATE arm.
        let row = sqlx::query_as::<_, SqliteBlockedIp>(
            r#"
            INSERT INTO blocked_ips (ip, blocked_until, reason, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(ip) DO UPDATE SET
                blocked_until = excluded.blocked_until,
                reason = excluded.reason
            RETURNING id, ip, blocked_until, reason, created_at
            "#,
        )
        .bind(ip)
        .bind(blocked_until.timestamp())
        .bind(reason)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to upsert block entry");
            StorageError::Database("Failed to upsert block entry".to_string())
        })?;

        Ok(row.into())
    }

    async fn remove(&self, ip: &str) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM blocked_ips WHERE ip = ?")
            .bind(ip)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to remove block entry");
                StorageError::Database("Failed to remove block entry".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<BlockedIp>, Error> {
        let rows = sqlx::query_as::<_, SqliteBlockedIp>(
            r#"
            SELECT id, ip, blocked_until, reason, created_at
            FROM blocked_ips
            WHERE blocked_until > ?
            ORDER BY blocked_until DESC
            "#,
        )
        .bind(now.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list active blocks");
            StorageError::Database("Failed to list active blocks".to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM blocked_ips WHERE blocked_until <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete expired blocks");
                StorageError::Database("Failed to delete expired blocks".to_string())
            })?;

        Ok(result.rows_affected())
    }
}
