//! SQLite implementation of the login attempt log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use vigil_core::{
    Error, LoginAttempt, NewLoginAttempt, error::StorageError, repositories::AttemptLog,
};

pub struct SqliteAttemptLog {
    pool: SqlitePool,
}

impl SqliteAttemptLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteLoginAttempt {
    id: i64,
    ip: String,
    email: Option<String>,
    user_agent: Option<String>,
    success: bool,
    failure_reason: Option<String>,
    correlation_id: Option<String>,
    created_at: i64,
}

impl From<SqliteLoginAttempt> for LoginAttempt {
    fn from(row: SqliteLoginAttempt) -> Self {
        LoginAttempt {
            id: row.id,
            ip: row.ip,
            email: row.email,
            user_agent: row.user_agent,
            success: row.success,
            failure_reason: row.failure_reason,
            correlation_id: row.correlation_id,
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
        }
    }
}

const ATTEMPT_COLUMNS: &str =
    "id, ip, email, user_agent, success, failure_reason, correlation_id, created_at";

#[async_trait]
impl AttemptLog for SqliteAttemptLog {
    async fn record(&self, attempt: NewLoginAttempt) -> Result<LoginAttempt, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteLoginAttempt>(
            format!(
                r#"
            INSERT INTO login_attempts
                (ip, email, user_agent, success, failure_reason, correlation_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {ATTEMPT_COLUMNS}
            "#
            )
            .as_str(),
        )
        .bind(&attempt.ip)
        .bind(&attempt.email)
        .bind(&attempt.user_agent)
        .bind(attempt.success)
        .bind(&attempt.failure_reason)
        .bind(&attempt.correlation_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record login attempt");
            StorageError::Database("Failed to record login attempt".to_string())
        })?;

        Ok(row.into())
    }

    async fn count_failures(&self, ip: &str, since: DateTime<Utc>) -> Result<u32, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM login_attempts WHERE ip = ? AND success = 0 AND created_at >= ?",
        )
        .bind(ip)
        .bind(since.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count failed attempts");
            StorageError::Database("Failed to count failed attempts".to_string())
        })?;

        Ok(count as u32)
    }

    async fn attempts_for_ip(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<LoginAttempt>, Error> {
        let rows = sqlx::query_as::<_, SqliteLoginAttempt>(
            format!(
                r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM login_attempts
            WHERE ip = ? AND created_at >= ?
            ORDER BY created_at DESC
            "#
            )
            .as_str(),
        )
        .bind(ip)
        .bind(since.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list attempts");
            StorageError::Database("Failed to list attempts".to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
