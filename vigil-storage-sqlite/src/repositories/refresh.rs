//! SQLite implementation of the refresh token store.
//!
//! Rotation is the critical path here: revoking the presented record and
//! inserting its successor happen inside one transaction, with a conditional
//! update guarding against concurrent rotations of the same token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use vigil_core::{
    Error, RefreshToken, UserId,
    error::{StorageError, TokenError},
    repositories::RefreshTokenStore,
};

pub struct SqliteRefreshTokenStore {
    pool: SqlitePool,
}

impl SqliteRefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteRefreshToken {
    id: String,
    user_id: String,
    token_hash: String,
    created_at: i64,
    expires_at: i64,
    revoked_at: Option<i64>,
    replaced_by_hash: Option<String>,
}

impl From<SqliteRefreshToken> for RefreshToken {
    fn from(row: SqliteRefreshToken) -> Self {
        RefreshToken {
            id: row.id,
            user_id: UserId::new(&row.user_id),
            token_hash: row.token_hash,
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
            expires_at: DateTime::from_timestamp(row.expires_at, 0).expect("Invalid timestamp"),
            revoked_at: row.revoked_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            replaced_by_hash: row.replaced_by_hash,
        }
    }
}

const TOKEN_COLUMNS: &str =
    "id, user_id, token_hash, created_at, expires_at, revoked_at, replaced_by_hash";

#[async_trait]
impl RefreshTokenStore for SqliteRefreshTokenStore {
    async fn insert(&self, token: RefreshToken) -> Result<RefreshToken, Error> {
        let row = sqlx::query_as::<_, SqliteRefreshToken>(
            format!(
                r#"
            INSERT INTO refresh_tokens
                (id, user_id, token_hash, created_at, expires_at, revoked_at, replaced_by_hash)
            VALUES (?, ?, ?, ?, ?, NULL, NULL)
            RETURNING {TOKEN_COLUMNS}
            "#
            )
            .as_str(),
        )
        .bind(&token.id)
        .bind(token.user_id.as_str())
        .bind(&token.token_hash)
        .bind(token.created_at.timestamp())
        .bind(token.expires_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert refresh token");
            StorageError::Database("Failed to insert refresh token".to_string())
        })?;

        Ok(row.into())
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<RefreshToken>, Error> {
        let row = sqlx::query_as::<_, SqliteRefreshToken>(
            format!("SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = ?").as_str(),
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up refresh token");
            StorageError::Database("Failed to look up refresh token".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn rotate(&self, presented_hash: &str, successor: RefreshToken) -> Result<(), Error> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin rotation transaction");
            StorageError::Database("Failed to begin rotation transaction".to_string())
        })?;

        // Conditional revoke: exactly one concurrent rotation can flip
        // revoked_at from NULL. Everyone else sees zero rows and loses.
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = ?, replaced_by_hash = ?
            WHERE token_hash = ? AND revoked_at IS NULL
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(&successor.token_hash)
        .bind(presented_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to revoke rotated token");
            StorageError::Database("Failed to revoke rotated token".to_string())
        })?;

        if revoked.rows_affected() == 0 {
            // Rolls back implicitly on drop; nothing was written.
            return Err(TokenError::Revoked.into());
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens
                (id, user_id, token_hash, created_at, expires_at, revoked_at, replaced_by_hash)
            VALUES (?, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(&successor.id)
        .bind(successor.user_id.as_str())
        .bind(&successor.token_hash)
        .bind(successor.created_at.timestamp())
        .bind(successor.expires_at.timestamp())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert successor token");
            StorageError::Database("Failed to insert successor token".to_string())
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit rotation");
            StorageError::Database("Failed to commit rotation".to_string())
        })?;

        Ok(())
    }

    async fn revoke(&self, hash: &str) -> Result<(), Error> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL",
        )
        .bind(Utc::now().timestamp())
        .bind(hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to revoke refresh token");
            StorageError::Database("Failed to revoke refresh token".to_string())
        })?;

        Ok(())
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE expires_at <= ? OR revoked_at IS NOT NULL",
        )
        .bind(now.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to purge refresh tokens");
            StorageError::Database("Failed to purge refresh tokens".to_string())
        })?;

        Ok(result.rows_affected())
    }
}
