//! SQLite implementation of the credential store.
//!
//! Password hashing (argon2 via `password-auth`) is entirely contained here;
//! hashes never leave this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;
use vigil_core::{
    Error, NewUser, Role, User, UserId,
    error::{AuthError, StorageError},
    repositories::CredentialStore,
};

pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteUser {
    id: String,
    email: String,
    role: String,
    disabled_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteUser> for User {
    fn from(row: SqliteUser) -> Self {
        User {
            id: UserId::new(&row.id),
            email: row.email,
            role: Role::from_str(&row.role).unwrap_or(Role::User),
            disabled_at: row.disabled_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).expect("Invalid timestamp"),
        }
    }
}

const USER_COLUMNS: &str = "id, email, role, disabled_at, created_at, updated_at";

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create(&self, user: NewUser, password: &str) -> Result<User, Error> {
        let hash = password_auth::generate_hash(password);
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, email, role, disabled_at, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&hash)
        .bind(user.role.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                return Error::Auth(AuthError::AlreadyExists);
            }
            tracing::error!(error = %e, "Failed to create user");
            Error::Storage(StorageError::Database("Failed to create user".to_string()))
        })?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?").as_str(),
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by email");
            StorageError::Database("Failed to find user by email".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?").as_str(),
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by id");
            StorageError::Database("Failed to find user by id".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn verify_password(&self, user_id: &UserId, password: &str) -> Result<bool, Error> {
        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = ?")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to fetch password hash");
                    StorageError::Database("Failed to fetch password hash".to_string())
                })?;

        let Some((hash,)) = hash else {
            return Ok(false);
        };

        Ok(password_auth::verify_password(password, &hash).is_ok())
    }

    async fn set_disabled(&self, user_id: &UserId, disabled: bool) -> Result<(), Error> {
        let disabled_at = disabled.then(|| Utc::now().timestamp());

        sqlx::query("UPDATE users SET disabled_at = ?, updated_at = ? WHERE id = ?")
            .bind(disabled_at)
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to set disabled flag");
                StorageError::Database("Failed to set disabled flag".to_string())
            })?;

        Ok(())
    }

    async fn set_role(&self, user_id: &UserId, role: Role) -> Result<(), Error> {
        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to set role");
                StorageError::Database("Failed to set role".to_string())
            })?;

        Ok(())
    }
}
