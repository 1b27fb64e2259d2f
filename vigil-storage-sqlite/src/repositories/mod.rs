//! Repository implementations for SQLite storage

pub mod attempts;
pub mod blocks;
pub mod credentials;
pub mod events;
pub mod refresh;

pub use attempts::SqliteAttemptLog;
pub use blocks::SqliteBlockList;
pub use credentials::SqliteCredentialStore;
pub use events::SqliteRiskEventLog;
pub use refresh::SqliteRefreshTokenStore;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use vigil_core::{
    Error,
    error::StorageError,
    repositories::{
        AttemptLogProvider, BlockListProvider, CredentialStoreProvider, RefreshTokenStoreProvider,
        RepositoryProvider, RiskEventLogProvider,
    },
};

use crate::migrations::{SqliteMigrationManager, all_migrations};

/// Repository provider implementation for SQLite
///
/// Implements all the individual repository provider traits as well as the
/// unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    credentials: Arc<SqliteCredentialStore>,
    attempts: Arc<SqliteAttemptLog>,
    blocks: Arc<SqliteBlockList>,
    refresh_tokens: Arc<SqliteRefreshTokenStore>,
    events: Arc<SqliteRiskEventLog>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let credentials = Arc::new(SqliteCredentialStore::new(pool.clone()));
        let attempts = Arc::new(SqliteAttemptLog::new(pool.clone()));
        let blocks = Arc::new(SqliteBlockList::new(pool.clone()));
        let refresh_tokens = Arc::new(SqliteRefreshTokenStore::new(pool.clone()));
        let events = Arc::new(SqliteRiskEventLog::new(pool.clone()));

        Self {
            pool,
            credentials,
            attempts,
            blocks,
            refresh_tokens,
            events,
        }
    }
}

impl CredentialStoreProvider for SqliteRepositoryProvider {
    type Credentials = SqliteCredentialStore;

    fn credentials(&self) -> &Self::Credentials {
        &self.credentials
    }
}

impl AttemptLogProvider for SqliteRepositoryProvider {
    type Attempts = SqliteAttemptLog;

    fn attempts(&self) -> &Self::Attempts {
        &self.attempts
    }
}

impl BlockListProvider for SqliteRepositoryProvider {
    type Blocks = SqliteBlockList;

    fn blocks(&self) -> &Self::Blocks {
        &self.blocks
    }
}

impl RefreshTokenStoreProvider for SqliteRepositoryProvider {
    type RefreshTokens = SqliteRefreshTokenStore;

    fn refresh_tokens(&self) -> &Self::RefreshTokens {
        &self.refresh_tokens
    }
}

impl RiskEventLogProvider for SqliteRepositoryProvider {
    type Events = SqliteRiskEventLog;

    fn events(&self) -> &Self::Events {
        &self.events
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all_migrations()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
