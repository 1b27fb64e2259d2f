//! Repository trait for the refresh token store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, RefreshToken};

/// Store of issued refresh token hashes and their rotation chain.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + 'static {
    /// Persist a freshly issued token record.
    async fn insert(&self, token: RefreshToken) -> Result<RefreshToken, Error>;

    /// Look up a record by token hash.
    async fn find_by_hash(&self, hash: &str) -> Result<Option<RefreshToken>, Error>;

    /// Rotate the record with `presented_hash` into `successor`.
    ///
    /// Revoking the presented record (setting `revoked_at` and
    /// `replaced_by_hash = successor.token_hash`) and inserting the successor
    /// must be one atomic unit: either both happen or neither does. Of
    /// concurrent rotations presenting the same hash exactly one wins; the
    /// others fail with `TokenError::Revoked`.
    async fn rotate(&self, presented_hash: &str, successor: RefreshToken) -> Result<(), Error>;

    /// Revoke the record with `hash` if it exists and is not already revoked.
    ///
    /// Idempotent: unknown or already-revoked hashes are not an error.
    async fn revoke(&self, hash: &str) -> Result<(), Error>;

    /// Bulk-delete records that are expired or revoked. Returns rows deleted.
    async fn purge(&self, now: DateTime<Utc>) -> Result<u64, Error>;
}
