//! Repository trait for the address block list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{BlockedIp, Error};

/// Keyed set of temporarily banned addresses, at most one row per address.
#[async_trait]
pub trait BlockList: Send + Sync + 'static {
    /// Look up the block entry for an address, active or not.
    async fn find(&self, ip: &str) -> Result<Option<BlockedIp>, Error>;

    /// Create or extend the block entry for an address.
    ///
    /// Must be an upsert keyed on the unique address so concurrent failed
    /// logins from one address cannot insert duplicate rows; the loser of an
    /// insert race falls back to updating in place.
    async fn upsert(
        &self,
        ip: &str,
        blocked_until: DateTime<Utc>,
        reason: &str,
    ) -> Result<BlockedIp, Error>;

    /// Remove the entry for an address (operator unban).
    ///
    /// Returns `false` when no entry existed.
    async fn remove(&self, ip: &str) -> Result<bool, Error>;

    /// All entries still in force at `now`, ordered by expiry descending.
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<BlockedIp>, Error>;

    /// Bulk-delete entries whose expiry has passed. Returns rows deleted.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;
}
