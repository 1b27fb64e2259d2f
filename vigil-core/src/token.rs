//! Refresh token records and rotation chains
//!
//! Only the SHA-256 hash of a refresh token is ever stored. A record is
//! mutated exactly once, at the moment it is exchanged for a successor:
//! `revoked_at` and `replaced_by_hash` are set together, after which the
//! record is immutable and the hash can never be rotated again.
//!
//! Invariant: `replaced_by_hash.is_some()` implies `revoked_at.is_some()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserId, id::generate_prefixed_id};

/// A persisted refresh token (hash only, never the raw value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: String,

    pub user_id: UserId,

    /// Hex-encoded SHA-256 of the raw token.
    pub token_hash: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Set when the token is rotated or the session is logged out.
    pub revoked_at: Option<DateTime<Utc>>,

    /// Hash of the token issued in exchange for this one, linking the
    /// rotation chain.
    pub replaced_by_hash: Option<String>,
}

impl RefreshToken {
    /// Build a fresh, unrevoked record for a newly issued token.
    pub fn issue(
        user_id: UserId,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_prefixed_id("rt"),
            user_id,
            token_hash,
            created_at: Utc::now(),
            expires_at,
            revoked_at: None,
            replaced_by_hash: None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// A freshly issued access/refresh token pair.
///
/// The refresh token is the raw value; it is not recoverable once this struct
/// is dropped.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
