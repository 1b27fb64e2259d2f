//! Temporary address blocks
//!
//! At most one block entry exists per address. Extension of an active ban
//! overwrites the expiry and reason in place rather than inserting a second
//! row. Expiry is enforced at read time; the sweeper only reclaims storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An address currently (or recently) under a temporary ban.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedIp {
    pub id: i64,

    pub ip: String,

    pub blocked_until: DateTime<Utc>,

    pub reason: String,

    pub created_at: DateTime<Utc>,
}

impl BlockedIp {
    /// Whether the ban is still in force at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_active() {
        let now = Utc::now();
        let entry = BlockedIp {
            id: 1,
            ip: "10.0.0.5".into(),
            blocked_until: now + Duration::minutes(5),
            reason: "test".into(),
            created_at: now,
        };

        assert!(entry.is_active(now));
        assert!(!entry.is_active(now + Duration::minutes(5)));
        assert!(!entry.is_active(now + Duration::minutes(6)));
    }
}
