//! Tunable policy configuration
//!
//! All windows and limits are explicit values passed in at construction so
//! deployments can tune them and tests can shrink them.

use chrono::Duration;

/// Auto-ban and scoring-window policy.
#[derive(Debug, Clone)]
pub struct RiskPolicy {
    /// Failed attempts within `fail_window` that trigger a ban.
    pub fail_limit: u32,

    /// Trailing window over which failures are counted.
    pub fail_window: Duration,

    /// How long a triggered ban lasts. Extension restarts the clock.
    pub ban_duration: Duration,

    /// Lookback window for risk scoring and event dedup.
    pub score_window: Duration,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            fail_limit: 5,
            fail_window: Duration::minutes(10),
            ban_duration: Duration::minutes(10),
            score_window: Duration::minutes(10),
        }
    }
}

impl RiskPolicy {
    /// Reason text recorded on a block entry created by the auto-ban policy.
    pub fn ban_reason(&self) -> String {
        format!(
            "{} or more failed logins within {} minutes",
            self.fail_limit,
            self.fail_window.num_minutes()
        )
    }
}

/// Token lifetimes.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    /// Access token lifetime (minutes scale).
    pub access_ttl: Duration,

    /// Refresh token lifetime (days scale).
    pub refresh_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }
}
