//! Repository trait for the login attempt log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, LoginAttempt, NewLoginAttempt};

/// Append-only store of login attempts.
///
/// Attempts are recorded for every login, including ones naming accounts that
/// do not exist, so the windowed counts reflect what an attacker actually
/// tried. Rows are never mutated or automatically purged.
#[async_trait]
pub trait AttemptLog: Send + Sync + 'static {
    /// Append an attempt and return the stored row.
    async fn record(&self, attempt: NewLoginAttempt) -> Result<LoginAttempt, Error>;

    /// Count failed attempts from `ip` since the cutoff.
    async fn count_failures(&self, ip: &str, since: DateTime<Utc>) -> Result<u32, Error>;

    /// All attempts from `ip` since the cutoff, newest first.
    async fn attempts_for_ip(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<LoginAttempt>, Error>;
}
