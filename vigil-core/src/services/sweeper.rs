//! Cleanup sweeper
//!
//! Long-lived background task that reclaims storage: expired block entries
//! and expired-or-revoked refresh tokens. Expiry and revocation are enforced
//! at read time regardless, so a missed sweep only costs storage growth;
//! failures are logged and retried on the next cycle.
//!
//! Cancellation is observed during the sleep via a watch channel. A cycle
//! either runs its bulk deletes or is skipped entirely; each entity set is a
//! single bulk statement, so shutdown never leaves a partial sweep behind.

use std::sync::Arc;

use chrono::Utc;

use crate::repositories::{BlockList, RefreshTokenStore};

/// Default time between sweep cycles.
pub const DEFAULT_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(600);

/// Periodic cleanup of the block list and refresh token store.
pub struct Sweeper<B, T>
where
    B: BlockList,
    T: RefreshTokenStore,
{
    blocks: Arc<B>,
    refresh_tokens: Arc<T>,
    interval: std::time::Duration,
}

impl<B, T> Sweeper<B, T>
where
    B: BlockList,
    T: RefreshTokenStore,
{
    pub fn new(blocks: Arc<B>, refresh_tokens: Arc<T>) -> Self {
        Self {
            blocks,
            refresh_tokens,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: std::time::Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one sweep cycle. Failures in one entity set do not stop the other.
    pub async fn run_once(&self) {
        let now = Utc::now();

        match self.blocks.delete_expired(now).await {
            Ok(count) if count > 0 => {
                tracing::info!(count, "Removed expired block entries");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to remove expired block entries");
            }
        }

        match self.refresh_tokens.purge(now).await {
            Ok(count) if count > 0 => {
                tracing::info!(count, "Purged expired or revoked refresh tokens");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to purge refresh tokens");
            }
        }
    }

    /// Spawn the sweep loop.
    ///
    /// The task ticks on the configured interval and exits cleanly when the
    /// shutdown channel changes.
    pub fn spawn(
        self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(self.interval);
            // The first tick fires immediately; skip it so the first sweep
            // happens one full interval after startup.
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        self.run_once().await;
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down cleanup sweeper");
                        break;
                    }
                }
            }
        })
    }
}
