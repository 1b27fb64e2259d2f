//! Repository trait for the risk event log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, IpRiskSummary, NewRiskEvent, RiskEvent};

/// Append-only store of risk events with per-window dedup.
#[async_trait]
pub trait RiskEventLog: Send + Sync + 'static {
    /// Append `event` unless an event of the same kind already exists for the
    /// same address with a timestamp at or after `window_start`.
    ///
    /// The existence check and the insert must be atomic with respect to
    /// concurrent calls. Returns `true` when the event was written.
    async fn append_deduped(
        &self,
        event: NewRiskEvent,
        window_start: DateTime<Utc>,
    ) -> Result<bool, Error>;

    /// Latest events, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<RiskEvent>, Error>;

    /// Addresses ranked by summed score delta since the cutoff, ties broken
    /// by event count.
    async fn top_ips(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<IpRiskSummary>, Error>;
}
