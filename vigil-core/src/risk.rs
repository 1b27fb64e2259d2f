//! Risk events and score results
//!
//! Risk events are the persisted, deduplicated trace of scoring rules firing
//! for an address. Score results are ephemeral: computed on every call, never
//! stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The scoring rule that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskEventKind {
    /// Active block or repeated failed logins.
    BruteForce,
    /// Many distinct emails tried from one address.
    ManyEmails,
    /// The client agent string changed within the window.
    SuspiciousUa,
}

impl RiskEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskEventKind::BruteForce => "BruteForce",
            RiskEventKind::ManyEmails => "ManyEmails",
            RiskEventKind::SuspiciousUa => "SuspiciousUA",
        }
    }
}

impl std::str::FromStr for RiskEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BruteForce" => Ok(RiskEventKind::BruteForce),
            "ManyEmails" => Ok(RiskEventKind::ManyEmails),
            "SuspiciousUA" => Ok(RiskEventKind::SuspiciousUa),
            other => Err(format!("unknown risk event kind: {other}")),
        }
    }
}

impl std::fmt::Display for RiskEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted risk event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvent {
    pub id: i64,

    pub ip: String,

    pub email: Option<String>,

    pub user_agent: Option<String>,

    pub kind: RiskEventKind,

    pub score_delta: i32,

    pub details: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Parameters for appending a risk event.
#[derive(Debug, Clone)]
pub struct NewRiskEvent {
    pub ip: String,
    pub email: Option<String>,
    pub user_agent: Option<String>,
    pub kind: RiskEventKind,
    pub score_delta: i32,
    pub details: Option<String>,
}

impl NewRiskEvent {
    pub fn new(ip: impl Into<String>, kind: RiskEventKind, score_delta: i32) -> Self {
        Self {
            ip: ip.into(),
            email: None,
            user_agent: None,
            kind,
            score_delta,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// The computed risk of an address. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RiskScore {
    pub ip: String,

    /// Composite score clamped into [0, 100].
    pub score: u8,

    pub is_blocked: bool,

    pub blocked_until: Option<DateTime<Utc>>,

    /// Failed attempts from this address within the window.
    pub failed_attempts: u32,

    /// Distinct (case-insensitive) emails tried within the window.
    pub distinct_emails: u32,

    /// Whether more than one agent string was seen within the window.
    pub user_agent_changed: bool,

    /// Human-readable explanations, in rule order.
    pub reasons: Vec<String>,
}

/// Aggregated 24 h event activity for one address (admin view).
#[derive(Debug, Clone, Serialize)]
pub struct IpRiskSummary {
    pub ip: String,
    pub events: i64,
    pub total_score_delta: i64,
    pub last_seen: DateTime<Utc>,
}
