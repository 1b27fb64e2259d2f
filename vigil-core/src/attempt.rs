//! Login attempt log
//!
//! Append-only record of every login attempt, successful or not. Rows are
//! immutable once written and are never purged automatically; they are the
//! source of truth for the windowed counts used by the auto-ban policy and
//! the risk scoring engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded login attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: i64,

    /// Network address the attempt originated from.
    pub ip: String,

    /// Email the caller presented, if any. May name a non-existent account.
    pub email: Option<String>,

    pub user_agent: Option<String>,

    pub success: bool,

    pub failure_reason: Option<String>,

    /// Correlation id of the request that produced this attempt.
    pub correlation_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Parameters for appending a login attempt.
#[derive(Debug, Clone)]
pub struct NewLoginAttempt {
    pub ip: String,
    pub email: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub correlation_id: Option<String>,
}

impl NewLoginAttempt {
    pub fn success(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            email: None,
            user_agent: None,
            success: true,
            failure_reason: None,
            correlation_id: None,
        }
    }

    pub fn failure(ip: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            email: None,
            user_agent: None,
            success: false,
            failure_reason: Some(reason.into()),
            correlation_id: None,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}
