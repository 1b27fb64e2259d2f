//! Risk scoring service
//!
//! Computes a composite abuse score for an address from its recent attempt
//! history and block status, and emits deduplicated risk events as a side
//! effect. Scoring never gates logins; the hard ban lives in the credential
//! lifecycle service. This is the parallel detection layer.
//!
//! Events are deduplicated per (address, kind) within the scoring window.
//! Dedup is by kind only: when the block rule has already emitted a
//! `BruteForce` event this window, the failed-count rule does not emit a
//! second one even though its delta differs.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, IpRiskSummary, NewRiskEvent, RiskEvent, RiskEventKind, RiskScore,
    policy::RiskPolicy,
    repositories::{AttemptLog, BlockList, RiskEventLog},
};

/// Score contribution of an active block entry.
const BLOCKED_DELTA: i32 = 60;
/// Per-failure contribution, capped at [`FAILED_DELTA_CAP`].
const FAILED_DELTA_PER_ATTEMPT: i32 = 6;
const FAILED_DELTA_CAP: i32 = 30;
/// Failures needed before the failed-count rule fires.
const FAILED_THRESHOLD: u32 = 3;
/// Distinct emails needed before the many-emails rule fires.
const EMAILS_THRESHOLD: u32 = 3;
const EMAILS_DELTA: i32 = 20;
/// Distinct agent strings needed before the agent-change rule fires.
const AGENTS_THRESHOLD: usize = 2;
const AGENTS_DELTA: i32 = 15;

/// Service computing risk scores and emitting risk events.
pub struct RiskService<A, B, E>
where
    A: AttemptLog,
    B: BlockList,
    E: RiskEventLog,
{
    attempts: Arc<A>,
    blocks: Arc<B>,
    events: Arc<E>,
    policy: RiskPolicy,
}

impl<A, B, E> RiskService<A, B, E>
where
    A: AttemptLog,
    B: BlockList,
    E: RiskEventLog,
{
    pub fn new(attempts: Arc<A>, blocks: Arc<B>, events: Arc<E>, policy: RiskPolicy) -> Self {
        Self {
            attempts,
            blocks,
            events,
            policy,
        }
    }

    /// Score an address over the trailing window.
    ///
    /// Reads the block list and attempt log, computes the additive score,
    /// clamps into [0, 100], and emits at most one event per kind per window.
    /// The score and reasons are recomputed on every call; only the persisted
    /// events are deduplicated.
    pub async fn score(&self, ip: &str) -> Result<RiskScore, Error> {
        let now = Utc::now();
        let window_start = now - self.policy.score_window;
        let window_minutes = self.policy.score_window.num_minutes();

        let block = self
            .blocks
            .find(ip)
            .await?
            .filter(|entry| entry.is_active(now));

        let attempts = self.attempts.attempts_for_ip(ip, window_start).await?;

        let failed = attempts.iter().filter(|a| !a.success).count() as u32;

        let distinct_emails = {
            let mut emails: Vec<String> = attempts
                .iter()
                .filter_map(|a| a.email.as_deref())
                .filter(|e| !e.trim().is_empty())
                .map(|e| e.to_lowercase())
                .collect();
            emails.sort();
            emails.dedup();
            emails.len() as u32
        };

        let distinct_agents = {
            let mut agents: Vec<&str> = attempts
                .iter()
                .filter_map(|a| a.user_agent.as_deref())
                .filter(|ua| !ua.trim().is_empty())
                .collect();
            agents.sort();
            agents.dedup();
            agents.len()
        };
        let agent_changed = distinct_agents >= AGENTS_THRESHOLD;

        let mut score: i32 = 0;
        let mut reasons = Vec::new();

        if let Some(entry) = &block {
            score += BLOCKED_DELTA;
            reasons.push("IP is currently blocked".to_string());
            self.emit(
                NewRiskEvent::new(ip, RiskEventKind::BruteForce, BLOCKED_DELTA)
                    .with_details("IP is on the block list"),
                window_start,
            )
            .await?;
            tracing::debug!(ip = %ip, until = %entry.blocked_until, "Scoring blocked address");
        }

        if failed >= FAILED_THRESHOLD {
            let delta = (failed as i32 * FAILED_DELTA_PER_ATTEMPT).min(FAILED_DELTA_CAP);
            score += delta;
            reasons.push(format!(
                "Failed logins in the last {window_minutes}m: {failed}"
            ));
            self.emit(
                NewRiskEvent::new(ip, RiskEventKind::BruteForce, delta).with_details(format!(
                    "Failed logins in the last {window_minutes}m: {failed}"
                )),
                window_start,
            )
            .await?;
        }

        if distinct_emails >= EMAILS_THRESHOLD {
            score += EMAILS_DELTA;
            reasons.push(format!(
                "Many different emails tried: {distinct_emails}"
            ));
            self.emit(
                NewRiskEvent::new(ip, RiskEventKind::ManyEmails, EMAILS_DELTA).with_details(
                    format!("Distinct emails in the last {window_minutes}m: {distinct_emails}"),
                ),
                window_start,
            )
            .await?;
        }

        if agent_changed {
            score += AGENTS_DELTA;
            reasons.push(format!(
                "User agent changed within {window_minutes} minutes"
            ));
            self.emit(
                NewRiskEvent::new(ip, RiskEventKind::SuspiciousUa, AGENTS_DELTA).with_details(
                    format!("Distinct agents in the last {window_minutes}m: {distinct_agents}"),
                ),
                window_start,
            )
            .await?;
        }

        let score = score.clamp(0, 100) as u8;

        if reasons.is_empty() {
            reasons.push(format!(
                "No suspicious activity in the last {window_minutes} minutes"
            ));
        }

        Ok(RiskScore {
            ip: ip.to_string(),
            score,
            is_blocked: block.is_some(),
            blocked_until: block.map(|b| b.blocked_until),
            failed_attempts: failed,
            distinct_emails,
            user_agent_changed: agent_changed,
            reasons,
        })
    }

    /// Latest persisted events (admin view).
    pub async fn recent_events(&self, limit: u32) -> Result<Vec<RiskEvent>, Error> {
        self.events.recent(limit).await
    }

    /// Addresses ranked by aggregated score delta since `since` (admin view).
    pub async fn top_ips(
        &self,
        since: chrono::DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<IpRiskSummary>, Error> {
        self.events.top_ips(since, limit).await
    }

    async fn emit(
        &self,
        event: NewRiskEvent,
        window_start: chrono::DateTime<Utc>,
    ) -> Result<(), Error> {
        let written = self.events.append_deduped(event, window_start).await?;
        if !written {
            tracing::trace!("Risk event suppressed by per-window dedup");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockedIp, LoginAttempt, NewLoginAttempt};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAttemptLog {
        attempts: Mutex<Vec<LoginAttempt>>,
    }

    impl MockAttemptLog {
        fn push(&self, ip: &str, email: Option<&str>, agent: Option<&str>, success: bool) {
            let mut attempts = self.attempts.lock().unwrap();
            let row = LoginAttempt {
                id: attempts.len() as i64 + 1,
                ip: ip.to_string(),
                email: email.map(String::from),
                user_agent: agent.map(String::from),
                success,
                failure_reason: (!success).then(|| "wrong password".to_string()),
                correlation_id: None,
                created_at: Utc::now(),
            };
            attempts.push(row);
        }
    }

    #[async_trait]
    impl AttemptLog for MockAttemptLog {
        async fn record(&self, attempt: NewLoginAttempt) -> Result<LoginAttempt, Error> {
            self.push(
                &attempt.ip,
                attempt.email.as_deref(),
                attempt.user_agent.as_deref(),
                attempt.success,
            );
            Ok(self.attempts.lock().unwrap().last().unwrap().clone())
        }

        async fn count_failures(&self, ip: &str, since: DateTime<Utc>) -> Result<u32, Error> {
            Ok(self
                .attempts
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.ip == ip && !a.success && a.created_at >= since)
                .count() as u32)
        }

        async fn attempts_for_ip(
            &self,
            ip: &str,
            since: DateTime<Utc>,
        ) -> Result<Vec<LoginAttempt>, Error> {
            Ok(self
                .attempts
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.ip == ip && a.created_at >= since)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MockBlockList {
        entries: Mutex<Vec<BlockedIp>>,
    }

    impl MockBlockList {
        fn block(&self, ip: &str, until: DateTime<Utc>) {
            self.entries.lock().unwrap().push(BlockedIp {
                id: 1,
                ip: ip.to_string(),
                blocked_until: until,
                reason: "test".to_string(),
                created_at: Utc::now(),
            });
        }
    }

    #[async_trait]
    impl BlockList for MockBlockList {
        async fn find(&self, ip: &str) -> Result<Option<BlockedIp>, Error> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.ip == ip)
                .cloned())
        }

        async fn upsert(
            &self,
            _ip: &str,
            _blocked_until: DateTime<Utc>,
            _reason: &str,
        ) -> Result<BlockedIp, Error> {
            unimplemented!("risk service never writes the block list")
        }

        async fn remove(&self, _ip: &str) -> Result<bool, Error> {
            unimplemented!("risk service never writes the block list")
        }

        async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<BlockedIp>, Error> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.is_active(now))
                .cloned()
                .collect())
        }

        async fn delete_expired(&self, _now: DateTime<Utc>) -> Result<u64, Error> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct MockRiskEventLog {
        events: Mutex<Vec<RiskEvent>>,
    }

    #[async_trait]
    impl RiskEventLog for MockRiskEventLog {
        async fn append_deduped(
            &self,
            event: NewRiskEvent,
            window_start: DateTime<Utc>,
        ) -> Result<bool, Error> {
            let mut events = self.events.lock().unwrap();
            let exists = events
                .iter()
                .any(|e| e.ip == event.ip && e.kind == event.kind && e.created_at >= window_start);
            if exists {
                return Ok(false);
            }
            let row = RiskEvent {
                id: events.len() as i64 + 1,
                ip: event.ip,
                email: event.email,
                user_agent: event.user_agent,
                kind: event.kind,
                score_delta: event.score_delta,
                details: event.details,
                created_at: Utc::now(),
            };
            events.push(row);
            Ok(true)
        }

        async fn recent(&self, limit: u32) -> Result<Vec<RiskEvent>, Error> {
            let mut events = self.events.lock().unwrap().clone();
            events.reverse();
            events.truncate(limit as usize);
            Ok(events)
        }

        async fn top_ips(
            &self,
            _since: DateTime<Utc>,
            _limit: u32,
        ) -> Result<Vec<IpRiskSummary>, Error> {
            Ok(Vec::new())
        }
    }

    struct Fixture {
        service: RiskService<MockAttemptLog, MockBlockList, MockRiskEventLog>,
        attempts: Arc<MockAttemptLog>,
        blocks: Arc<MockBlockList>,
        events: Arc<MockRiskEventLog>,
    }

    fn fixture() -> Fixture {
        let attempts = Arc::new(MockAttemptLog::default());
        let blocks = Arc::new(MockBlockList::default());
        let events = Arc::new(MockRiskEventLog::default());
        let service = RiskService::new(
            attempts.clone(),
            blocks.clone(),
            events.clone(),
            RiskPolicy::default(),
        );
        Fixture {
            service,
            attempts,
            blocks,
            events,
        }
    }

    #[tokio::test]
    async fn test_quiet_address_scores_zero() {
        let f = fixture();

        let score = f.service.score("10.0.0.1").await.unwrap();

        assert_eq!(score.score, 0);
        assert!(!score.is_blocked);
        assert_eq!(score.reasons.len(), 1);
        assert!(score.reasons[0].contains("No suspicious activity"));
        assert!(f.events.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_count_capped_plus_distinct_emails() {
        let f = fixture();

        // 6 failures across 3 distinct emails: failed delta capped at 30,
        // emails add 20, total 50.
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            f.attempts.push("10.0.0.5", Some(email), Some("agent-1"), false);
            f.attempts.push("10.0.0.5", Some(email), Some("agent-1"), false);
        }

        let score = f.service.score("10.0.0.5").await.unwrap();

        assert_eq!(score.score, 50);
        assert!(!score.is_blocked);
        assert_eq!(score.failed_attempts, 6);
        assert_eq!(score.distinct_emails, 3);
        assert!(!score.user_agent_changed);
        assert_eq!(score.reasons.len(), 2);
        assert!(score.reasons[0].contains("Failed logins"));
        assert!(score.reasons[1].contains("Many different emails"));
    }

    #[tokio::test]
    async fn test_blocked_address_scores_sixty() {
        let f = fixture();
        let until = Utc::now() + Duration::minutes(5);
        f.blocks.block("10.0.0.9", until);

        let score = f.service.score("10.0.0.9").await.unwrap();

        assert_eq!(score.score, 60);
        assert!(score.is_blocked);
        assert_eq!(score.blocked_until, Some(until));
        assert_eq!(score.reasons, vec!["IP is currently blocked".to_string()]);
    }

    #[tokio::test]
    async fn test_expired_block_does_not_score() {
        let f = fixture();
        f.blocks.block("10.0.0.9", Utc::now() - Duration::minutes(1));

        let score = f.service.score("10.0.0.9").await.unwrap();

        assert_eq!(score.score, 0);
        assert!(!score.is_blocked);
        assert!(score.blocked_until.is_none());
    }

    #[tokio::test]
    async fn test_agent_change_detected() {
        let f = fixture();
        f.attempts.push("10.0.0.7", Some("a@example.com"), Some("agent-1"), true);
        f.attempts.push("10.0.0.7", Some("a@example.com"), Some("agent-2"), true);

        let score = f.service.score("10.0.0.7").await.unwrap();

        assert_eq!(score.score, 15);
        assert!(score.user_agent_changed);
    }

    #[tokio::test]
    async fn test_emails_counted_case_insensitively() {
        let f = fixture();
        f.attempts.push("10.0.0.7", Some("A@example.com"), None, false);
        f.attempts.push("10.0.0.7", Some("a@example.com"), None, false);
        f.attempts.push("10.0.0.7", Some("b@example.com"), None, false);

        let score = f.service.score("10.0.0.7").await.unwrap();

        // Two distinct emails after case folding: threshold not met
        assert_eq!(score.distinct_emails, 2);
        // Three failures at 6 each
        assert_eq!(score.score, 18);
    }

    #[tokio::test]
    async fn test_score_clamped_to_hundred() {
        let f = fixture();
        f.blocks.block("10.0.0.5", Utc::now() + Duration::minutes(10));
        for i in 0..6 {
            f.attempts.push(
                "10.0.0.5",
                Some(&format!("u{i}@example.com")),
                Some(&format!("agent-{i}")),
                false,
            );
        }

        let score = f.service.score("10.0.0.5").await.unwrap();

        // 60 + 30 + 20 + 15 = 125 before clamping
        assert_eq!(score.score, 100);
    }

    #[tokio::test]
    async fn test_events_deduped_within_window() {
        let f = fixture();
        f.blocks.block("10.0.0.5", Utc::now() + Duration::minutes(10));

        f.service.score("10.0.0.5").await.unwrap();
        let second = f.service.score("10.0.0.5").await.unwrap();

        // Score is recomputed every call; the persisted event is not.
        assert_eq!(second.score, 60);
        let events = f.events.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RiskEventKind::BruteForce);
    }

    #[tokio::test]
    async fn test_dedup_is_by_kind_not_cause() {
        let f = fixture();
        // Both the block rule and the failed-count rule want to emit
        // BruteForce; only the first one lands.
        f.blocks.block("10.0.0.5", Utc::now() + Duration::minutes(10));
        for _ in 0..4 {
            f.attempts.push("10.0.0.5", Some("a@example.com"), None, false);
        }

        let score = f.service.score("10.0.0.5").await.unwrap();

        // Score still counts both rules: 60 + min(30, 24) = 84
        assert_eq!(score.score, 84);

        let events = f.events.events.lock().unwrap();
        let brute_force: Vec<_> = events
            .iter()
            .filter(|e| e.kind == RiskEventKind::BruteForce)
            .collect();
        assert_eq!(brute_force.len(), 1);
        assert_eq!(brute_force[0].score_delta, 60);
    }

    #[tokio::test]
    async fn test_scoring_monotonic_in_failures() {
        let f = fixture();
        let mut last = 0;
        for i in 0..8 {
            f.attempts.push("10.0.0.5", Some("a@example.com"), None, false);
            let score = f.service.score("10.0.0.5").await.unwrap();
            assert!(
                score.score >= last,
                "score decreased at failure {i}: {} < {last}",
                score.score
            );
            assert!(score.score <= 100);
            last = score.score;
        }
    }
}
