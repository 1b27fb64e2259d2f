use std::sync::Arc;

use vigil::{JwtConfig, LoginContext, RiskPolicy, TokenPolicy, Vigil};
use vigil_core::RiskEventKind;

#[cfg(feature = "sqlite")]
use vigil::SqliteRepositoryProvider;

const TEST_SECRET: &[u8] = b"this_is_a_test_secret_key_for_hs256_access_tokens_not_for_prod";

#[cfg(feature = "sqlite")]
async fn setup() -> Vigil<SqliteRepositoryProvider> {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let repositories = Arc::new(SqliteRepositoryProvider::new(pool));

    let vigil = Vigil::new(
        repositories,
        JwtConfig::new(TEST_SECRET.to_vec(), "vigil", "vigil-api"),
    );
    vigil.migrate().await.unwrap();
    vigil
}

fn ctx(ip: &str, agent: &str) -> LoginContext {
    LoginContext::new(ip).with_user_agent(Some(agent.to_string()))
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_quiet_address_scores_zero() {
    let vigil = setup().await;

    let score = vigil.score("198.51.100.1").await.unwrap();

    assert_eq!(score.score, 0);
    assert!(!score.is_blocked);
    assert_eq!(score.reasons.len(), 1);
    assert!(vigil.recent_events(50).await.unwrap().is_empty());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_failures_and_distinct_emails_score_fifty() {
    // Raise the fail limit so six failures accumulate without a ban; the
    // scenario wants scoring without an active block.
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
    let vigil = Vigil::with_policies(
        repositories,
        JwtConfig::new(TEST_SECRET.to_vec(), "vigil", "vigil-api"),
        RiskPolicy {
            fail_limit: 100,
            ..RiskPolicy::default()
        },
        TokenPolicy::default(),
    );
    vigil.migrate().await.unwrap();

    // 6 failures across 3 distinct account names from one address:
    // failed-count delta caps at 30, distinct emails add 20.
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        for _ in 0..2 {
            let _ = vigil.login(email, "wrong", &ctx("10.0.0.5", "agent-1")).await;
        }
    }

    let score = vigil.score("10.0.0.5").await.unwrap();

    assert_eq!(score.score, 50);
    assert!(!score.is_blocked);
    assert_eq!(score.failed_attempts, 6);
    assert_eq!(score.distinct_emails, 3);
    assert!(!score.user_agent_changed);
    assert_eq!(score.reasons.len(), 2);

    let events = vigil.recent_events(50).await.unwrap();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&RiskEventKind::BruteForce));
    assert!(kinds.contains(&RiskEventKind::ManyEmails));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_blocked_address_includes_block_delta_and_expiry() {
    let vigil = setup().await;
    vigil.register("victim@example.com", "password123").await.unwrap();

    for _ in 0..5 {
        let _ = vigil
            .login("victim@example.com", "wrong", &ctx("10.0.0.66", "agent-1"))
            .await;
    }

    let score = vigil.score("10.0.0.66").await.unwrap();

    assert!(score.is_blocked);
    let blocked = vigil.list_blocked().await.unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(score.blocked_until, Some(blocked[0].blocked_until));
    // 60 (blocked) + 30 (failures, capped) = 90
    assert_eq!(score.score, 90);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_agent_change_scores_fifteen() {
    let vigil = setup().await;
    vigil.register("a@example.com", "password123").await.unwrap();

    vigil
        .login("a@example.com", "password123", &ctx("10.0.0.7", "agent-1"))
        .await
        .unwrap();
    vigil
        .login("a@example.com", "password123", &ctx("10.0.0.7", "agent-2"))
        .await
        .unwrap();

    let score = vigil.score("10.0.0.7").await.unwrap();

    assert_eq!(score.score, 15);
    assert!(score.user_agent_changed);

    let events = vigil.recent_events(50).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, RiskEventKind::SuspiciousUa);
    assert_eq!(events[0].score_delta, 15);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_scoring_twice_dedupes_events() {
    let vigil = setup().await;

    for _ in 0..4 {
        let _ = vigil
            .login("ghost@example.com", "wrong", &ctx("10.0.0.9", "agent-1"))
            .await;
    }

    let first = vigil.score("10.0.0.9").await.unwrap();
    let second = vigil.score("10.0.0.9").await.unwrap();

    // Scores and reasons recompute identically; the event is persisted once
    assert_eq!(first.score, second.score);
    let events = vigil.recent_events(50).await.unwrap();
    let brute_force: Vec<_> = events
        .iter()
        .filter(|e| e.kind == RiskEventKind::BruteForce)
        .collect();
    assert_eq!(brute_force.len(), 1);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_top_ips_aggregates_deltas() {
    let vigil = setup().await;

    // Address A: failures only. Address B: failures plus agent churn.
    for _ in 0..3 {
        let _ = vigil
            .login("x@example.com", "wrong", &ctx("10.0.0.20", "agent-1"))
            .await;
    }
    for i in 0..3 {
        let _ = vigil
            .login("y@example.com", "wrong", &ctx("10.0.0.21", &format!("agent-{i}")))
            .await;
    }

    vigil.score("10.0.0.20").await.unwrap();
    vigil.score("10.0.0.21").await.unwrap();

    let top = vigil.top_ips(20).await.unwrap();
    assert_eq!(top.len(), 2);
    // B carries BruteForce(18) + SuspiciousUA(15), A only BruteForce(18)
    assert_eq!(top[0].ip, "10.0.0.21");
    assert_eq!(top[0].total_score_delta, 33);
    assert_eq!(top[1].ip, "10.0.0.20");
    assert_eq!(top[1].total_score_delta, 18);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sweeper_purges_expired_state() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let repositories = Arc::new(SqliteRepositoryProvider::new(pool));

    // Shrink the ban so it expires immediately
    let vigil = Vigil::with_policies(
        repositories.clone(),
        JwtConfig::new(TEST_SECRET.to_vec(), "vigil", "vigil-api"),
        RiskPolicy {
            ban_duration: chrono::Duration::seconds(0),
            ..RiskPolicy::default()
        },
        TokenPolicy::default(),
    )
    .with_sweep_interval(std::time::Duration::from_millis(50));
    vigil.migrate().await.unwrap();

    vigil.register("a@example.com", "password123").await.unwrap();

    for _ in 0..5 {
        let _ = vigil
            .login("a@example.com", "wrong", &ctx("10.0.0.30", "agent-1"))
            .await;
    }

    // Log in and out so a revoked refresh token exists
    let pair = vigil
        .login("a@example.com", "password123", &ctx("10.0.0.31", "agent-1"))
        .await
        .unwrap();
    vigil.logout(&pair.refresh_token).await.unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = vigil.start_sweeper(shutdown_rx);

    // Give the sweeper a couple of cycles
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("sweeper did not shut down")
        .unwrap();

    // The expired block row is gone (the ban itself had zero duration)
    assert!(vigil.list_blocked().await.unwrap().is_empty());

    // The revoked refresh token row is gone as well
    use vigil_core::repositories::{RefreshTokenStore, RefreshTokenStoreProvider};
    let remaining = repositories
        .refresh_tokens()
        .find_by_hash(&vigil_core::crypto::hash_token(&pair.refresh_token))
        .await
        .unwrap();
    assert!(remaining.is_none());
}
