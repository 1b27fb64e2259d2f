use std::sync::Arc;

use vigil::{JwtConfig, LoginContext, Role, Vigil};
use vigil_core::error::{AuthError, Error, StorageError, TokenError};

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

fn ctx(ip: &str) -> LoginContext {
    LoginContext::new(ip)
        .with_user_agent(Some("integration-test".to_string()))
        .with_correlation_id(Some("test-cid".to_string()))
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_register_and_login() {
    let vigil = setup().await;

    let user = vigil
        .register("test@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.role, Role::User);

    let pair = vigil
        .login("test@example.com", "password123", &ctx("10.0.0.1"))
        .await
        .unwrap();

    // The access token verifies and carries the account
    let claims = vigil.verify_access_token(&pair.access_token).unwrap();
    assert_eq!(claims.sub, user.id.as_str());
    assert_eq!(claims.email, "test@example.com");
    assert_eq!(claims.role, Role::User);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_register_duplicate_email() {
    let vigil = setup().await;

    vigil.register("dup@example.com", "password123").await.unwrap();
    let result = vigil.register("dup@example.com", "password123").await;

    assert!(matches!(result, Err(Error::Auth(AuthError::AlreadyExists))));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_wrong_password_rejected() {
    let vigil = setup().await;

    vigil.register("test@example.com", "password123").await.unwrap();
    let result = vigil
        .login("test@example.com", "not-the-password", &ctx("10.0.0.1"))
        .await;

    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::InvalidCredentials))
    ));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_auto_ban_then_blocked_until_unblocked() {
    let vigil = setup().await;
    vigil.register("victim@example.com", "password123").await.unwrap();

    // Five failures inside the window trigger the ban
    for _ in 0..5 {
        let result = vigil
            .login("victim@example.com", "wrong", &ctx("10.0.0.66"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    // Correct credentials no longer matter from that address
    let result = vigil
        .login("victim@example.com", "password123", &ctx("10.0.0.66"))
        .await;
    assert!(matches!(result, Err(Error::Auth(AuthError::Blocked { .. }))));

    // A different address is unaffected
    vigil
        .login("victim@example.com", "password123", &ctx("10.0.0.67"))
        .await
        .unwrap();

    // Operator unblock restores access
    vigil.unblock("10.0.0.66").await.unwrap();
    vigil
        .login("victim@example.com", "password123", &ctx("10.0.0.66"))
        .await
        .unwrap();
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_unblock_unknown_address_is_not_found() {
    let vigil = setup().await;

    let result = vigil.unblock("203.0.113.9").await;
    assert!(matches!(
        result,
        Err(Error::Storage(StorageError::NotFound))
    ));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_refresh_rotation_single_use() {
    let vigil = setup().await;
    vigil.register("test@example.com", "password123").await.unwrap();

    let pair = vigil
        .login("test@example.com", "password123", &ctx("10.0.0.1"))
        .await
        .unwrap();

    let rotated = vigil.refresh(&pair.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    // Replaying the consumed token is the theft signal
    let replay = vigil.refresh(&pair.refresh_token).await;
    assert!(matches!(replay, Err(Error::Token(TokenError::Revoked))));

    // The chain continues from the successor
    let third = vigil.refresh(&rotated.refresh_token).await.unwrap();
    vigil.refresh(&third.refresh_token).await.unwrap();
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_refresh_unknown_token() {
    let vigil = setup().await;

    let result = vigil.refresh("never-issued-token").await;
    assert!(matches!(result, Err(Error::Token(TokenError::Invalid))));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_logout_idempotent_and_revoking() {
    let vigil = setup().await;
    vigil.register("test@example.com", "password123").await.unwrap();

    let pair = vigil
        .login("test@example.com", "password123", &ctx("10.0.0.1"))
        .await
        .unwrap();

    vigil.logout(&pair.refresh_token).await.unwrap();
    vigil.logout(&pair.refresh_token).await.unwrap();
    vigil.logout("unknown-token").await.unwrap();

    let result = vigil.refresh(&pair.refresh_token).await;
    assert!(matches!(result, Err(Error::Token(TokenError::Revoked))));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_disabled_account_cannot_login() {
    let vigil = setup().await;
    vigil.register("d@example.com", "password123").await.unwrap();

    vigil.set_account_disabled("d@example.com", true).await.unwrap();
    let result = vigil
        .login("d@example.com", "password123", &ctx("10.0.0.1"))
        .await;
    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::AccountDisabled))
    ));

    vigil.set_account_disabled("d@example.com", false).await.unwrap();
    vigil
        .login("d@example.com", "password123", &ctx("10.0.0.1"))
        .await
        .unwrap();
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_promote_grants_admin_claims() {
    let vigil = setup().await;
    vigil.register("boss@example.com", "password123").await.unwrap();

    let promoted = vigil.promote("boss@example.com").await.unwrap();
    assert_eq!(promoted.role, Role::Admin);

    // Promotion is idempotent
    vigil.promote("boss@example.com").await.unwrap();

    let pair = vigil
        .login("boss@example.com", "password123", &ctx("10.0.0.1"))
        .await
        .unwrap();
    let claims = vigil.verify_access_token(&pair.access_token).unwrap();
    assert_eq!(claims.role, Role::Admin);
}
