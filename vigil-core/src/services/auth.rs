//! Credential lifecycle service
//!
//! Orchestrates password verification, attempt logging, the auto-ban policy,
//! and the refresh-token rotation chain.
//!
//! # Login order
//!
//! 1. An active block entry for the address fails immediately with `Blocked`;
//!    nothing is logged for this short-circuit.
//! 2. Unknown account: log a failed attempt, evaluate auto-ban, fail with
//!    `InvalidCredentials`.
//! 3. Disabled account: log a failed attempt, fail with `AccountDisabled`.
//!    Auto-ban is NOT evaluated on this path so a disabled account cannot be
//!    used to probe the ban counter.
//! 4. Wrong password: log a failed attempt, evaluate auto-ban, fail with
//!    `InvalidCredentials`.
//! 5. Success: log the attempt, issue a signed access token and a fresh
//!    refresh token. Only the hash of the refresh token is persisted.
//!
//! # Rotation
//!
//! `refresh` is one-time-use: the presented record is revoked and linked to
//! its successor in a single atomic storage operation, so replaying a rotated
//! token always fails with `TokenRevoked` no matter how the race interleaves.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, NewLoginAttempt, NewUser, RefreshToken, TokenPair, User,
    crypto::{generate_refresh_token, hash_token},
    error::{AuthError, TokenError},
    jwt::AccessTokenSigner,
    policy::{RiskPolicy, TokenPolicy},
    repositories::{AttemptLog, BlockList, CredentialStore, RefreshTokenStore},
    validation::{validate_email, validate_password},
};

/// Per-request context captured by the transport layer.
#[derive(Debug, Clone)]
pub struct LoginContext {
    /// Network address the request originated from.
    pub ip: String,
    pub user_agent: Option<String>,
    pub correlation_id: Option<String>,
}

impl LoginContext {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: None,
            correlation_id: None,
        }
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

/// Service owning the credential lifecycle: login, refresh, logout, register.
///
/// Thread-safe; shared across request handlers behind an `Arc`.
pub struct AuthService<C, A, B, T>
where
    C: CredentialStore,
    A: AttemptLog,
    B: BlockList,
    T: RefreshTokenStore,
{
    credentials: Arc<C>,
    attempts: Arc<A>,
    blocks: Arc<B>,
    refresh_tokens: Arc<T>,
    signer: Arc<dyn AccessTokenSigner>,
    policy: RiskPolicy,
    tokens: TokenPolicy,
}

impl<C, A, B, T> AuthService<C, A, B, T>
where
    C: CredentialStore,
    A: AttemptLog,
    B: BlockList,
    T: RefreshTokenStore,
{
    pub fn new(
        credentials: Arc<C>,
        attempts: Arc<A>,
        blocks: Arc<B>,
        refresh_tokens: Arc<T>,
        signer: Arc<dyn AccessTokenSigner>,
        policy: RiskPolicy,
        tokens: TokenPolicy,
    ) -> Self {
        Self {
            credentials,
            attempts,
            blocks,
            refresh_tokens,
            signer,
            policy,
            tokens,
        }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Register an account with the default role.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, Error> {
        validate_email(email)?;
        validate_password(password)?;

        if self.credentials.find_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyExists.into());
        }

        self.credentials
            .create(NewUser::new(email), password)
            .await
    }

    /// Authenticate and issue a token pair.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ctx: &LoginContext,
    ) -> Result<TokenPair, Error> {
        let now = Utc::now();

        if let Some(block) = self.blocks.find(&ctx.ip).await? {
            if block.is_active(now) {
                return Err(AuthError::Blocked {
                    until: block.blocked_until,
                }
                .into());
            }
        }

        let Some(user) = self.credentials.find_by_email(email).await? else {
            self.log_failure(email, ctx, "account not found").await?;
            self.apply_ban_if_needed(&ctx.ip).await?;
            return Err(AuthError::InvalidCredentials.into());
        };

        if user.is_disabled() {
            self.log_failure(email, ctx, "account disabled").await?;
            return Err(AuthError::AccountDisabled.into());
        }

        if !self.credentials.verify_password(&user.id, password).await? {
            self.log_failure(email, ctx, "wrong password").await?;
            self.apply_ban_if_needed(&ctx.ip).await?;
            return Err(AuthError::InvalidCredentials.into());
        }

        self.attempts
            .record(
                NewLoginAttempt::success(&ctx.ip)
                    .with_email(Some(email.to_string()))
                    .with_user_agent(ctx.user_agent.clone())
                    .with_correlation_id(ctx.correlation_id.clone()),
            )
            .await?;

        self.issue_pair(&user).await
    }

    /// Exchange a refresh token for a new pair, revoking the presented one.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<TokenPair, Error> {
        let hash = hash_token(raw_refresh_token);

        let record = self
            .refresh_tokens
            .find_by_hash(&hash)
            .await?
            .ok_or(TokenError::Invalid)?;

        if record.is_revoked() {
            // A revoked token being presented again is the replay signal the
            // rotation chain exists to catch.
            tracing::warn!(user_id = %record.user_id, "Revoked refresh token presented");
            return Err(TokenError::Revoked.into());
        }

        if record.is_expired(Utc::now()) {
            return Err(TokenError::Expired.into());
        }

        let user = self
            .credentials
            .find_by_id(&record.user_id)
            .await?
            .ok_or(TokenError::Invalid)?;

        let new_raw = generate_refresh_token();
        let successor = RefreshToken::issue(
            user.id.clone(),
            hash_token(&new_raw),
            Utc::now() + self.tokens.refresh_ttl,
        );

        // Atomic revoke-and-insert; a concurrent rotation of the same token
        // surfaces here as TokenError::Revoked.
        self.refresh_tokens.rotate(&hash, successor).await?;

        let access_token = self.signer.sign(&user, self.tokens.access_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token: new_raw,
        })
    }

    /// Revoke a refresh token. Unknown or already-revoked tokens are success.
    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), Error> {
        let hash = hash_token(raw_refresh_token);
        self.refresh_tokens.revoke(&hash).await
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, Error> {
        let access_token = self.signer.sign(user, self.tokens.access_ttl)?;

        let raw = generate_refresh_token();
        let record = RefreshToken::issue(
            user.id.clone(),
            hash_token(&raw),
            Utc::now() + self.tokens.refresh_ttl,
        );
        self.refresh_tokens.insert(record).await?;

        Ok(TokenPair {
            access_token,
            refresh_token: raw,
        })
    }

    async fn log_failure(
        &self,
        email: &str,
        ctx: &LoginContext,
        reason: &str,
    ) -> Result<(), Error> {
        self.attempts
            .record(
                NewLoginAttempt::failure(&ctx.ip, reason)
                    .with_email(Some(email.to_string()))
                    .with_user_agent(ctx.user_agent.clone())
                    .with_correlation_id(ctx.correlation_id.clone()),
            )
            .await?;
        Ok(())
    }

    /// Count recent failures for the address and create or extend its block
    /// entry when the limit is reached.
    async fn apply_ban_if_needed(&self, ip: &str) -> Result<(), Error> {
        let now = Utc::now();
        let since = now - self.policy.fail_window;

        let failures = self.attempts.count_failures(ip, since).await?;
        if failures < self.policy.fail_limit {
            return Ok(());
        }

        let blocked_until = now + self.policy.ban_duration;
        self.blocks
            .upsert(ip, blocked_until, &self.policy.ban_reason())
            .await?;

        tracing::info!(ip = %ip, failures, until = %blocked_until, "Address banned");
        Ok(())
    }
}
