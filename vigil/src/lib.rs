//! # Vigil
//!
//! Vigil issues and revokes credentials for API clients while continuously
//! estimating the abuse risk of the originating network address. It combines
//! a credential lifecycle manager (password login, refresh-token rotation,
//! idempotent logout, auto-ban of abusive addresses) with a risk scoring
//! engine that reads the same attempt history and emits deduplicated risk
//! events.
//!
//! Scoring never gates logins. The hard ban lives in the login path; scoring
//! is the parallel observability and detection layer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::{JwtConfig, Vigil};
//! use vigil_storage_sqlite::SqliteRepositoryProvider;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!
//!     let vigil = Vigil::new(
//!         repositories,
//!         JwtConfig::new(b"change-me".to_vec(), "vigil", "vigil-api"),
//!     );
//!     vigil.migrate().await.unwrap();
//! }
//! ```

use std::sync::Arc;

use vigil_core::{
    AccessClaims, AccessTokenSigner, JwtAccessSigner,
    repositories::{
        AttemptLogAdapter, BlockListAdapter, CredentialStoreAdapter, RefreshTokenStoreAdapter,
        RiskEventLogAdapter,
    },
    services::{AuthService, RiskService, Sweeper},
};

/// Re-export core types commonly used with the Vigil API.
pub use vigil_core::{
    BlockedIp, Error, IpRiskSummary, JwtConfig, LoginAttempt, RiskEvent, RiskPolicy, RiskScore,
    Role, TokenPair, TokenPolicy, User, UserId, services::LoginContext,
};

pub use vigil_core::RepositoryProvider;

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use vigil_storage_sqlite::SqliteRepositoryProvider;

use chrono::{Duration, Utc};

/// The central coordinator wiring repositories into the credential lifecycle
/// and risk scoring services.
pub struct Vigil<R: RepositoryProvider> {
    repositories: Arc<R>,
    auth_service: Arc<
        AuthService<
            CredentialStoreAdapter<R>,
            AttemptLogAdapter<R>,
            BlockListAdapter<R>,
            RefreshTokenStoreAdapter<R>,
        >,
    >,
    risk_service:
        Arc<RiskService<AttemptLogAdapter<R>, BlockListAdapter<R>, RiskEventLogAdapter<R>>>,
    signer: Arc<dyn AccessTokenSigner>,
    sweep_interval: std::time::Duration,
}

impl<R: RepositoryProvider> Vigil<R> {
    /// Create a Vigil instance with default policies.
    pub fn new(repositories: Arc<R>, jwt_config: JwtConfig) -> Self {
        Self::with_policies(
            repositories,
            jwt_config,
            RiskPolicy::default(),
            TokenPolicy::default(),
        )
    }

    /// Create a Vigil instance with explicit policies.
    pub fn with_policies(
        repositories: Arc<R>,
        jwt_config: JwtConfig,
        policy: RiskPolicy,
        tokens: TokenPolicy,
    ) -> Self {
        let signer: Arc<dyn AccessTokenSigner> = Arc::new(JwtAccessSigner::new(jwt_config));

        let credentials = Arc::new(CredentialStoreAdapter::new(repositories.clone()));
        let attempts = Arc::new(AttemptLogAdapter::new(repositories.clone()));
        let blocks = Arc::new(BlockListAdapter::new(repositories.clone()));
        let refresh_tokens = Arc::new(RefreshTokenStoreAdapter::new(repositories.clone()));
        let events = Arc::new(RiskEventLogAdapter::new(repositories.clone()));

        let auth_service = Arc::new(AuthService::new(
            credentials,
            attempts.clone(),
            blocks.clone(),
            refresh_tokens,
            signer.clone(),
            policy.clone(),
            tokens,
        ));

        let risk_service = Arc::new(RiskService::new(attempts, blocks, events, policy));

        Self {
            repositories,
            auth_service,
            risk_service,
            signer,
            sweep_interval: vigil_core::services::DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Override the cleanup sweeper interval.
    pub fn with_sweep_interval(mut self, interval: std::time::Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Register an account with the default role.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, Error> {
        self.auth_service.register(email, password).await
    }

    /// Authenticate and issue an access/refresh token pair.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ctx: &LoginContext,
    ) -> Result<TokenPair, Error> {
        self.auth_service.login(email, password, ctx).await
    }

    /// Rotate a refresh token into a new pair. Single-use per token.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<TokenPair, Error> {
        self.auth_service.refresh(raw_refresh_token).await
    }

    /// Revoke a refresh token. Idempotent.
    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), Error> {
        self.auth_service.logout(raw_refresh_token).await
    }

    /// Verify a presented access token and return its claims.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, Error> {
        self.signer.verify(token)
    }

    /// Compute the risk score for an address, emitting deduplicated events.
    pub async fn score(&self, ip: &str) -> Result<RiskScore, Error> {
        self.risk_service.score(ip).await
    }

    /// Latest persisted risk events (admin view).
    pub async fn recent_events(&self, limit: u32) -> Result<Vec<RiskEvent>, Error> {
        self.risk_service.recent_events(limit).await
    }

    /// Addresses ranked by aggregated score delta over the last 24 hours.
    pub async fn top_ips(&self, limit: u32) -> Result<Vec<IpRiskSummary>, Error> {
        self.risk_service
            .top_ips(Utc::now() - Duration::hours(24), limit)
            .await
    }

    /// Block entries still in force (admin view).
    pub async fn list_blocked(&self) -> Result<Vec<BlockedIp>, Error> {
        use vigil_core::repositories::BlockList;
        BlockListAdapter::new(self.repositories.clone())
            .list_active(Utc::now())
            .await
    }

    /// Remove the block entry for an address.
    ///
    /// Fails with a not-found storage error when no entry exists.
    pub async fn unblock(&self, ip: &str) -> Result<(), Error> {
        use vigil_core::repositories::BlockList;
        let removed = BlockListAdapter::new(self.repositories.clone())
            .remove(ip)
            .await?;
        if !removed {
            return Err(vigil_core::error::StorageError::NotFound.into());
        }
        tracing::info!(ip = %ip, "Address unblocked by operator");
        Ok(())
    }

    /// Promote an account to the admin role.
    pub async fn promote(&self, email: &str) -> Result<User, Error> {
        use vigil_core::repositories::CredentialStore;
        let credentials = CredentialStoreAdapter::new(self.repositories.clone());
        let user = credentials
            .find_by_email(email)
            .await?
            .ok_or(vigil_core::error::StorageError::NotFound)?;

        if !user.role.is_admin() {
            credentials.set_role(&user.id, Role::Admin).await?;
        }

        credentials
            .find_by_id(&user.id)
            .await?
            .ok_or_else(|| vigil_core::error::StorageError::NotFound.into())
    }

    /// Disable or re-enable an account.
    pub async fn set_account_disabled(&self, email: &str, disabled: bool) -> Result<(), Error> {
        use vigil_core::repositories::CredentialStore;
        let credentials = CredentialStoreAdapter::new(self.repositories.clone());
        let user = credentials
            .find_by_email(email)
            .await?
            .ok_or(vigil_core::error::StorageError::NotFound)?;

        credentials.set_disabled(&user.id, disabled).await
    }

    /// Spawn the background cleanup sweeper.
    ///
    /// The task purges expired block entries and dead refresh tokens on the
    /// configured interval and exits when `shutdown` changes.
    pub fn start_sweeper(
        &self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let blocks = Arc::new(BlockListAdapter::new(self.repositories.clone()));
        let refresh_tokens = Arc::new(RefreshTokenStoreAdapter::new(self.repositories.clone()));

        Sweeper::new(blocks, refresh_tokens)
            .with_interval(self.sweep_interval)
            .spawn(shutdown)
    }
}
