//! Adapters that wrap a [`RepositoryProvider`] and implement the individual
//! repository traits, so services can be generic over a single repository
//! each instead of the whole provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    BlockedIp, Error, IpRiskSummary, LoginAttempt, NewLoginAttempt, NewRiskEvent, NewUser,
    RefreshToken, RiskEvent, Role, User, UserId,
    repositories::{
        AttemptLog, BlockList, CredentialStore, RefreshTokenStore, RepositoryProvider,
        RiskEventLog,
    },
};

pub struct CredentialStoreAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CredentialStoreAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CredentialStore for CredentialStoreAdapter<R> {
    async fn create(&self, user: NewUser, password: &str) -> Result<User, Error> {
        self.provider.credentials().create(user, password).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.credentials().find_by_email(email).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.credentials().find_by_id(id).await
    }

    async fn verify_password(&self, user_id: &UserId, password: &str) -> Result<bool, Error> {
        self.provider
            .credentials()
            .verify_password(user_id, password)
            .await
    }

    async fn set_disabled(&self, user_id: &UserId, disabled: bool) -> Result<(), Error> {
        self.provider
            .credentials()
            .set_disabled(user_id, disabled)
            .await
    }

    async fn set_role(&self, user_id: &UserId, role: Role) -> Result<(), Error> {
        self.provider.credentials().set_role(user_id, role).await
    }
}

pub struct AttemptLogAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AttemptLogAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AttemptLog for AttemptLogAdapter<R> {
    async fn record(&self, attempt: NewLoginAttempt) -> Result<LoginAttempt, Error> {
        self.provider.attempts().record(attempt).await
    }

    async fn count_failures(&self, ip: &str, since: DateTime<Utc>) -> Result<u32, Error> {
        self.provider.attempts().count_failures(ip, since).await
    }

    async fn attempts_for_ip(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<LoginAttempt>, Error> {
        self.provider.attempts().attempts_for_ip(ip, since).await
    }
}

pub struct BlockListAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> BlockListAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> BlockList for BlockListAdapter<R> {
    async fn find(&self, ip: &str) -> Result<Option<BlockedIp>, Error> {
        self.provider.blocks().find(ip).await
    }

    async fn upsert(
        &self,
        ip: &str,
        blocked_until: DateTime<Utc>,
        reason: &str,
    ) -> Result<BlockedIp, Error> {
        self.provider.blocks().upsert(ip, blocked_until, reason).await
    }

    async fn remove(&self, ip: &str) -> Result<bool, Error> {
        self.provider.blocks().remove(ip).await
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<BlockedIp>, Error> {
        self.provider.blocks().list_active(now).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.blocks().delete_expired(now).await
    }
}

pub struct RefreshTokenStoreAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> RefreshTokenStoreAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> RefreshTokenStore for RefreshTokenStoreAdapter<R> {
    async fn insert(&self, token: RefreshToken) -> Result<RefreshToken, Error> {
        self.provider.refresh_tokens().insert(token).await
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<RefreshToken>, Error> {
        self.provider.refresh_tokens().find_by_hash(hash).await
    }

    async fn rotate(&self, presented_hash: &str, successor: RefreshToken) -> Result<(), Error> {
        self.provider
            .refresh_tokens()
            .rotate(presented_hash, successor)
            .await
    }

    async fn revoke(&self, hash: &str) -> Result<(), Error> {
        self.provider.refresh_tokens().revoke(hash).await
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.refresh_tokens().purge(now).await
    }
}

pub struct RiskEventLogAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> RiskEventLogAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> RiskEventLog for RiskEventLogAdapter<R> {
    async fn append_deduped(
        &self,
        event: NewRiskEvent,
        window_start: DateTime<Utc>,
    ) -> Result<bool, Error> {
        self.provider
            .events()
            .append_deduped(event, window_start)
            .await
    }

    async fn recent(&self, limit: u32) -> Result<Vec<RiskEvent>, Error> {
        self.provider.events().recent(limit).await
    }

    async fn top_ips(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<IpRiskSummary>, Error> {
        self.provider.events().top_ips(since, limit).await
    }
}
