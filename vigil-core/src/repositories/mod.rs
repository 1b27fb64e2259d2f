//! Repository traits for the data access layer
//!
//! Services interact with storage only through these traits. The layering
//! follows a composable provider hierarchy:
//!
//! - Individual repository traits define the operations for each data domain
//! - Individual `*Provider` traits expose access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all providers plus
//!   lifecycle methods (migrations, health check)
//!
//! A storage backend implements the repository traits for its own types, the
//! provider traits to hand them out, and `RepositoryProvider` for lifecycle.

pub mod adapter;
pub mod attempts;
pub mod blocks;
pub mod credentials;
pub mod events;
pub mod refresh;

pub use adapter::{
    AttemptLogAdapter, BlockListAdapter, CredentialStoreAdapter, RefreshTokenStoreAdapter,
    RiskEventLogAdapter,
};
pub use attempts::AttemptLog;
pub use blocks::BlockList;
pub use credentials::CredentialStore;
pub use events::RiskEventLog;
pub use refresh::RefreshTokenStore;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for account store access.
pub trait CredentialStoreProvider: Send + Sync + 'static {
    /// The credential store implementation type
    type Credentials: CredentialStore;

    /// Get the credential store
    fn credentials(&self) -> &Self::Credentials;
}

/// Provider trait for attempt log access.
pub trait AttemptLogProvider: Send + Sync + 'static {
    /// The attempt log implementation type
    type Attempts: AttemptLog;

    /// Get the attempt log
    fn attempts(&self) -> &Self::Attempts;
}

/// Provider trait for block list access.
pub trait BlockListProvider: Send + Sync + 'static {
    /// The block list implementation type
    type Blocks: BlockList;

    /// Get the block list
    fn blocks(&self) -> &Self::Blocks;
}

/// Provider trait for refresh token store access.
pub trait RefreshTokenStoreProvider: Send + Sync + 'static {
    /// The refresh token store implementation type
    type RefreshTokens: RefreshTokenStore;

    /// Get the refresh token store
    fn refresh_tokens(&self) -> &Self::RefreshTokens;
}

/// Provider trait for risk event log access.
pub trait RiskEventLogProvider: Send + Sync + 'static {
    /// The risk event log implementation type
    type Events: RiskEventLog;

    /// Get the risk event log
    fn events(&self) -> &Self::Events;
}

/// Provider trait that storage backends implement to supply every repository
/// plus lifecycle operations.
#[async_trait]
pub trait RepositoryProvider:
    CredentialStoreProvider
    + AttemptLogProvider
    + BlockListProvider
    + RefreshTokenStoreProvider
    + RiskEventLogProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
