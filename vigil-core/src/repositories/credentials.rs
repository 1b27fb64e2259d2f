//! Capability interface over the account store.
//!
//! The account store (user records, password hashes, hashing scheme) is a
//! black box behind this trait. The core never sees a password hash; it asks
//! the store to verify a presented secret and gets back a yes/no.

use async_trait::async_trait;

use crate::{Error, NewUser, Role, User, UserId};

/// Account store operations needed by the credential lifecycle manager.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Create an account with the given secret.
    ///
    /// Fails with `AuthError::AlreadyExists` when the email is taken.
    async fn create(&self, user: NewUser, password: &str) -> Result<User, Error>;

    /// Find an account by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Find an account by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Verify a presented secret against the stored hash.
    ///
    /// Returns `false` for a mismatch; errors are reserved for storage
    /// failures.
    async fn verify_password(&self, user_id: &UserId, password: &str) -> Result<bool, Error>;

    /// Disable or re-enable an account.
    async fn set_disabled(&self, user_id: &UserId, disabled: bool) -> Result<(), Error>;

    /// Change an account's role.
    async fn set_role(&self, user_id: &UserId, role: Role) -> Result<(), Error>;
}
