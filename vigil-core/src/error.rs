use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The originating address has an active block entry.
    #[error("Address blocked until {until}")]
    Blocked { until: chrono::DateTime<chrono::Utc> },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Account already exists")]
    AlreadyExists,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid refresh token")]
    Invalid,

    #[error("Refresh token revoked")]
    Revoked,

    #[error("Refresh token expired")]
    Expired,

    #[error("Access token signing failed: {0}")]
    Signing(String),

    #[error("Access token verification failed: {0}")]
    Verification(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

impl Error {
    /// Errors callers should treat as an authentication failure (401-class).
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
            || matches!(
                self,
                Error::Token(TokenError::Invalid)
                    | Error::Token(TokenError::Revoked)
                    | Error::Token(TokenError::Expired)
            )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(StorageError::NotFound))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let auth_error = Error::Auth(AuthError::InvalidCredentials);
        assert_eq!(
            auth_error.to_string(),
            "Authentication error: Invalid credentials"
        );

        let token_error = Error::Token(TokenError::Revoked);
        assert_eq!(token_error.to_string(), "Token error: Refresh token revoked");

        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");
    }

    #[test]
    fn test_is_auth_error() {
        assert!(Error::Auth(AuthError::InvalidCredentials).is_auth_error());
        assert!(Error::Auth(AuthError::AccountDisabled).is_auth_error());
        assert!(Error::Token(TokenError::Revoked).is_auth_error());
        assert!(!Error::Storage(StorageError::NotFound).is_auth_error());
        assert!(!Error::Token(TokenError::Signing("bad key".into())).is_auth_error());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::Storage(StorageError::NotFound).is_not_found());
        assert!(!Error::Storage(StorageError::Database("x".into())).is_not_found());
    }

    #[test]
    fn test_error_from_conversions() {
        let error: Error = AuthError::AlreadyExists.into();
        assert!(matches!(error, Error::Auth(AuthError::AlreadyExists)));

        let error: Error = TokenError::Expired.into();
        assert!(matches!(error, Error::Token(TokenError::Expired)));

        let error: Error = ValidationError::MissingField("email".into()).into();
        assert!(error.is_validation_error());
    }
}
