//! Signed access tokens
//!
//! Access tokens are short-lived, symmetric-key signed claim bundles. The
//! signing primitive sits behind [`AccessTokenSigner`] so the credential
//! lifecycle manager depends only on the contract: sign a user into a claim
//! bundle, verify a presented token into claims. Issuer, audience, and expiry
//! are validated on every verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{Error, Role, User, error::TokenError};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - account id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued at (UTC seconds).
    pub iat: i64,
    /// Expiry (UTC seconds).
    pub exp: i64,
}

/// Contract for the external token-signing primitive.
pub trait AccessTokenSigner: Send + Sync + 'static {
    /// Sign a time-bounded access token for `user`.
    fn sign(&self, user: &User, ttl: Duration) -> Result<String, Error>;

    /// Verify a presented token, checking signature, issuer, audience, and
    /// expiry, and return its claims.
    fn verify(&self, token: &str) -> Result<AccessClaims, Error>;
}

/// Configuration for the HS256 signer.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for both signing and verifying.
    pub secret: Vec<u8>,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }
}

/// HS256 implementation of [`AccessTokenSigner`].
pub struct JwtAccessSigner {
    config: JwtConfig,
}

impl JwtAccessSigner {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl AccessTokenSigner for JwtAccessSigner {
    fn sign(&self, user: &User, ttl: Duration) -> Result<String, Error> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.as_str().to_string(),
            email: user.email.clone(),
            role: user.role,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(&self.config.secret);

        encode(&header, &claims, &key)
            .map_err(|e| TokenError::Signing(e.to_string()).into())
    }

    fn verify(&self, token: &str) -> Result<AccessClaims, Error> {
        let key = DecodingKey::from_secret(&self.config.secret);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let data = decode::<AccessClaims>(token, &key, &validation)
            .map_err(|e| TokenError::Verification(e.to_string()))?;

        Ok(data.claims)
    }
}
