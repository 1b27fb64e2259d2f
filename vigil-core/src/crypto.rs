//! Refresh-token generation and hashing
//!
//! Refresh tokens are opaque 256-bit random strings. Only their SHA-256 hash
//! is ever persisted; the raw value is returned to the caller once and cannot
//! be recovered afterwards. Lookups go through the hash, and verification uses
//! constant-time comparison so token checks do not leak timing information.
//!
//! SHA-256 (rather than a password KDF) is sufficient here: the tokens carry
//! 256 bits of entropy, so brute-forcing the hash is infeasible and the
//! KDF work factor would buy nothing.

use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a cryptographically secure refresh token.
///
/// Produces a 256-bit random value encoded as URL-safe base64 (43 characters).
///
/// # Panics
///
/// Panics if the OS random number generator fails, which indicates a system
/// failure no security-sensitive operation should continue past.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a raw token for storage and lookup.
///
/// Returns the hex-encoded SHA-256 digest.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a raw token against a stored hash in constant time.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed = hash_token(token);
    constant_time_compare(computed.as_bytes(), stored_hash.as_bytes())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
