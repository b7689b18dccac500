//! Refresh Token Generation
//!
//! Refresh tokens are opaque: 256 bytes from the operating system's secure
//! random source, hex-encoded. They carry no claims; the persistence layer
//! owns their association with a user, their expiry and their revocation.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, CryptoError};

const REFRESH_TOKEN_BYTES: usize = 256;

/// Generate a new cryptographically secure refresh token
///
/// # Errors
/// Returns `CryptoError::EntropyUnavailable` if the OS random source fails.
/// The call must not be retried silently.
pub fn generate_refresh_token() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "Secure random source failed");
        AppError::Crypto(CryptoError::EntropyUnavailable(e.to_string()))
    })?;
    Ok(hex::encode(bytes))
}

/// Hash a refresh token using SHA-256
///
/// Stores persist this digest instead of the token itself.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
