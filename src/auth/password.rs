//! Password Hashing and Verification
//!
//! bcrypt with a random salt per hash. Nothing in this module logs
//! password or hash material.

use std::sync::OnceLock;

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, AuthError, CryptoError};

/// Hash a password using bcrypt
///
/// # Errors
/// Returns `CryptoError::HashingFailed` if the salt could not be drawn or the
/// hashing itself failed. The caller must not retry.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        AppError::Crypto(CryptoError::HashingFailed(e.to_string()))
    })
}

/// Verify a password against its stored hash
///
/// # Errors
/// Returns `AuthError::InvalidCredentials` when the password does not match
/// or when the stored hash cannot be parsed. The two cases look the same to
/// the caller.
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
    match verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!("Password does not match stored hash");
            Err(AuthError::InvalidCredentials.into())
        }
        Err(_) => {
            // bcrypt's error text can echo the stored hash
            tracing::error!("Stored password hash is unusable");
            Err(AuthError::InvalidCredentials.into())
        }
    }
}

/// Spend the same CPU time as a real verification, then fail.
///
/// Used when no user matches a login email, so response timing does not
/// reveal which accounts exist.
pub fn burn_verification_time(password: &str) -> AppError {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();

    let placeholder = PLACEHOLDER.get_or_init(|| placeholder_hash(DEFAULT_COST));
    let _ = verify(password, placeholder);

    AuthError::InvalidCredentials.into()
}

// An empty placeholder makes unknown-email logins fail fast, which is
// observable from outside, so the failure is logged loudly.
fn placeholder_hash(cost: u32) -> String {
    hash("placeholder-credential", cost).unwrap_or_else(|e| {
        tracing::error!(
            error = %e,
            "Placeholder hash unavailable; unknown-email logins will not spend verification time"
        );
        String::new()
    })
}
