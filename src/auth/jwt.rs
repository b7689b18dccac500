//! JWT Token Generation and Validation
//!
//! Access tokens are compact HS256 JWS strings (`header.claims.signature`),
//! verifiable by any conformant implementation holding the same secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::{AppError, AuthError, CryptoError, TokenRejection};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Generate a new access token for a user, valid for `ttl` from now.
///
/// # Errors
/// Returns `CryptoError::SigningFailed` if the token cannot be signed
pub fn generate_access_token(
    user_id: &Uuid,
    secret: &[u8],
    ttl: Duration,
) -> Result<String, AppError> {
    generate_access_token_at(user_id, secret, ttl, Utc::now())
}

/// Generate an access token as if issued at `now`.
pub fn generate_access_token_at(
    user_id: &Uuid,
    secret: &[u8],
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims::new(*user_id, ttl, now);

    encode(
        &Header::new(ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::Crypto(CryptoError::SigningFailed(e.to_string())))
}

/// Validate an access token and return the user it was issued to.
///
/// # Errors
/// Returns `AuthError::TokenInvalid` if the token is malformed, signed with
/// another algorithm or key, issued by someone else, expired, or carries a
/// subject that is not a user ID.
pub fn validate_access_token(token: &str, secret: &[u8]) -> Result<Uuid, AppError> {
    validate_access_token_at(token, secret, Utc::now())
}

/// Validate an access token against the clock value `now`.
///
/// The result depends only on the token, the secret and `now`.
pub fn validate_access_token_at(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<Uuid, AppError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    // Expiry is checked below against `now`, with no leeway.
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| reject(classify(e.kind())))?;

    if claims.is_expired_at(now) {
        return Err(reject(TokenRejection::Expired));
    }

    claims.user_id().map_err(|e| {
        tracing::warn!(cause = %TokenRejection::InvalidSubject, "Access token rejected");
        e
    })
}

fn classify(kind: &ErrorKind) -> TokenRejection {
    match kind {
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenRejection::WrongAlgorithm
        }
        ErrorKind::InvalidSignature => TokenRejection::BadSignature,
        ErrorKind::InvalidIssuer => TokenRejection::WrongIssuer,
        ErrorKind::ExpiredSignature => TokenRejection::Expired,
        _ => TokenRejection::Malformed,
    }
}

fn reject(cause: TokenRejection) -> AppError {
    tracing::warn!(cause = %cause, "Access token rejected");
    AuthError::TokenInvalid(cause).into()
}
