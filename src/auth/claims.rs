//! JWT Claims structure
//!
//! Payload of an access token: the registered claims only (RFC 7519).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError, TokenRejection};

/// Issuer written into and required from every access token.
pub const ISSUER: &str = "chirpy";

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token ID; carries the user ID
    pub jti: String,
}

impl Claims {
    /// Create claims for `user_id`, issued at `now` and valid for `ttl`.
    pub fn new(user_id: Uuid, ttl: Duration, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat,
            exp: iat + whole_seconds_ceil(ttl),
            jti: user_id.to_string(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenInvalid(InvalidSubject)` if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::TokenInvalid(TokenRejection::InvalidSubject).into())
    }

    /// A token is expired from the instant `exp` is reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

// A sub-second remainder counts as a full second, so any positive ttl
// yields a token that is valid when issued.
fn whole_seconds_ceil(ttl: Duration) -> i64 {
    let secs = ttl.num_seconds();
    if ttl > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}
