//! Session persistence contract
//!
//! The authentication core never stores anything itself. It reads user
//! credentials and refresh-token records through [`SessionStore`], which the
//! persistence layer implements. Implementations must make
//! `revoke_refresh_token` an atomic "mark revoked if still active".

mod memory;
mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

pub use memory::InMemoryStore;
pub use postgres::{get_connection_pool, PgStore};

/// Login lookup result
#[derive(Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: String,
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("id", &self.id)
            .field("password_hash", &"[redacted]")
            .finish()
    }
}

/// Stored refresh token association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Active means never revoked and not yet expired at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;

    async fn find_refresh_token(&self, token: &str)
        -> Result<Option<RefreshTokenRecord>, AppError>;

    async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Mark the token revoked at `now` unless it already is.
    ///
    /// Returns the stored revocation time, or `None` if no active record
    /// with this value exists.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError>;

    /// Revoke every active token of a user; returns how many were revoked.
    async fn revoke_user_refresh_tokens(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;
}
