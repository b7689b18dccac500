//! In-memory session store for tests and local development.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RefreshTokenRecord, SessionStore, UserCredentials};
use crate::error::{AppError, DatabaseError};

/// Users keyed by email, refresh tokens keyed by value.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<String, UserCredentials>>,
    refresh_tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with an already hashed password.
    pub fn add_user(&self, email: &str, password_hash: String) -> Result<Uuid, AppError> {
        let mut users = lock(&self.users)?;
        if users.contains_key(email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            )
            .into());
        }
        let id = Uuid::new_v4();
        users.insert(email.to_string(), UserCredentials { id, password_hash });
        Ok(id)
    }

    /// Number of refresh tokens, revoked ones included.
    pub fn refresh_token_count(&self) -> Result<usize, AppError> {
        Ok(lock(&self.refresh_tokens)?.len())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("session store lock poisoned".to_string()))
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        Ok(lock(&self.users)?.get(email).cloned())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(lock(&self.refresh_tokens)?.get(token).cloned())
    }

    async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        if tokens.contains_key(token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Refresh token already exists".to_string(),
            )
            .into());
        }
        tokens.insert(
            token.to_string(),
            RefreshTokenRecord {
                user_id,
                created_at: Utc::now(),
                expires_at,
                revoked_at: None,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        match tokens.get_mut(token) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(now);
                Ok(Some(now))
            }
            _ => Ok(None),
        }
    }

    async fn revoke_user_refresh_tokens(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        let mut revoked = 0;
        for record in tokens.values_mut() {
            if record.user_id == user_id && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}
