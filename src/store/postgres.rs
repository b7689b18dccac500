//! PostgreSQL session store
//!
//! Expects the `users` table (`id`, `email`, `hashed_password`) and the
//! `refresh_tokens` table (`token_hash`, `user_id`, `created_at`,
//! `updated_at`, `expires_at`, `revoked_at`). Refresh tokens are stored as
//! SHA-256 digests, never in plaintext.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RefreshTokenRecord, SessionStore, UserCredentials};
use crate::auth::hash_token;
use crate::configuration::DatabaseSettings;
use crate::error::AppError;

/// Build a lazily connecting pool from the database settings.
pub fn get_connection_pool(config: &DatabaseSettings) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(&config.connection_string())?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let user = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(|(id, password_hash)| UserCredentials { id, password_hash }))
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let record = sqlx::query_as::<
            _,
            (Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>),
        >(
            r#"
            SELECT user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(|(user_id, created_at, expires_at, revoked_at)| {
            RefreshTokenRecord {
                user_id,
                created_at,
                expires_at,
                revoked_at,
            }
        }))
    }

    async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $3, $4, NULL)
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let revoked_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token_hash = $2 AND revoked_at IS NULL
            RETURNING revoked_at
            "#,
        )
        .bind(now)
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(revoked_at)
    }

    async fn revoke_user_refresh_tokens(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE user_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
