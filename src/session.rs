//! Session lifecycle
//!
//! Login issues a pair of tokens: a short-lived signed access token and a
//! long-lived opaque refresh token persisted through the [`SessionStore`].
//! Refresh mints a new access token from an active refresh token (the refresh
//! token itself is not rotated). Revoke retires a refresh token for good.
//!
//! Refresh-token states: `Active -> Revoked`. Expiry is checked when a token
//! is read; nothing sweeps expired records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{
    burn_verification_time, extract_bearer_token, generate_access_token,
    generate_refresh_token, validate_access_token, verify_password,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::store::SessionStore;

/// Tokens returned by a successful login
#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Orchestrates login, refresh and revocation over a session store.
///
/// Built once at startup; holds only read-only configuration and a handle to
/// the store, so clones can be shared freely between workers.
pub struct SessionManager<S> {
    store: Arc<S>,
    jwt: Arc<JwtSettings>,
}

impl<S> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            jwt: Arc::clone(&self.jwt),
        }
    }
}

impl<S: SessionStore + 'static> SessionManager<S> {
    pub fn new(store: S, jwt: JwtSettings) -> Self {
        Self {
            store: Arc::new(store),
            jwt: Arc::new(jwt),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn jwt_settings(&self) -> &JwtSettings {
        &self.jwt
    }

    /// Authenticate with email and password and open a session.
    ///
    /// # Errors
    /// - `AuthError::InvalidCredentials` for an unknown email or a wrong
    ///   password (the caller cannot tell which)
    /// - `CryptoError` if token material cannot be produced
    /// - store errors while reading the user or persisting the refresh token
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens, AppError> {
        let context = ErrorContext::new("login");

        let result = self.open_session(email, password).await;
        if let Err(e) = &result {
            context.log_error(e);
        }
        result
    }

    async fn open_session(&self, email: &str, password: &str) -> Result<SessionTokens, AppError> {
        let user = self.store.find_user_by_email(email).await?;

        let password = password.to_string();
        let user = match user {
            Some(user) => {
                let password_hash = user.password_hash.clone();
                tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                    .await??;
                user
            }
            None => {
                let err = tokio::task::spawn_blocking(move || burn_verification_time(&password))
                    .await?;
                return Err(err);
            }
        };

        let access_token =
            generate_access_token(&user.id, self.jwt.secret.as_bytes(), self.jwt.access_token_ttl())?;
        let refresh_token = generate_refresh_token()?;

        let expires_at = Utc::now() + self.jwt.refresh_token_ttl();
        self.store
            .insert_refresh_token(&refresh_token, user.id, expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in successfully");

        Ok(SessionTokens {
            user_id: user.id,
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry,
        })
    }

    /// Mint a new access token from the refresh token in `authorization`.
    ///
    /// # Errors
    /// - `MissingToken` / `MalformedHeader` for a bad header
    /// - `TokenNotUsable` if the refresh token is unknown, revoked or expired
    pub async fn refresh(&self, authorization: &str) -> Result<String, AppError> {
        let context = ErrorContext::new("refresh");

        let result = self.reissue_access_token(authorization).await;
        if let Err(e) = &result {
            context.log_error(e);
        }
        result
    }

    async fn reissue_access_token(&self, authorization: &str) -> Result<String, AppError> {
        let refresh_token = extract_bearer_token(authorization)?;

        let record = match self.store.find_refresh_token(refresh_token).await? {
            Some(record) => record,
            None => {
                tracing::warn!(cause = "unknown", "Refresh token rejected");
                return Err(AuthError::TokenNotUsable.into());
            }
        };

        let now = Utc::now();
        if !record.is_usable_at(now) {
            let cause = if record.revoked_at.is_some() { "revoked" } else { "expired" };
            tracing::warn!(user_id = %record.user_id, cause, "Refresh token rejected");
            return Err(AuthError::TokenNotUsable.into());
        }

        let access_token = generate_access_token(
            &record.user_id,
            self.jwt.secret.as_bytes(),
            self.jwt.access_token_ttl(),
        )?;

        tracing::info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the refresh token in `authorization`.
    ///
    /// # Errors
    /// - `MissingToken` / `MalformedHeader` for a bad header
    /// - `TokenNotUsable` if the token is unknown or already revoked
    pub async fn revoke(&self, authorization: &str) -> Result<DateTime<Utc>, AppError> {
        let context = ErrorContext::new("revoke");

        let result = self.retire_refresh_token(authorization).await;
        if let Err(e) = &result {
            context.log_error(e);
        }
        result
    }

    async fn retire_refresh_token(&self, authorization: &str) -> Result<DateTime<Utc>, AppError> {
        let refresh_token = extract_bearer_token(authorization)?;

        let revoked_at = self
            .store
            .revoke_refresh_token(refresh_token, Utc::now())
            .await?
            .ok_or(AuthError::TokenNotUsable)?;

        tracing::info!(revoked_at = %revoked_at, "Refresh token revoked");
        Ok(revoked_at)
    }

    /// Revoke every active refresh token of a user ("log out everywhere").
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        let context = ErrorContext::new("revoke_all").with_user_id(user_id.to_string());

        match self.store.revoke_user_refresh_tokens(user_id, Utc::now()).await {
            Ok(count) => {
                tracing::info!(user_id = %user_id, count, "All refresh tokens revoked for user");
                Ok(count)
            }
            Err(e) => {
                context.log_error(&e);
                Err(e)
            }
        }
    }

    /// Verify the access token in `authorization` and return its user.
    pub fn authenticate(&self, authorization: &str) -> Result<Uuid, AppError> {
        let token = extract_bearer_token(authorization)?;
        validate_access_token(token, self.jwt.secret.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    const EMAIL: &str = "walt@breakingbad.com";
    const PASSWORD: &str = "04234";

    fn manager() -> (SessionManager<InMemoryStore>, Uuid) {
        let store = InMemoryStore::new();
        let hash = hash_password(PASSWORD).expect("Failed to hash password");
        let user_id = store.add_user(EMAIL, hash).expect("Failed to add user");
        (SessionManager::new(store, JwtSettings::new("test-secret")), user_id)
    }

    fn auth_error(err: AppError) -> AuthError {
        match err {
            AppError::Auth(e) => e,
            other => panic!("Expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_issues_both_tokens() {
        let (sessions, user_id) = manager();

        let tokens = sessions.login(EMAIL, PASSWORD).await.expect("Login failed");

        assert_eq!(tokens.user_id, user_id);
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 3600);
        assert_eq!(tokens.refresh_token.len(), 512);
        assert_eq!(
            sessions.authenticate(&format!("Bearer {}", tokens.access_token)).unwrap(),
            user_id
        );

        let record = sessions
            .store()
            .find_refresh_token(&tokens.refresh_token)
            .await
            .unwrap()
            .expect("Refresh token not persisted");
        assert_eq!(record.user_id, user_id);
        assert!(record.is_usable_at(Utc::now()));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (sessions, _) = manager();

        let wrong_password = sessions.login(EMAIL, "wrong").await.unwrap_err();
        let unknown_user = sessions.login("nobody@example.com", PASSWORD).await.unwrap_err();

        assert_eq!(auth_error(wrong_password), AuthError::InvalidCredentials);
        assert_eq!(auth_error(unknown_user), AuthError::InvalidCredentials);
        assert_eq!(sessions.store().refresh_token_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_token() {
        let (sessions, user_id) = manager();
        sessions
            .store()
            .insert_refresh_token("stale", user_id, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        let err = sessions.refresh("Bearer stale").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::TokenNotUsable);
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_token() {
        let (sessions, _) = manager();

        let err = sessions.refresh("Bearer nope").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::TokenNotUsable);
    }

    #[tokio::test]
    async fn test_refresh_reports_header_problems() {
        let (sessions, _) = manager();

        assert_eq!(auth_error(sessions.refresh("").await.unwrap_err()), AuthError::MissingToken);
        assert_eq!(
            auth_error(sessions.refresh("Token abc").await.unwrap_err()),
            AuthError::MalformedHeader
        );
    }

    #[tokio::test]
    async fn test_revoke_twice_is_an_error() {
        let (sessions, _) = manager();
        let tokens = sessions.login(EMAIL, PASSWORD).await.unwrap();
        let header = format!("Bearer {}", tokens.refresh_token);

        sessions.revoke(&header).await.expect("First revoke failed");

        let err = sessions.revoke(&header).await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::TokenNotUsable);
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_an_error() {
        let (sessions, _) = manager();

        let err = sessions.revoke("Bearer unknown").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::TokenNotUsable);
    }

    #[tokio::test]
    async fn test_revoke_all_ends_every_session() {
        let (sessions, user_id) = manager();
        let first = sessions.login(EMAIL, PASSWORD).await.unwrap();
        let second = sessions.login(EMAIL, PASSWORD).await.unwrap();

        assert_eq!(sessions.revoke_all(user_id).await.unwrap(), 2);

        for tokens in [first, second] {
            let err = sessions
                .refresh(&format!("Bearer {}", tokens.refresh_token))
                .await
                .unwrap_err();
            assert_eq!(auth_error(err), AuthError::TokenNotUsable);
        }
    }

    #[test]
    fn test_authenticate_rejects_refresh_token_as_access_token() {
        let (sessions, _) = manager();
        let opaque = crate::auth::generate_refresh_token().unwrap();

        let err = sessions.authenticate(&format!("Bearer {}", opaque)).unwrap_err();
        assert!(matches!(auth_error(err), AuthError::TokenInvalid(_)));
    }
}
