//! Application settings
//!
//! Loaded once at startup from an optional `configuration` file and
//! `APP_`-prefixed environment variables (e.g. `APP_JWT__SECRET`).
//! The settings are never mutated afterwards.

use chrono::Duration;

use crate::error::{AppError, ConfigError};

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing settings
///
/// Deliberately not `Debug`: the secret must not end up in logs.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,   // seconds (default 1 hour)
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,  // seconds (default 60 days)
}

fn default_access_token_expiry() -> i64 {
    60 * 60
}

fn default_refresh_token_expiry() -> i64 {
    60 * 24 * 60 * 60
}

/// Upper bound for either token lifetime (100 years).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 100 * 365 * 24 * 60 * 60;

fn check_lifetime(key: &str, seconds: i64) -> Result<(), AppError> {
    if seconds <= 0 {
        return Err(ConfigError::InvalidValue(format!("{} must be positive", key)).into());
    }
    if seconds > MAX_TOKEN_LIFETIME_SECS || Duration::try_seconds(seconds).is_none() {
        return Err(ConfigError::InvalidValue(format!(
            "{} must not exceed {} seconds",
            key, MAX_TOKEN_LIFETIME_SECS
        ))
        .into());
    }
    Ok(())
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry: default_access_token_expiry(),
            refresh_token_expiry: default_refresh_token_expiry(),
        }
    }

    // Clamped so that unvalidated settings still cannot overflow a timestamp.
    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_expiry.clamp(0, MAX_TOKEN_LIFETIME_SECS))
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_expiry.clamp(0, MAX_TOKEN_LIFETIME_SECS))
    }

    /// Reject settings that would make every token unusable or unsigned.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()).into());
        }
        check_lifetime("jwt.access_token_expiry", self.access_token_expiry)?;
        check_lifetime("jwt.refresh_token_expiry", self.refresh_token_expiry)
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.jwt.validate()?;
    Ok(settings)
}
