//! Bearer credential extraction from `Authorization` header values.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::{AppError, AuthError};

const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is case-sensitive. Whatever follows it, trimmed of
/// surrounding whitespace, is the token, so `BearerXYZ` yields `XYZ`.
///
/// # Errors
/// - `AuthError::MissingToken` if the value is empty
/// - `AuthError::MalformedHeader` if the scheme is not `Bearer` or no token follows it
pub fn extract_bearer_token(header_value: &str) -> Result<&str, AppError> {
    if header_value.trim().is_empty() {
        return Err(AuthError::MissingToken.into());
    }

    let remainder = header_value
        .strip_prefix(BEARER_SCHEME)
        .ok_or(AuthError::MalformedHeader)?;

    let token = remainder.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader.into());
    }

    Ok(token)
}

/// Raw `Authorization` header value, or `""` when absent or not valid text.
pub fn authorization_header(headers: &HeaderMap) -> &str {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
