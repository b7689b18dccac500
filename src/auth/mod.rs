//! Authentication module
//!
//! Password hashing, access token (JWT) generation/validation,
//! refresh token generation and bearer header parsing.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use bearer::authorization_header;
pub use bearer::extract_bearer_token;
pub use claims::Claims;
pub use claims::ISSUER;
pub use jwt::generate_access_token;
pub use jwt::generate_access_token_at;
pub use jwt::validate_access_token;
pub use jwt::validate_access_token_at;
pub use password::burn_verification_time;
pub use password::hash_password;
pub use password::verify_password;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::hash_token;
