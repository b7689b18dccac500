//! Middleware module
//!
//! Request-layer glue for protecting routes with access tokens.

mod jwt_middleware;

pub use jwt_middleware::AuthenticatedUser;
pub use jwt_middleware::JwtMiddleware;
