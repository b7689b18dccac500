//! Authentication and session-lifecycle core of the chirpy backend.

pub mod auth;
pub mod configuration;
pub mod error;
pub mod middleware;
pub mod session;
pub mod store;
pub mod telemetry;
