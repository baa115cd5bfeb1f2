//! Authentication module.
//!
//! Provides JWT issuance and validation plus the axum middleware that
//! injects `CurrentUser` into request extensions.

mod claims;
mod config;
mod error;
mod middleware;

pub use claims::Claims;
pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{AuthState, CurrentUser, auth_middleware};
