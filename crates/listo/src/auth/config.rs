//! Authentication configuration.

use serde::{Deserialize, Serialize};

use super::AuthError;

fn default_access_ttl_minutes() -> i64 {
    30
}

fn default_refresh_ttl_days() -> i64 {
    30
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret used to sign and verify tokens.
    ///
    /// Supports `env:VAR_NAME` syntax to read the secret from the
    /// environment at startup.
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes.
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days.
    pub refresh_ttl_days: i64,

    /// Origins allowed by the CORS layer. Empty means same-origin only.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_ttl_minutes: default_access_ttl_minutes(),
            refresh_ttl_days: default_refresh_ttl_days(),
            allowed_origins: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Resolve `env:VAR_NAME` syntax in the jwt_secret field.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, AuthError> {
        match self.jwt_secret.as_deref() {
            Some(value) => {
                if let Some(var) = value.strip_prefix("env:") {
                    let resolved = std::env::var(var).map_err(|_| {
                        AuthError::Internal(format!("environment variable {var} is not set"))
                    })?;
                    Ok(Some(resolved))
                } else {
                    Ok(Some(value.to_string()))
                }
            }
            None => Ok(None),
        }
    }

    /// Validate the configuration before serving.
    pub fn validate(&self) -> Result<(), AuthError> {
        let secret = self
            .resolve_jwt_secret()?
            .ok_or_else(|| AuthError::Internal("jwt_secret is not configured".to_string()))?;

        if secret.len() < 32 {
            return Err(AuthError::Internal(
                "jwt_secret must be at least 32 characters".to_string(),
            ));
        }

        if self.access_ttl_minutes <= 0 || self.refresh_ttl_days <= 0 {
            return Err(AuthError::Internal(
                "token lifetimes must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
