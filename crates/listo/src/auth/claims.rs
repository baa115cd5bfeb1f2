//! JWT claims.

use serde::{Deserialize, Serialize};

/// Token kind carried in the `typ` claim.
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Issued at (as Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,

    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,

    /// User's email.
    #[serde(default)]
    pub email: Option<String>,

    /// User's display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Token type: "access" or "refresh".
    #[serde(default)]
    pub typ: Option<String>,
}

impl Claims {
    /// Whether this is an access token (missing `typ` counts as access
    /// for compatibility with externally issued tokens).
    pub fn is_access(&self) -> bool {
        self.typ.as_deref().is_none_or(|t| t == TOKEN_TYPE_ACCESS)
    }

    pub fn is_refresh(&self) -> bool {
        self.typ.as_deref() == Some(TOKEN_TYPE_REFRESH)
    }

    /// Get the display name for the user.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.sub)
    }
}
