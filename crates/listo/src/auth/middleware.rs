//! Authentication middleware.

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation, decode, encode};
use log::warn;
use std::sync::Arc;

use super::claims::{TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};
use super::{AuthConfig, AuthError, Claims};

const TOKEN_ISSUER: &str = "listo-backend";

/// Extract a Bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Authentication state shared across handlers.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    encoding_key: Option<EncodingKey>,
    decoding_key: Option<DecodingKey>,
}

impl AuthState {
    /// Create new auth state from config.
    /// Resolves `env:VAR_NAME` syntax in jwt_secret at construction time.
    pub fn new(mut config: AuthConfig) -> Self {
        if let Ok(Some(resolved)) = config.resolve_jwt_secret() {
            config.jwt_secret = Some(resolved);
        }

        let encoding_key = config
            .jwt_secret
            .as_ref()
            .map(|s| EncodingKey::from_secret(s.as_bytes()));
        let decoding_key = config
            .jwt_secret
            .as_ref()
            .map(|s| DecodingKey::from_secret(s.as_bytes()));

        Self {
            config: Arc::new(config),
            encoding_key,
            decoding_key,
        }
    }

    /// Get allowed CORS origins from config.
    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    /// Validate a JWT token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear(); // Allow missing iss/aud

        let token_data = decode::<Claims>(token, decoding_key, &validation).map_err(|e| {
            warn!("JWT validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validate a token and require it to be an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.validate_token(token)?;
        if !claims.is_access() {
            return Err(AuthError::InvalidToken(
                "refresh token used where access token expected".to_string(),
            ));
        }
        Ok(claims)
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
    ) -> Result<String, AuthError> {
        let ttl = Duration::minutes(self.config.access_ttl_minutes);
        self.generate_token(user_id, email, name, TOKEN_TYPE_ACCESS, ttl)
    }

    /// Generate a refresh token for a user.
    pub fn generate_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
    ) -> Result<String, AuthError> {
        let ttl = Duration::days(self.config.refresh_ttl_days);
        self.generate_token(user_id, email, name, TOKEN_TYPE_REFRESH, ttl)
    }

    fn generate_token(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
        token_type: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?;

        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
            iss: Some(TOKEN_ISSUER.to_string()),
            email: Some(email.to_string()),
            name: Some(name.to_string()),
            typ: Some(token_type.to_string()),
        };

        encode(&jsonwebtoken::Header::default(), &claims, encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User claims.
    pub claims: Claims,
}

impl CurrentUser {
    /// Get the user ID.
    pub fn id(&self) -> &str {
        &self.claims.sub
    }

    /// Get display name.
    pub fn display_name(&self) -> &str {
        self.claims.display_name()
    }
}

/// Extract authentication from request.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Authentication middleware.
///
/// Validates JWT access tokens and injects `CurrentUser` into request
/// extensions. Supports two auth methods in priority order:
/// 1. Authorization: Bearer <token> header
/// 2. token query parameter (for browser WebSocket clients)
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    // Allow token in query parameter for WebSocket connections (browsers
    // can't set headers on WS upgrade requests).
    let query_token = req.uri().query().and_then(|q| {
        q.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next()?;
            if key == "token" {
                urlencoding::decode(value).ok().map(|s| s.into_owned())
            } else {
                None
            }
        })
    });

    let claims = if let Some(header) = auth_header {
        let token = bearer_token_from_header(header)?;
        auth.validate_access_token(token)?
    } else if let Some(ref token) = query_token {
        auth.validate_access_token(token)?
    } else {
        return Err(AuthError::MissingAuthHeader);
    };

    let user = CurrentUser { claims };
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
