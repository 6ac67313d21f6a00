//! Session-token verification for the storefront API.
//!
//! Identity travels in a single signed HS256 token; every routing or
//! authorization decision verifies that token. There is deliberately no
//! unsigned "fast path" copy of the identity anywhere.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use storefront_types::domain::identity::{Identity, Role};

/// Sessions last a week, matching the storefront cookie lifetime.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

const ISSUER: &str = "storefront";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("token encoding error: {0}")]
    Encoding(String),
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Role (custom claim)
    pub role: Role,
}

impl SessionClaims {
    pub fn new(identity: Identity, ttl_hours: i64) -> Self {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(ttl_hours);
        Self {
            sub: identity.user_id.to_string(),
            iss: ISSUER.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            role: identity.role,
        }
    }
}

/// Signs a session token for an identity. Token minting itself (login,
/// registration) lives outside this pipeline; this helper exists for the
/// binary's dev tooling and for tests.
pub fn sign_session(identity: Identity, secret: &str, ttl_hours: i64) -> Result<String, AuthError> {
    let claims = SessionClaims::new(identity, ttl_hours);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Verifies session tokens. Cheap to clone; lives in the HTTP state.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
}

impl TokenVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AuthError::InvalidToken)?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }
}

/// Extractor for the resolved caller identity. Rejects with 401 when the
/// bearer token is missing, malformed, expired, or signed with the wrong
/// secret.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Identity);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
    TokenVerifier: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = TokenVerifier::from_ref(state);
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::AuthenticationRequired)?;
        let identity = verifier
            .verify(token)
            .map_err(|_| AppError::AuthenticationRequired)?;
        Ok(Self(identity))
    }
}
