//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs issued by the user service. The caller's identity
//! is the `email` claim, or `sub` when a token carries no email.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::{Credential, VerifiedIdentity};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AppState;
use crate::error::ApiError;

/// Claims read from a verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: u64,
}

impl Claims {
    fn identity(self) -> Option<VerifiedIdentity> {
        self.email
            .or(self.sub)
            .filter(|id| !id.trim().is_empty())
            .map(VerifiedIdentity::new)
    }
}

/// Reasons a request is not authenticated.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidScheme,

    #[error("Invalid or expired token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token carries no user identity")]
    MissingIdentity,
}

/// Verifies tokens signed with the shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Checks signature and expiry and returns the caller's identity.
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?;
        data.claims.identity().ok_or(AuthError::MissingIdentity)
    }
}

/// An authenticated caller.
///
/// Carries the verified identity and the original `Authorization` value,
/// which is forwarded unchanged to the cart service.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub identity: VerifiedIdentity,
    pub credential: Credential,
}

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingHeader)?;

        let token = header
            .strip_prefix("Bearer ")
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidScheme)?;

        let identity = state.verifier.verify(token).inspect_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
        })?;

        Ok(Self {
            identity,
            credential: Credential::new(header),
        })
    }
}
