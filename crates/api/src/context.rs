use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;

use warden_auth::{Permission, Role, SessionRecord, TokenClaims};
use warden_core::UserId;

use crate::app::errors;

/// Authenticated session for a request.
///
/// Inserted into request extensions by [`crate::middleware::authenticate`];
/// handlers take it as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: String,
    claims: TokenClaims,
    session: SessionRecord,
}

impl SessionContext {
    pub fn new(token: String, claims: TokenClaims, session: SessionRecord) -> Self {
        Self {
            token,
            claims,
            session,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }

    pub fn role(&self) -> Role {
        self.session.role
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.session.permissions
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionContext>().cloned().ok_or_else(|| {
            tracing::error!(path = %parts.uri.path(), "session context missing; route is not behind authentication");
            errors::unauthorized()
        })
    }
}
