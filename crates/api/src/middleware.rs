use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use warden_auth::AuthService;

use crate::app::errors;
use crate::context::SessionContext;

#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
}

/// Authentication stage.
///
/// Rejects before any I/O when the bearer header is missing or malformed,
/// then resolves the token to a live session and attaches a
/// [`SessionContext`] to the request.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())
        .ok_or_else(errors::unauthorized)?
        .to_string();

    let (claims, session) = state
        .auth
        .resolve(&token)
        .await
        .map_err(errors::auth_error_to_response)?;

    req.extensions_mut()
        .insert(SessionContext::new(token, claims, session));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }
    Some(token)
}
