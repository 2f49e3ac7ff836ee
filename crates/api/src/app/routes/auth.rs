//! Session endpoints: register, login, logout, refresh and introspection.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};

use crate::app::dto::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, SessionsResponse, TokenResponse,
    UserResponse, ValidateResponse,
};
use crate::app::errors::auth_error_to_response;
use crate::app::services::AppServices;
use crate::context::SessionContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn router() -> Router {
    Router::new()
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/refresh", post(refresh))
        .route("/validate", get(validate))
        .route("/profile", get(profile))
        .route("/sessions", get(sessions))
}

/// POST /auth/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Response> {
    let session = services
        .auth
        .register(req.into())
        .await
        .map_err(auth_error_to_response)?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, Response> {
    let session = services
        .auth
        .login(&req.email, &req.password)
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(session.into()))
}

/// POST /auth/logout - revoke the presented token
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
) -> Result<Json<MessageResponse>, Response> {
    services
        .auth
        .logout(ctx.token())
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(MessageResponse::new("logged out")))
}

/// POST /auth/logout-all - revoke every session of the caller
pub async fn logout_all(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
) -> Result<Json<MessageResponse>, Response> {
    services
        .auth
        .logout_all(ctx.user_id())
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(MessageResponse::new("all sessions logged out")))
}

/// POST /auth/refresh - swap the presented token for a new one
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
) -> Result<Json<TokenResponse>, Response> {
    let fresh = services
        .auth
        .refresh(ctx.token(), ctx.session())
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(fresh.into()))
}

/// GET /auth/validate
pub async fn validate(ctx: SessionContext) -> Json<ValidateResponse> {
    Json(ValidateResponse::from(&ctx))
}

/// GET /auth/profile
pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
) -> Result<Json<UserResponse>, Response> {
    let principal = services
        .accounts
        .profile(ctx.user_id())
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(principal.into()))
}

/// GET /auth/sessions - live sessions of the caller
pub async fn sessions(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
) -> Result<Json<SessionsResponse>, Response> {
    let sessions = services
        .auth
        .active_sessions(ctx.user_id())
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(SessionsResponse { sessions }))
}
