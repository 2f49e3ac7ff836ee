//! Authorization stage.
//!
//! Runs after [`crate::middleware::authenticate`]. Checks are made against the
//! permission registry by the session's role.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use warden_auth::{Permission, PermissionRegistry, authorize, authorize_self_or};
use warden_core::UserId;

use crate::app::errors;
use crate::context::SessionContext;

/// State for a [`require_permission`] layer: one required permission.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    registry: Arc<PermissionRegistry>,
    required: Permission,
}

impl PermissionGuard {
    pub fn new(registry: Arc<PermissionRegistry>, required: Permission) -> Self {
        Self { registry, required }
    }
}

pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(ctx) = req.extensions().get::<SessionContext>() else {
        tracing::error!(
            path = %req.uri().path(),
            required = %guard.required,
            "permission check without session context; route is not behind authentication"
        );
        return Err(errors::unauthorized());
    };

    if let Err(e) = authorize(&guard.registry, ctx.session(), guard.required) {
        tracing::info!(user_id = %ctx.user_id(), required = %guard.required, "permission denied");
        return Err(errors::auth_error_to_response(e));
    }

    Ok(next.run(req).await)
}

/// In-handler check for routes that act on a path-selected user: acting on
/// yourself is always allowed, anyone else needs `required`.
pub fn authorize_target(
    registry: &PermissionRegistry,
    ctx: &SessionContext,
    target: UserId,
    required: Permission,
) -> Result<(), Response> {
    authorize_self_or(registry, ctx.session(), target, required).map_err(|e| {
        tracing::info!(user_id = %ctx.user_id(), %target, %required, "permission denied");
        errors::auth_error_to_response(e)
    })
}
