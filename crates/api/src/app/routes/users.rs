use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, put},
};

use warden_auth::Permission;

use crate::app::dto::{ChangePasswordRequest, MessageResponse, UpdateUserRequest, UserResponse};
use crate::app::errors::{self, auth_error_to_response};
use crate::app::routes::common::parse_user_id;
use crate::app::services::AppServices;
use crate::authz::authorize_target;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/:id", put(update_user).delete(delete_user))
        .route("/:id/password", put(change_password))
}

/// GET /users/profile
pub async fn get_profile(
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

/// PUT /users/:id - self, or `user:write`
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, Response> {
    let id = parse_user_id(&id)?;
    authorize_target(&services.registry, &ctx, id, Permission::UserWrite)?;

    let principal = services
        .accounts
        .update(id, req.into())
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(principal.into()))
}

/// DELETE /users/:id - self, or `user:delete`; revokes the user's sessions
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, Response> {
    let id = parse_user_id(&id)?;
    authorize_target(&services.registry, &ctx, id, Permission::UserDelete)?;

    services
        .accounts
        .delete(id)
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(MessageResponse::new("user deleted")))
}

/// PUT /users/:id/password - own account only; revokes every session
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, Response> {
    let id = parse_user_id(&id)?;
    if id != ctx.user_id() {
        return Err(errors::forbidden());
    }

    services
        .accounts
        .change_password(id, &req.old_password, &req.new_password)
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(MessageResponse::new("password changed")))
}
