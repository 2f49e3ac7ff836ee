//! Admin endpoints. Mounted behind an `admin:read` permission guard.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::Response,
    routing::get,
};
use serde_json::{Value, json};

use crate::app::dto::UserResponse;
use crate::app::errors::auth_error_to_response;
use crate::app::routes::common::parse_user_id;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/users/:id", get(get_user))
        .route("/rbac/roles", get(list_roles))
}

/// GET /admin/users/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, Response> {
    let id = parse_user_id(&id)?;
    let principal = services
        .accounts
        .profile(id)
        .await
        .map_err(auth_error_to_response)?;

    Ok(Json(principal.into()))
}

/// GET /admin/rbac/roles - every role with its permissions
pub async fn list_roles(Extension(services): Extension<Arc<AppServices>>) -> Json<Value> {
    Json(json!({ "roles": services.registry.definitions() }))
}
