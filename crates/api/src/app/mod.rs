//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/directory/hasher selection and service assembly
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use warden_auth::Permission;

use crate::authz::{self, PermissionGuard};
use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_router(services))
}

/// Router over already-assembled services.
pub fn build_router(services: AppServices) -> Router {
    let auth_state = middleware::AuthState {
        auth: services.auth.clone(),
    };
    let admin_guard = PermissionGuard::new(services.registry.clone(), Permission::AdminRead);

    let admin = routes::admin::router().layer(axum::middleware::from_fn_with_state(
        admin_guard,
        authz::require_permission,
    ));

    // Protected routes: require a live session.
    let protected = routes::router()
        .nest("/admin", admin)
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::authenticate,
        ));

    let api = routes::public_router().merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", api)
        .layer(ServiceBuilder::new().layer(Extension(Arc::new(services))))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn app() -> Router {
        let mut config = AppConfig::new("router-test-secret");
        config.bcrypt_cost = 4;
        build_router(AppServices::in_memory(&config))
    }

    async fn status_of(req: Request<Body>) -> StatusCode {
        app().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_public() {
        let req = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(req).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_bearer_token() {
        for path in ["/api/v1/auth/validate", "/api/v1/users/profile", "/api/v1/admin/rbac/roles"] {
            let req = Request::get(path).body(Body::empty()).unwrap();
            assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[tokio::test]
    async fn wrong_scheme_and_garbage_tokens_are_unauthorized() {
        let basic = Request::get("/api/v1/auth/validate")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(basic).await, StatusCode::UNAUTHORIZED);

        let garbage = Request::get("/api/v1/auth/validate")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(garbage).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_route_is_public() {
        let req = Request::post("/api/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"email":"new@x.com","password":"long-enough","name":"New"}"#,
            ))
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::CREATED);
    }
}
