use axum::Router;

pub mod admin;
pub mod auth;
pub mod common;
pub mod system;
pub mod users;

/// Routes reachable without a session.
pub fn public_router() -> Router {
    Router::new().nest("/auth", auth::public_router())
}

/// Router for all authenticated endpoints (admin routes are added separately
/// behind their permission guard).
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
}
