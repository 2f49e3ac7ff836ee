use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use warden_auth::{AuthError, StoreError};

/// Map an [`AuthError`] to its HTTP response.
///
/// Authentication failures are opaque; store outages are 503, never 401.
pub fn auth_error_to_response(err: AuthError) -> Response {
    if err.is_unauthorized() {
        return unauthorized();
    }
    if err.is_unavailable() {
        tracing::warn!(error = %err, "backing store unavailable");
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            "session service temporarily unavailable",
        );
    }

    match err {
        AuthError::PermissionDenied(_) => forbidden(),
        AuthError::InvalidRole(role) => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_role",
            format!("unknown role '{role}'"),
        ),
        AuthError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AuthError::InvalidPassword => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_password",
            "current password is incorrect",
        ),
        AuthError::EmailAlreadyInUse => {
            json_error(StatusCode::CONFLICT, "conflict", "email already in use")
        }
        AuthError::UserNotFound => json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        AuthError::Store(StoreError::PartialWrite { user_id, reason }) => {
            tracing::error!(%user_id, %reason, "session write left partially applied");
            internal()
        }
        other => {
            tracing::error!(error = %other, "request failed");
            internal()
        }
    }
}

pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({ "error": "unauthorized" })),
    )
        .into_response()
}

pub fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        axum::Json(json!({ "error": "forbidden" })),
    )
        .into_response()
}

fn internal() -> Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use warden_auth::{DirectoryError, Permission, TokenError};

    #[test]
    fn status_mapping() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::SessionNotFound, StatusCode::UNAUTHORIZED),
            (AuthError::Token(TokenError::Expired), StatusCode::UNAUTHORIZED),
            (AuthError::PermissionDenied(Permission::AdminRead), StatusCode::FORBIDDEN),
            (AuthError::InvalidRole("root".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidPassword, StatusCode::BAD_REQUEST),
            (AuthError::EmailAlreadyInUse, StatusCode::CONFLICT),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (
                AuthError::Store(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Directory(DirectoryError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Store(StoreError::PartialWrite {
                    user_id: "u".into(),
                    reason: "exec".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Token(TokenError::Signing("key".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let label = format!("{err:?}");
            assert_eq!(auth_error_to_response(err).status(), status, "{label}");
        }
    }
}
