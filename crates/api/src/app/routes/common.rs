use axum::http::StatusCode;
use axum::response::Response;

use warden_core::UserId;

use crate::app::errors;

/// Parse a `:id` path segment.
pub fn parse_user_id(raw: &str) -> Result<UserId, Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "id must be a UUID"))
}
