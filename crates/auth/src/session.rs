use serde::{Deserialize, Serialize};

use warden_core::UserId;

use crate::{Permission, Principal, Role, TokenClaims};

/// The store's source of truth for "is this token currently usable".
///
/// `permissions` is a snapshot of the registry taken when the session was
/// issued; it is not recomputed on validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "UserID")]
    pub user_id: UserId,

    #[serde(rename = "Email")]
    pub email: String,

    #[serde(rename = "Role")]
    pub role: Role,

    #[serde(rename = "Permissions", default)]
    pub permissions: Vec<Permission>,
}

/// Result of issuing a session: the bearer token and what was stored for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub claims: TokenClaims,
    pub record: SessionRecord,
}

/// What register/login hand back to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub session: IssuedSession,
    pub principal: Principal,
}
