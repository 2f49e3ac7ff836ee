//! Error taxonomy for the session/token subsystem.
//!
//! Authentication failures (`is_unauthorized`) are kept apart from
//! infrastructure failures so a store outage is never reported to a client as
//! a bad token.

use thiserror::Error;

use warden_core::DomainError;

use crate::Permission;

/// Local token verification failures. Detected without any store access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token could not be signed: {0}")]
    Signing(String),
}

/// Session store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached, or a call exceeded its deadline.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// The session record may have been written without its index entry.
    ///
    /// Such a session would survive a bulk revocation, so it is never treated
    /// as a successful issuance.
    #[error("partial session write for user {user_id}: {reason}")]
    PartialWrite { user_id: String, reason: String },

    /// A stored value could not be decoded.
    #[error("corrupt session record: {0}")]
    Corrupt(String),
}

/// User directory failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint (e-mail) was violated.
    #[error("user already exists")]
    Conflict,
}

/// Password hashing failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("password does not match")]
    Mismatch,

    #[error("password hashing failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid role '{0}'")]
    InvalidRole(String),

    /// The current password supplied for a password change did not match.
    #[error("invalid password")]
    InvalidPassword,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("session not found")]
    SessionNotFound,

    #[error("forbidden: missing permission '{0}'")]
    PermissionDenied(Permission),

    #[error("email already in use")]
    EmailAlreadyInUse,

    #[error("user not found")]
    UserNotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(DirectoryError),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// True for every failure a client must see as an opaque "unauthorized".
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::SessionNotFound
                | Self::Token(TokenError::Malformed | TokenError::SignatureInvalid | TokenError::Expired)
        )
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Infrastructure failures: retryable by the client, never a credential problem.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Unavailable(_)) | Self::Directory(DirectoryError::Unavailable(_))
        )
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Conflict => Self::EmailAlreadyInUse,
            other => Self::Directory(other),
        }
    }
}

impl From<DomainError> for AuthError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(_) => Self::UserNotFound,
        }
    }
}
