//! Account management flows behind the user routes.
//!
//! Everything here goes through the directory and hasher traits; the only
//! session-side effect is bulk revocation when an account's credentials
//! change or the account disappears.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use warden_core::{Email, UserId};

use crate::{AuthError, HashError, PasswordHasher, Principal, SessionStore, UserDirectory};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 72;

/// bcrypt ignores input past 72 bytes, so longer passwords are refused rather
/// than silently truncated.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} bytes"
        )));
    }
    Ok(())
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserDirectory>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: Arc<dyn SessionStore>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            users,
            hasher,
            sessions,
        }
    }

    pub async fn profile(&self, id: UserId) -> Result<Principal, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .map(Principal::from)
            .ok_or(AuthError::UserNotFound)
    }

    #[instrument(skip(self, update), err)]
    pub async fn update(&self, id: UserId, update: UpdateUser) -> Result<Principal, AuthError> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(name) = update.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            user.name = name.to_string();
        }

        if let Some(raw) = update.email.as_deref().filter(|e| !e.trim().is_empty()) {
            let email = Email::parse(raw)?;
            if email != user.email {
                if self.users.exists_by_email(&email).await? {
                    return Err(AuthError::EmailAlreadyInUse);
                }
                user.email = email;
            }
        }

        user.updated_at = Utc::now();
        if !self.users.update(&user).await? {
            return Err(AuthError::UserNotFound);
        }

        Ok(Principal::from(user))
    }

    /// Delete the account and revoke every session it still holds.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: UserId) -> Result<(), AuthError> {
        if !self.users.delete(id).await? {
            return Err(AuthError::UserNotFound);
        }
        self.sessions.delete_all(id).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Replace the password after checking the current one.
    ///
    /// Nothing is written unless `old_password` verifies. On success every
    /// session of the user is revoked, so the caller must log in again.
    #[instrument(skip(self, old_password, new_password), err)]
    pub async fn change_password(
        &self,
        id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        match self.hasher.verify(old_password, &user.password_hash).await {
            Ok(()) => {}
            Err(HashError::Mismatch) => return Err(AuthError::InvalidPassword),
            Err(HashError::Failed(msg)) => return Err(AuthError::Hashing(msg)),
        }

        validate_password(new_password)?;

        user.password_hash = self
            .hasher
            .hash(new_password)
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        user.updated_at = Utc::now();

        if !self.users.update(&user).await? {
            return Err(AuthError::UserNotFound);
        }
        self.sessions.delete_all(id).await?;
        tracing::info!(user_id = %id, "password changed; sessions revoked");
        Ok(())
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}
