//! Collaborators consumed by the auth core: user persistence and password hashing.

use std::sync::Arc;

use async_trait::async_trait;

use warden_core::{Email, UserId};

use crate::{DirectoryError, HashError, UserRecord};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DirectoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError>;

    async fn exists_by_email(&self, email: &Email) -> Result<bool, DirectoryError>;

    /// Fails with [`DirectoryError::Conflict`] if the e-mail is taken.
    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError>;

    /// Returns `false` when no user with that id exists.
    async fn update(&self, user: &UserRecord) -> Result<bool, DirectoryError>;

    /// Returns `false` when no user with that id exists.
    async fn delete(&self, id: UserId) -> Result<bool, DirectoryError>;
}

/// Hash-and-verify primitive.
///
/// Async so CPU-heavy implementations can move work off the request thread.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Err(HashError::Mismatch)` when `plaintext` does not produce `digest`.
    async fn verify(&self, plaintext: &str, digest: &str) -> Result<(), HashError>;
}

#[async_trait]
impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_id(id).await
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, DirectoryError> {
        (**self).exists_by_email(email).await
    }

    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        (**self).create(user).await
    }

    async fn update(&self, user: &UserRecord) -> Result<bool, DirectoryError> {
        (**self).update(user).await
    }

    async fn delete(&self, id: UserId) -> Result<bool, DirectoryError> {
        (**self).delete(id).await
    }
}
