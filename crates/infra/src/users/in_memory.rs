use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use warden_auth::{DirectoryError, UserDirectory, UserRecord};
use warden_core::{Email, UserId};

/// In-memory user directory.
///
/// Intended for tests/dev. E-mail uniqueness is checked under the write lock.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DirectoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, DirectoryError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| &u.email == email))
    }

    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) || users.contains_key(&user.id) {
            return Err(DirectoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &UserRecord) -> Result<bool, DirectoryError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(DirectoryError::Conflict);
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, DirectoryError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
