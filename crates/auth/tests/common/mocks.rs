//! In-process collaborators for driving `AuthService` in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use warden_auth::store::{index_key, record_key};
use warden_auth::{
    AccountService, AuthService, DirectoryError, HashError, PasswordHasher, PermissionRegistry,
    SessionRecord, SessionStore, StoreError, TokenSigner, UserDirectory, UserRecord,
};
use warden_core::{Email, UserId};

/// Session store without expiry, with switches for failure injection.
#[derive(Default)]
pub struct MockSessionStore {
    records: Mutex<HashMap<String, SessionRecord>>,
    index: Mutex<HashMap<String, HashSet<String>>>,
    pub unavailable: AtomicBool,
    pub fail_index_write: AtomicBool,
    /// Deleting this token fails as if the store went down.
    pub fail_delete_of: Mutex<Option<String>>,
    pub reads: AtomicUsize,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexed(&self, user_id: UserId) -> HashSet<String> {
        self.index
            .lock()
            .unwrap()
            .get(&index_key(user_id))
            .cloned()
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mock store is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn put(&self, token: &str, record: &SessionRecord, _ttl: Duration) -> Result<(), StoreError> {
        self.check_available()?;
        if self.fail_index_write.load(Ordering::SeqCst) {
            return Err(StoreError::PartialWrite {
                user_id: record.user_id.to_string(),
                reason: "index write rejected".to_string(),
            });
        }
        let key = record_key(token);
        self.records.lock().unwrap().insert(key.clone(), record.clone());
        self.index
            .lock()
            .unwrap()
            .entry(index_key(record.user_id))
            .or_default()
            .insert(key);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(&record_key(token)).cloned())
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if self.fail_delete_of.lock().unwrap().as_deref() == Some(token) {
            return Err(StoreError::Unavailable("delete rejected".to_string()));
        }
        let key = record_key(token);
        if let Some(record) = self.records.lock().unwrap().remove(&key) {
            if let Some(set) = self.index.lock().unwrap().get_mut(&index_key(record.user_id)) {
                set.remove(&key);
            }
        }
        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError> {
        self.check_available()?;
        let keys = self
            .index
            .lock()
            .unwrap()
            .remove(&index_key(user_id))
            .unwrap_or_default();
        let mut records = self.records.lock().unwrap();
        for key in keys {
            records.remove(&key);
        }
        Ok(())
    }

    async fn exists(&self, token: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.records.lock().unwrap().contains_key(&record_key(token)))
    }

    async fn tokens_for(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let records = self.records.lock().unwrap();
        Ok(self
            .indexed(user_id)
            .into_iter()
            .filter(|k| records.contains_key(k))
            .filter_map(|k| k.strip_prefix("token:").map(str::to_string))
            .collect())
    }
}

#[derive(Default)]
pub struct MockUserDirectory {
    users: Mutex<HashMap<UserId, UserRecord>>,
    pub updates: AtomicUsize,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, DirectoryError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(DirectoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &UserRecord) -> Result<bool, DirectoryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, DirectoryError> {
        Ok(self.users.lock().unwrap().remove(&id).is_some())
    }
}

/// Reversible "hash" so tests stay fast.
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(format!("plain${plaintext}"))
    }

    async fn verify(&self, plaintext: &str, digest: &str) -> Result<(), HashError> {
        if digest.strip_prefix("plain$") == Some(plaintext) {
            Ok(())
        } else {
            Err(HashError::Mismatch)
        }
    }
}

pub struct Harness {
    pub auth: AuthService,
    pub accounts: AccountService,
    pub sessions: Arc<MockSessionStore>,
    pub users: Arc<MockUserDirectory>,
}

pub fn service_with(ttl: Duration) -> Harness {
    let sessions = Arc::new(MockSessionStore::new());
    let users = Arc::new(MockUserDirectory::new());
    let hasher = Arc::new(PlainHasher);

    let auth = AuthService::new(
        Arc::new(TokenSigner::new("integration-secret", ttl)),
        Arc::new(PermissionRegistry::standard()),
        sessions.clone(),
        users.clone(),
        hasher.clone(),
    );
    let accounts = AccountService::new(users.clone(), hasher, sessions.clone());

    Harness {
        auth,
        accounts,
        sessions,
        users,
    }
}
