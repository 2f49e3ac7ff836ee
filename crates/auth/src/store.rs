//! Session store boundary.
//!
//! Keys follow a fixed layout shared with every implementation:
//! `token:<token>` holds a [`SessionRecord`], `user_tokens:<user id>` is the
//! set of record keys owned by that user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use warden_core::UserId;

use crate::{SessionRecord, StoreError};

pub const RECORD_KEY_PREFIX: &str = "token:";
pub const INDEX_KEY_PREFIX: &str = "user_tokens:";

pub fn record_key(token: &str) -> String {
    format!("{RECORD_KEY_PREFIX}{token}")
}

pub fn index_key(user_id: UserId) -> String {
    format!("{INDEX_KEY_PREFIX}{user_id}")
}

/// Inverse of [`record_key`].
pub fn token_from_record_key(key: &str) -> Option<&str> {
    key.strip_prefix(RECORD_KEY_PREFIX)
}

/// TTL-bounded `token → session` store with a per-user revocation index.
///
/// Implementations must:
/// - write the record and its index membership as one atomic unit in `put`,
///   reporting [`StoreError::PartialWrite`] if that cannot be guaranteed;
/// - keep the index alive for at least `ttl` plus their configured grace;
/// - treat deletes of absent records as successful no-ops.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, token: &str, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError>;

    /// `None` once the record expired or was deleted.
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn delete(&self, token: &str) -> Result<(), StoreError>;

    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError>;

    /// Liveness without decoding the record.
    async fn exists(&self, token: &str) -> Result<bool, StoreError>;

    /// Live tokens currently indexed for `user_id`.
    async fn tokens_for(&self, user_id: UserId) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn put(&self, token: &str, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        (**self).put(token, record, ttl).await
    }

    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        (**self).get(token).await
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        (**self).delete(token).await
    }

    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError> {
        (**self).delete_all(user_id).await
    }

    async fn exists(&self, token: &str) -> Result<bool, StoreError> {
        (**self).exists(token).await
    }

    async fn tokens_for(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        (**self).tokens_for(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        let id = UserId::new();
        assert_eq!(record_key("abc"), "token:abc");
        assert_eq!(index_key(id), format!("user_tokens:{id}"));
        assert_eq!(token_from_record_key("token:abc"), Some("abc"));
        assert_eq!(token_from_record_key("user_tokens:abc"), None);
    }
}
