use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use warden_auth::store::{index_key, record_key, token_from_record_key};
use warden_auth::{SessionRecord, SessionStore, StoreError};
use warden_core::UserId;

use crate::config::StoreConfig;

#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Writes between two full sweeps of expired entries.
const SWEEP_EVERY: u64 = 256;

#[derive(Debug, Default)]
struct State {
    records: HashMap<String, Expiring<SessionRecord>>,
    indexes: HashMap<String, Expiring<HashSet<String>>>,
    writes: u64,
}

impl State {
    /// Drop expired records, expired indexes, and index members whose record
    /// is gone. Returns how many records and indexes went.
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.records.len() + self.indexes.len();
        self.records.retain(|_, r| r.is_live(now));
        self.indexes.retain(|_, i| i.is_live(now));

        let records = &self.records;
        for index in self.indexes.values_mut() {
            index.value.retain(|key| records.contains_key(key));
        }
        before - (self.records.len() + self.indexes.len())
    }
}

/// Process-local session store.
///
/// Intended for tests/dev and single-node deployments. Expired entries are
/// dropped lazily when touched, from a user's index whenever that user gets
/// a new session, and in bulk every few hundred writes or by
/// [`purge_expired`].
///
/// [`purge_expired`]: InMemorySessionStore::purge_expired
#[derive(Debug)]
pub struct InMemorySessionStore {
    state: RwLock<State>,
    index_grace: Duration,
}

impl InMemorySessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: RwLock::new(State::default()),
            index_grace: config.index_grace,
        }
    }

    /// Drop every expired record and index. Returns how many entries went.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        self.state.write().await.sweep(now)
    }

    async fn live_record(&self, key: &str) -> Option<SessionRecord> {
        let now = Instant::now();
        {
            let state = self.state.read().await;
            match state.records.get(key) {
                None => return None,
                Some(r) if r.is_live(now) => return Some(r.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict unless someone rewrote it in the meantime.
        let mut state = self.state.write().await;
        if state.records.get(key).is_some_and(|r| !r.is_live(now)) {
            state.records.remove(key);
        }
        None
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, token: &str, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let key = record_key(token);
        let index_expiry = now + ttl + self.index_grace;

        let mut state = self.state.write().await;
        let State {
            records, indexes, ..
        } = &mut *state;

        records.insert(
            key.clone(),
            Expiring {
                value: record.clone(),
                expires_at: now + ttl,
            },
        );

        let index = indexes
            .entry(index_key(record.user_id))
            .or_insert_with(|| Expiring {
                value: HashSet::new(),
                expires_at: index_expiry,
            });
        if !index.is_live(now) {
            index.value.clear();
        }
        // Only ever extend.
        index.expires_at = index.expires_at.max(index_expiry);
        index.value.retain(|member| {
            let live = records.get(member).is_some_and(|r| r.is_live(now));
            if !live {
                records.remove(member);
            }
            live
        });
        index.value.insert(key);

        state.writes += 1;
        if state.writes % SWEEP_EVERY == 0 {
            let swept = state.sweep(now);
            tracing::debug!(swept, "expired in-memory sessions swept");
        }

        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.live_record(&record_key(token)).await)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let key = record_key(token);
        let mut state = self.state.write().await;

        let Some(record) = state.records.remove(&key) else {
            return Ok(());
        };
        if let Some(index) = state.indexes.get_mut(&index_key(record.value.user_id)) {
            index.value.remove(&key);
        }
        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        let Some(index) = state.indexes.remove(&index_key(user_id)) else {
            return Ok(());
        };
        for key in &index.value {
            state.records.remove(key);
        }
        tracing::debug!(%user_id, revoked = index.value.len(), "in-memory sessions revoked");
        Ok(())
    }

    async fn exists(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.live_record(&record_key(token)).await.is_some())
    }

    async fn tokens_for(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let state = self.state.read().await;

        let Some(index) = state.indexes.get(&index_key(user_id)).filter(|i| i.is_live(now)) else {
            return Ok(Vec::new());
        };

        Ok(index
            .value
            .iter()
            .filter(|key| state.records.get(*key).is_some_and(|r| r.is_live(now)))
            .filter_map(|key| token_from_record_key(key).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use warden_auth::{Permission, Role};

    const TTL: Duration = Duration::from_secs(60);

    fn record(user_id: UserId) -> SessionRecord {
        SessionRecord {
            user_id,
            email: "a@x.com".to_string(),
            role: Role::User,
            permissions: vec![Permission::UserRead],
        }
    }

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(StoreConfig::new(Duration::from_secs(30), Duration::from_secs(1)))
    }

    #[tokio::test(start_paused = true)]
    async fn record_lives_until_ttl() {
        let store = store();
        let r = record(UserId::new());
        store.put("t1", &r, TTL).await.unwrap();

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert_eq!(store.get("t1").await.unwrap(), Some(r));
        assert!(store.exists("t1").await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("t1").await.unwrap(), None);
        assert!(!store.exists("t1").await.unwrap());
    }

    #[tokio::test]
    async fn double_delete_is_a_no_op() {
        let store = store();
        store.put("t1", &record(UserId::new()), TTL).await.unwrap();

        store.delete("t1").await.unwrap();
        store.delete("t1").await.unwrap();
        store.delete("never-existed").await.unwrap();

        assert_eq!(store.get("t1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_all_only_touches_one_user() {
        let store = store();
        let p = UserId::new();
        let q = UserId::new();
        for t in ["t1", "t2", "t3"] {
            store.put(t, &record(p), TTL).await.unwrap();
        }
        store.put("t4", &record(q), TTL).await.unwrap();

        store.delete_all(p).await.unwrap();

        for t in ["t1", "t2", "t3"] {
            assert_eq!(store.get(t).await.unwrap(), None);
        }
        assert!(store.get("t4").await.unwrap().is_some());
        assert!(store.tokens_for(p).await.unwrap().is_empty());
        assert_eq!(store.tokens_for(q).await.unwrap(), vec!["t4".to_string()]);
    }

    #[tokio::test]
    async fn delete_all_on_empty_index_is_a_no_op() {
        store().delete_all(UserId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_then_delete_all_interleave_cleanly() {
        let store = store();
        let p = UserId::new();
        store.put("t1", &record(p), TTL).await.unwrap();
        store.put("t2", &record(p), TTL).await.unwrap();

        let (a, b) = tokio::join!(store.delete("t1"), store.delete_all(p));
        a.unwrap();
        b.unwrap();

        assert_eq!(store.get("t1").await.unwrap(), None);
        assert_eq!(store.get("t2").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn index_outlives_sessions_by_grace_and_only_extends() {
        let store = store();
        let p = UserId::new();
        store.put("long", &record(p), TTL * 10).await.unwrap();
        store.put("short", &record(p), TTL).await.unwrap();

        // The short put must not shrink the index below the long session.
        tokio::time::advance(TTL * 5).await;
        assert_eq!(store.tokens_for(p).await.unwrap(), vec!["long".to_string()]);

        store.delete_all(p).await.unwrap();
        assert_eq!(store.get("long").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_expired_entries() {
        let store = store();
        let p = UserId::new();
        store.put("t1", &record(p), TTL).await.unwrap();

        tokio::time::advance(TTL + Duration::from_secs(30)).await;
        // One record plus one index.
        assert_eq!(store.purge_expired().await, 2);
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_logins_do_not_accumulate_dead_sessions() {
        let store = store();
        let p = UserId::new();

        for i in 0..500 {
            store.put(&format!("t{i}"), &record(p), TTL).await.unwrap();
            tokio::time::advance(TTL + Duration::from_secs(1)).await;
        }
        store.put("last", &record(p), TTL).await.unwrap();

        let state = store.state.read().await;
        assert_eq!(state.indexes[&index_key(p)].value.len(), 1);
        assert_eq!(state.records.len(), 1);
        drop(state);
        assert_eq!(store.tokens_for(p).await.unwrap(), vec!["last".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_sweep_drops_abandoned_users() {
        let store = store();
        for i in 0..SWEEP_EVERY - 1 {
            store.put(&format!("once-{i}"), &record(UserId::new()), TTL).await.unwrap();
        }
        tokio::time::advance(TTL + Duration::from_secs(31)).await;

        // This write triggers the sweep.
        let p = UserId::new();
        store.put("fresh", &record(p), TTL).await.unwrap();

        let state = store.state.read().await;
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.indexes.len(), 1);
        assert!(state.indexes.contains_key(&index_key(p)));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_prunes_dead_members_from_live_indexes() {
        let store = store();
        let p = UserId::new();
        store.put("long", &record(p), TTL * 10).await.unwrap();
        store.put("short", &record(p), TTL).await.unwrap();

        tokio::time::advance(TTL).await;
        assert_eq!(store.purge_expired().await, 1);

        let state = store.state.read().await;
        let members: Vec<_> = state.indexes[&index_key(p)].value.iter().cloned().collect();
        assert_eq!(members, vec![record_key("long")]);
    }
}
