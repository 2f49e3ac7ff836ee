//! Redis-backed session store.
//!
//! Layout:
//! - `token:<token>` holds the JSON session record, `SET .. EX ttl`
//! - `user_tokens:<user id>` is a set of record keys, kept alive for at least
//!   `ttl + index_grace`
//!
//! `put` runs as one `MULTI/EXEC`. The index expiry uses `EXPIRE .. NX`
//! followed by `EXPIRE .. GT`, so it is set when missing and otherwise only
//! ever extended (Redis 7+). Members whose record has expired are removed
//! from the index after every `put` and whenever the index is listed.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use warden_auth::store::{index_key, record_key, token_from_record_key};
use warden_auth::{SessionRecord, SessionStore, StoreError};
use warden_core::UserId;

use crate::config::StoreConfig;

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    config: StoreConfig,
}

impl RedisSessionStore {
    /// Connect to `redis_url`, bounded by the configured call timeout.
    pub async fn connect(redis_url: impl AsRef<str>, config: StoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {e}")))?;

        let conn = bounded(config.call_timeout, "connect", client.get_connection_manager()).await?;
        tracing::info!("connected to redis session store");

        Ok(Self { conn, config })
    }

    pub fn from_connection(conn: ConnectionManager, config: StoreConfig) -> Self {
        Self { conn, config }
    }

    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        bounded(self.config.call_timeout, op, fut).await
    }

    /// After a failed transaction, make sure no record is left without its
    /// index entry.
    async fn withdraw_partial(&self, token: &str, user_id: UserId, reason: String) -> StoreError {
        let key = record_key(token);
        let landed = match self.exists(token).await {
            Ok(landed) => landed,
            // Cannot tell; report the original failure.
            Err(_) => return StoreError::Unavailable(reason),
        };

        if !landed {
            return StoreError::Unavailable(reason);
        }

        let mut conn = self.conn.clone();
        if let Err(e) = self.run::<(), _>("del", conn.del(&key)).await {
            tracing::error!(error = %e, %user_id, "failed to withdraw partially written session");
        }
        StoreError::PartialWrite {
            user_id: user_id.to_string(),
            reason,
        }
    }

    /// Live members of the index at `idx`; dead ones are removed from it.
    async fn prune_index(&self, idx: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = self.run("smembers", conn.smembers(idx)).await?;

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in &keys {
            pipe.exists(key);
        }
        let mut conn = self.conn.clone();
        let flags: Vec<bool> = self.run("exists", pipe.query_async(&mut conn)).await?;

        let (live, dead) = partition_live(keys, flags);
        if !dead.is_empty() {
            let mut conn = self.conn.clone();
            self.run::<(), _>("srem", conn.srem(idx, &dead)).await?;
            tracing::debug!(pruned = dead.len(), "expired sessions dropped from index");
        }
        Ok(live)
    }
}

/// Split index members into (live, dead) by their `EXISTS` flags.
fn partition_live(keys: Vec<String>, flags: Vec<bool>) -> (Vec<String>, Vec<String>) {
    let (live, dead): (Vec<_>, Vec<_>) = keys.into_iter().zip(flags).partition(|(_, live)| *live);
    (
        live.into_iter().map(|(key, _)| key).collect(),
        dead.into_iter().map(|(key, _)| key).collect(),
    )
}

async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StoreError::Unavailable(format!("redis {op} failed: {e}"))),
        Err(_) => Err(StoreError::Unavailable(format!(
            "redis {op} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    #[instrument(skip(self, token, record), fields(user_id = %record.user_id), err)]
    async fn put(&self, token: &str, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let key = record_key(token);
        let idx = index_key(record.user_id);
        let payload = serde_json::to_string(record).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let record_secs = ttl.as_secs().max(1);
        let index_secs = record_secs + self.config.index_grace.as_secs();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set_ex(&key, payload, record_secs)
            .ignore()
            .sadd(&idx, &key)
            .ignore()
            .cmd("EXPIRE")
            .arg(&idx)
            .arg(index_secs)
            .arg("NX")
            .ignore()
            .cmd("EXPIRE")
            .arg(&idx)
            .arg(index_secs)
            .arg("GT")
            .ignore();

        let mut conn = self.conn.clone();
        match self.run::<(), _>("multi", pipe.query_async(&mut conn)).await {
            Ok(()) => {}
            Err(StoreError::Unavailable(reason)) => {
                return Err(self.withdraw_partial(token, record.user_id, reason).await);
            }
            Err(other) => return Err(other),
        }

        // The session is stored; a failed prune is retried on the next write.
        if let Err(e) = self.prune_index(&idx).await {
            tracing::warn!(error = %e, "failed to prune session index");
        }
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = self.run("get", conn.get(record_key(token))).await?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| StoreError::Corrupt(format!("undecodable session record: {e}")))
        })
        .transpose()
    }

    #[instrument(skip(self, token), err)]
    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let Some(record) = self.get(token).await? else {
            return Ok(());
        };
        let key = record_key(token);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .srem(index_key(record.user_id), &key)
            .ignore()
            .del(&key)
            .ignore();

        let mut conn = self.conn.clone();
        self.run("delete", pipe.query_async(&mut conn)).await
    }

    #[instrument(skip(self), err)]
    async fn delete_all(&self, user_id: UserId) -> Result<(), StoreError> {
        let idx = index_key(user_id);
        let mut conn = self.conn.clone();
        let keys: Vec<String> = self.run("smembers", conn.smembers(&idx)).await?;

        if keys.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic().del(&keys).ignore().del(&idx).ignore();

        let mut conn = self.conn.clone();
        self.run::<(), _>("delete_all", pipe.query_async(&mut conn)).await?;
        tracing::info!(revoked = keys.len(), "sessions revoked");
        Ok(())
    }

    async fn exists(&self, token: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        self.run("exists", conn.exists(record_key(token))).await
    }

    async fn tokens_for(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        let live = self.prune_index(&index_key(user_id)).await?;

        Ok(live
            .iter()
            .filter_map(|key| token_from_record_key(key).map(str::to_string))
            .collect())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
