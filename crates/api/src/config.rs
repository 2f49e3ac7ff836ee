//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use warden_auth::AuthConfig;
use warden_infra::{BcryptPasswordHasher, StoreConfig};

const DEV_SECRET: &str = "dev-secret";

/// Connection strings for the durable backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentStores {
    pub redis_url: String,
    pub database_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_addr: SocketAddr,
    pub auth: AuthConfig,
    pub store_timeout: Duration,
    pub bcrypt_cost: u32,
    /// `None` runs everything in memory.
    pub persistent: Option<PersistentStores>,
}

impl AppConfig {
    /// In-memory configuration with defaults, for tests and local runs.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            auth: AuthConfig::new(jwt_secret),
            store_timeout: warden_infra::config::DEFAULT_CALL_TIMEOUT,
            bcrypt_cost: BcryptPasswordHasher::DEFAULT_COST,
            persistent: None,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and empty values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });

        let server_addr: SocketAddr = parse_or(&get, "SERVER_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let token_ttl: u64 = parse_or(&get, "TOKEN_EXPIRES_IN", AuthConfig::DEFAULT_TOKEN_TTL.as_secs())?;
        let index_grace: u64 = parse_or(
            &get,
            "SESSION_INDEX_GRACE_SECS",
            AuthConfig::DEFAULT_INDEX_GRACE.as_secs(),
        )?;
        let store_timeout_ms: u64 = parse_or(&get, "STORE_TIMEOUT_MS", 5_000)?;
        let bcrypt_cost: u32 = parse_or(&get, "BCRYPT_COST", BcryptPasswordHasher::DEFAULT_COST)?;
        let use_persistent: bool = parse_or(&get, "USE_PERSISTENT_STORES", false)?;

        if token_ttl == 0 {
            bail!("TOKEN_EXPIRES_IN must be positive");
        }
        if store_timeout_ms == 0 {
            bail!("STORE_TIMEOUT_MS must be positive");
        }

        let persistent = if use_persistent {
            Some(PersistentStores {
                redis_url: get("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
                database_url: get("DATABASE_URL")
                    .context("DATABASE_URL is required when USE_PERSISTENT_STORES=true")?,
            })
        } else {
            None
        };

        Ok(Self {
            server_addr,
            auth: AuthConfig::new(jwt_secret)
                .with_token_ttl(Duration::from_secs(token_ttl))
                .with_index_grace(Duration::from_secs(index_grace)),
            store_timeout: Duration::from_millis(store_timeout_ms),
            bcrypt_cost,
            persistent,
        })
    }

    pub fn store(&self) -> StoreConfig {
        StoreConfig::from_auth(&self.auth, self.store_timeout)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
    }
}
