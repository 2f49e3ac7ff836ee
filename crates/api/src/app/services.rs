//! Service wiring: picks the session store, user directory and hasher and
//! assembles the auth and account services on top of them.

use std::sync::Arc;

use anyhow::Context;

use warden_auth::{
    AccountService, AuthService, PasswordHasher, PermissionRegistry, SessionStore, TokenSigner,
    UserDirectory,
};
use warden_infra::{
    BcryptPasswordHasher, InMemorySessionStore, InMemoryUserDirectory, PostgresUserDirectory,
    RedisSessionStore,
};

use crate::config::{AppConfig, PersistentStores};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppServices {
    pub auth: AuthService,
    pub accounts: AccountService,
    pub registry: Arc<PermissionRegistry>,
}

impl AppServices {
    fn assemble(
        config: &AppConfig,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let registry = Arc::new(PermissionRegistry::standard());
        let signer = Arc::new(TokenSigner::new(&config.auth.jwt_secret, config.auth.token_ttl));
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost));

        let auth = AuthService::new(
            signer,
            registry.clone(),
            sessions.clone(),
            users.clone(),
            hasher.clone(),
        );
        let accounts = AccountService::new(users, hasher, sessions);

        Self {
            auth,
            accounts,
            registry,
        }
    }

    /// Everything in process memory; state is lost on restart.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::assemble(
            config,
            Arc::new(InMemorySessionStore::new(config.store())),
            Arc::new(InMemoryUserDirectory::new()),
        )
    }

    /// Redis sessions and Postgres users.
    pub async fn persistent(config: &AppConfig, stores: &PersistentStores) -> anyhow::Result<Self> {
        let sessions = RedisSessionStore::connect(&stores.redis_url, config.store())
            .await
            .context("failed to connect to redis")?;

        let users = PostgresUserDirectory::connect(&stores.database_url)
            .await
            .context("failed to connect to postgres")?;
        users
            .ensure_schema()
            .await
            .context("failed to prepare users table")?;

        tracing::info!("using persistent session store and user directory");
        Ok(Self::assemble(config, Arc::new(sessions), Arc::new(users)))
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.persistent {
        Some(stores) => AppServices::persistent(config, stores).await,
        None => {
            tracing::info!("using in-memory session store and user directory");
            Ok(AppServices::in_memory(config))
        }
    }
}
