//! Configuration for the session subsystem.

use std::time::Duration;

/// Token and session lifetimes plus the signing secret.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// Lifetime of a token and of the session record written with it.
    pub token_ttl: Duration,
    /// How long a user's session index outlives the newest session it holds.
    pub index_grace: Duration,
}

impl AuthConfig {
    pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
    pub const DEFAULT_INDEX_GRACE: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Self::DEFAULT_TOKEN_TTL,
            index_grace: Self::DEFAULT_INDEX_GRACE,
        }
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_index_grace(mut self, grace: Duration) -> Self {
        self.index_grace = grace;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("index_grace", &self.index_grace)
            .finish()
    }
}
