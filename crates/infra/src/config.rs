//! Adapter tuning shared by the session store implementations.

use std::time::Duration;

use warden_auth::AuthConfig;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Extra lifetime given to a user's index beyond the longest session in it.
    pub index_grace: Duration,
    /// Upper bound on a single backend round-trip.
    pub call_timeout: Duration,
}

impl StoreConfig {
    pub fn new(index_grace: Duration, call_timeout: Duration) -> Self {
        Self {
            index_grace,
            call_timeout,
        }
    }

    pub fn from_auth(auth: &AuthConfig, call_timeout: Duration) -> Self {
        Self::new(auth.index_grace, call_timeout)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(AuthConfig::DEFAULT_INDEX_GRACE, DEFAULT_CALL_TIMEOUT)
    }
}
