use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::UserId;

use crate::Role;

/// Claims carried by an issued bearer token.
///
/// Timestamps are whole seconds since the Unix epoch, as JWT requires.
/// `jti` makes every token unique, even two minted for the same principal in
/// the same second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / principal identifier.
    pub sub: UserId,

    pub email: String,

    pub role: Role,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Unique token identifier.
    pub jti: Uuid,
}

impl TokenClaims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }

    /// Seconds of validity left at `now` (zero once expired).
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(self.exp - now.timestamp()).unwrap_or(0)
    }

    /// A token whose window is empty or inverted was not produced by a signer.
    pub(crate) fn has_valid_window(&self) -> bool {
        self.exp > self.iat
    }
}
