//! bcrypt-backed `PasswordHasher`.
//!
//! Hashing is CPU-bound, so both directions run on tokio's blocking pool.

use async_trait::async_trait;

use warden_auth::{HashError, PasswordHasher};

#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// `cost` is clamped into bcrypt's accepted range (4..=31).
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| HashError::Failed(format!("hashing task failed: {e}")))?
            .map_err(|e| HashError::Failed(e.to_string()))
    }

    async fn verify(&self, plaintext: &str, digest: &str) -> Result<(), HashError> {
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();

        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest))
            .await
            .map_err(|e| HashError::Failed(format!("verify task failed: {e}")))?
            .map_err(|e| HashError::Failed(e.to_string()))?;

        if matched { Ok(()) } else { Err(HashError::Mismatch) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> BcryptPasswordHasher {
        BcryptPasswordHasher::new(4)
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = fast();
        let digest = hasher.hash("s3cret-pass").await.unwrap();

        assert_ne!(digest, "s3cret-pass");
        hasher.verify("s3cret-pass", &digest).await.unwrap();
        assert_eq!(
            hasher.verify("other-pass", &digest).await.unwrap_err(),
            HashError::Mismatch
        );
    }

    #[tokio::test]
    async fn same_password_salts_differently() {
        let hasher = fast();
        let a = hasher.hash("repeat-me").await.unwrap();
        let b = hasher.hash("repeat-me").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn garbage_digest_is_a_failure_not_a_mismatch() {
        let err = fast().verify("whatever", "not-a-bcrypt-hash").await.unwrap_err();
        assert!(matches!(err, HashError::Failed(_)));
    }

    #[test]
    fn cost_is_clamped() {
        assert_eq!(BcryptPasswordHasher::new(0).cost(), 4);
        assert_eq!(BcryptPasswordHasher::new(99).cost(), 31);
        assert_eq!(BcryptPasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}
