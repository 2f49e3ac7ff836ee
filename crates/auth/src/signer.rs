//! HS256 token issuance and verification.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use warden_core::UserId;

use crate::{Role, TokenClaims, TokenError};

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Creates and verifies self-contained bearer tokens.
///
/// Verification is purely local: signature, algorithm and expiry. Whether the
/// session behind a token is still live is the session store's question.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Lifetime given to every token (and to the session written alongside it).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: UserId, email: &str, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, email, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user_id: UserId,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let ttl_secs = i64::try_from(self.ttl.as_secs())
            .map_err(|_| TokenError::Signing("token ttl out of range".to_string()))?;

        let claims = TokenClaims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat,
            exp: iat.saturating_add(ttl_secs.max(1)),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token verification failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            }
        })?;

        if !data.claims.has_valid_window() {
            return Err(TokenError::Malformed);
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn verify_returns_the_issued_claims() {
        let signer = signer();
        let id = UserId::new();

        let issued = signer.issue(id, "a@x.com", Role::Admin).unwrap();
        let claims = signer.verify(&issued.token).unwrap();

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn tokens_for_the_same_principal_are_distinct() {
        let signer = signer();
        let id = UserId::new();
        let now = Utc::now();

        let a = signer.issue_at(id, "a@x.com", Role::User, now).unwrap();
        let b = signer.issue_at(id, "a@x.com", Role::User, now).unwrap();

        assert_ne!(a.token, b.token);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let signer = signer();
        let issued = signer
            .issue_at(UserId::new(), "a@x.com", Role::User, Utc::now() - ChronoDuration::hours(2))
            .unwrap();

        assert_eq!(signer.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_another_secret_has_invalid_signature() {
        let other = TokenSigner::new("another-secret", Duration::from_secs(3600));
        let issued = other.issue(UserId::new(), "a@x.com", Role::User).unwrap();

        assert_eq!(signer().verify(&issued.token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn tampered_payload_has_invalid_signature() {
        let signer = signer();
        let issued = signer.issue(UserId::new(), "a@x.com", Role::User).unwrap();
        let forged_claims = TokenClaims {
            role: Role::Admin,
            ..issued.claims.clone()
        };
        let forged_payload = encode(
            &Header::new(Algorithm::HS256),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();

        // Graft the forged payload onto the genuine signature.
        let genuine_sig = issued.token.rsplit('.').next().unwrap();
        let mut parts: Vec<&str> = forged_payload.split('.').collect();
        parts[2] = genuine_sig;
        let spliced = parts.join(".");

        assert_eq!(signer.verify(&spliced), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn garbage_is_malformed() {
        let signer = signer();
        for raw in ["", "abc", "a.b.c", "not-a-jwt-at-all"] {
            assert_eq!(signer.verify(raw), Err(TokenError::Malformed), "{raw:?}");
        }
    }

    #[test]
    fn debug_output_does_not_expose_key_material() {
        let rendered = format!("{:?}", signer());
        assert!(!rendered.contains("test-secret"));
    }
}
