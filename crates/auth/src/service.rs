//! Session lifecycle orchestration.
//!
//! `AuthService` is the one seam handlers depend on: it ties the token signer,
//! the session store and the permission registry together, and delegates
//! credential checks to the user directory and password hasher.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use warden_core::{Email, UserId};

use crate::accounts::validate_password;
use crate::{
    AuthError, AuthSession, HashError, IssuedSession, PasswordHasher, PermissionRegistry, Principal,
    Role, SessionRecord, SessionStore, TokenClaims, TokenSigner, UserDirectory, UserRecord,
};

/// Input for [`AuthService::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Defaults to `user` when absent.
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    signer: Arc<TokenSigner>,
    registry: Arc<PermissionRegistry>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    pub fn new(
        signer: Arc<TokenSigner>,
        registry: Arc<PermissionRegistry>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            signer,
            registry,
            sessions,
            users,
            hasher,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Reject anything outside the closed role set before it reaches a session.
    pub fn validate_role(&self, raw: &str) -> Result<Role, AuthError> {
        raw.parse()
    }

    /// Check credentials against the directory.
    ///
    /// Unknown e-mail and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password), err)]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        match self.hasher.verify(password, &user.password_hash).await {
            Ok(()) => Ok(Principal::from(user)),
            Err(HashError::Mismatch) => Err(AuthError::InvalidCredentials),
            Err(HashError::Failed(msg)) => Err(AuthError::Hashing(msg)),
        }
    }

    /// Sign a token and store its session with a permission snapshot taken now.
    #[instrument(skip(self, principal), fields(user_id = %principal.id), err)]
    pub async fn issue_session(&self, principal: &Principal) -> Result<IssuedSession, AuthError> {
        let issued = self
            .signer
            .issue(principal.id, principal.email.as_str(), principal.role)?;

        let record = SessionRecord {
            user_id: principal.id,
            email: principal.email.to_string(),
            role: principal.role,
            permissions: self.registry.permissions_for(principal.role).to_vec(),
        };

        self.sessions
            .put(&issued.token, &record, self.signer.ttl())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to store session"))?;

        Ok(IssuedSession {
            token: issued.token,
            claims: issued.claims,
            record,
        })
    }

    /// Resolve a bearer token to its live session.
    ///
    /// Signature and expiry are checked first, without I/O; only then is the
    /// store consulted. Callers collapse failures with
    /// [`AuthError::is_unauthorized`].
    pub async fn validate(&self, token: &str) -> Result<SessionRecord, AuthError> {
        self.resolve(token).await.map(|(_, record)| record)
    }

    /// Like [`validate`](Self::validate), also returning the verified claims.
    pub async fn resolve(&self, token: &str) -> Result<(TokenClaims, SessionRecord), AuthError> {
        let claims = self.signer.verify(token)?;

        let record = self
            .sessions
            .get(token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if record.user_id != claims.sub {
            tracing::warn!(user_id = %claims.sub, "session record owner does not match token subject");
            return Err(AuthError::SessionNotFound);
        }

        Ok((claims, record))
    }

    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    pub async fn revoke_all(&self, user_id: UserId) -> Result<(), AuthError> {
        self.sessions.delete_all(user_id).await?;
        Ok(())
    }

    #[instrument(skip(self, input), fields(email = %input.email), err)]
    pub async fn register(&self, input: Registration) -> Result<AuthSession, AuthError> {
        let role = match input.role.as_deref() {
            Some(raw) if !raw.is_empty() => self.validate_role(raw)?,
            _ => Role::default(),
        };
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;

        if self.users.exists_by_email(&email).await? {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let password_hash = self
            .hasher
            .hash(&input.password)
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let now = Utc::now();
        let user = UserRecord {
            id: UserId::new(),
            email,
            name: input.name.trim().to_string(),
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await?;

        let principal = Principal::from(user);
        let session = self.issue_session(&principal).await?;
        tracing::info!(user_id = %principal.id, role = %principal.role, "user registered");

        Ok(AuthSession { session, principal })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let principal = self.authenticate(email, password).await?;
        let session = self.issue_session(&principal).await?;
        tracing::info!(user_id = %principal.id, "login succeeded");

        Ok(AuthSession { session, principal })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.revoke(token).await
    }

    #[instrument(skip(self), err)]
    pub async fn logout_all(&self, user_id: UserId) -> Result<(), AuthError> {
        self.revoke_all(user_id).await?;
        tracing::info!(%user_id, "all sessions revoked");
        Ok(())
    }

    /// Swap the current session for a new one.
    ///
    /// The account is re-read so the new session reflects the current role.
    /// The new session is stored before the old one is revoked; if the
    /// revocation fails the new session is withdrawn and the error returned.
    #[instrument(skip(self, current_token, current), fields(user_id = %current.user_id), err)]
    pub async fn refresh(
        &self,
        current_token: &str,
        current: &SessionRecord,
    ) -> Result<IssuedSession, AuthError> {
        let user = self
            .users
            .find_by_id(current.user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let fresh = self.issue_session(&Principal::from(user)).await?;

        if let Err(e) = self.sessions.delete(current_token).await {
            tracing::error!(error = %e, "failed to revoke refreshed session; withdrawing replacement");
            if let Err(rollback) = self.sessions.delete(&fresh.token).await {
                tracing::error!(error = %rollback, "failed to withdraw replacement session");
            }
            return Err(e.into());
        }

        Ok(fresh)
    }

    /// Live tokens for a user, for the active-sessions listing.
    pub async fn active_sessions(&self, user_id: UserId) -> Result<Vec<ActiveSession>, AuthError> {
        let tokens = self.sessions.tokens_for(user_id).await?;

        Ok(tokens
            .iter()
            .filter_map(|token| {
                // Tokens that no longer verify are about to lapse from the store too.
                self.signer.verify(token).ok().map(|claims| ActiveSession {
                    session_id: claims.jti.to_string(),
                    issued_at: claims.issued_at(),
                    expires_at: claims.expires_at(),
                })
            })
            .collect())
    }
}

/// Non-secret description of a live session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ActiveSession {
    pub session_id: String,
    pub issued_at: chrono::DateTime<Utc>,
    pub expires_at: chrono::DateTime<Utc>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
