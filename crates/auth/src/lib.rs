//! `warden-auth`: session and token core.
//!
//! Issues and verifies bearer tokens, models sessions and the role →
//! permission registry, and orchestrates the session lifecycle. Storage,
//! user persistence and password hashing are reached only through the traits
//! in [`store`] and [`directory`]; this crate does no HTTP and no direct I/O.

pub mod accounts;
pub mod authorize;
pub mod claims;
pub mod config;
pub mod directory;
pub mod error;
pub mod permissions;
pub mod principal;
pub mod registry;
pub mod roles;
pub mod service;
pub mod session;
pub mod signer;
pub mod store;

pub use accounts::{AccountService, UpdateUser};
pub use authorize::{authorize, authorize_self_or};
pub use claims::TokenClaims;
pub use config::AuthConfig;
pub use directory::{PasswordHasher, UserDirectory};
pub use error::{AuthError, DirectoryError, HashError, StoreError, TokenError};
pub use permissions::Permission;
pub use principal::{Principal, UserRecord};
pub use registry::{PermissionRegistry, RoleDefinition};
pub use roles::Role;
pub use service::{ActiveSession, AuthService, Registration};
pub use session::{AuthSession, IssuedSession, SessionRecord};
pub use signer::{IssuedToken, TokenSigner};
pub use store::SessionStore;
