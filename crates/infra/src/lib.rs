//! Infrastructure layer: session stores, user directories, password hashing.

pub mod config;
pub mod hashing;
pub mod session_store;
pub mod users;


pub use config::StoreConfig;
pub use hashing::BcryptPasswordHasher;
pub use session_store::InMemorySessionStore;
#[cfg(feature = "redis")]
pub use session_store::RedisSessionStore;
pub use users::{InMemoryUserDirectory, PostgresUserDirectory};
