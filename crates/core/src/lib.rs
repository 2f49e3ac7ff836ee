//! `warden-core`: domain building blocks shared by every warden crate.
//!
//! Pure types only: identifiers, validated value objects and the domain error
//! model. No I/O, no async.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use value_object::{Email, ValueObject};
