//! Common test utilities for warden-auth integration tests

pub mod mocks;

#[allow(unused_imports)]
pub use mocks::{MockSessionStore, MockUserDirectory, PlainHasher, service_with};
