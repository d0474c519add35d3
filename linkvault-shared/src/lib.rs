//! # LinkVault Shared Library
//!
//! Authentication core of the LinkVault bookmark backend: user and refresh
//! token models, the credential store boundary, password and token hashing,
//! access token issuance and verification, and the session service that
//! drives registration, login, refresh rotation and logout.
//!
//! ## Module Organization
//!
//! - `auth`: Hashing, token issuance, token verification, Axum middleware
//! - `clock`: Injectable time source
//! - `db`: Connection pool and migrations
//! - `models`: Database models
//! - `session`: Session state machine
//! - `store`: Credential store trait with PostgreSQL and in-memory backends

pub mod auth;
pub mod clock;
pub mod db;
pub mod models;
pub mod session;
pub mod store;

/// Current version of the LinkVault shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
