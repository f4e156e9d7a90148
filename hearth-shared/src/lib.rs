//! # Hearth Shared Library
//!
//! Domain types, database access, and pure business logic used by the
//! Hearth API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `auth`: Password hashing and the sign-up passcode
//! - `db`: Connection pool and migrations
//! - `pagination`: Page/limit handling for list endpoints
//! - `analytics`: Registration and event summaries

pub mod analytics;
pub mod auth;
pub mod db;
pub mod models;
pub mod pagination;

/// Current version of the Hearth shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
