//! SQLite storage backend for the vigil credential and risk engine
//!
//! Implements every repository trait from `vigil-core` over a `sqlx`
//! SQLite pool, and ships the schema as versioned migrations.

pub mod migrations;
pub mod repositories;

pub use repositories::{
    SqliteAttemptLog, SqliteBlockList, SqliteCredentialStore, SqliteRefreshTokenStore,
    SqliteRepositoryProvider, SqliteRiskEventLog,
};
