//! SQLite storage bootstrap, schema provisioning and connection providers.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the post store.
//! - Apply schema migrations in deterministic order.
//! - Hand out connection-scoped access to the statement layer.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - A connection borrowed through a provider never outlives the call that
//!   borrowed it.

use thiserror::Error;

pub mod migrations;
mod open;
pub mod provider;

pub use open::{open_db, open_db_in_memory, BUSY_TIMEOUT};
pub use provider::{ConnectionProvider, PathConnectionProvider, SharedConnection};

pub type DbResult<T> = Result<T, DbError>;

/// Failure surfaced by SQLite or by the connection layer around it.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A previous holder of a shared connection panicked mid-statement.
    #[error("shared connection lock is poisoned")]
    ConnectionPoisoned,
}
