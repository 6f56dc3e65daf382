//! Connection providers: the "acquire, execute, release" boundary.
//!
//! # Responsibility
//! - Lend one SQLite connection to exactly one unit of statement work.
//! - Release the connection on every exit path, including errors and panics.
//!
//! # Invariants
//! - Providers never hand a connection to more than one caller at a time.
//! - Work closures cannot retain the borrowed connection past their return.

use super::open::{open_db, open_db_in_memory, BUSY_TIMEOUT};
use super::{DbError, DbResult};
use crate::error::DataResult;
use log::trace;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Source of connection-scoped access for statement execution.
pub trait ConnectionProvider {
    /// Acquires a connection, runs `work` on it and releases it.
    fn with_connection<T, F>(&self, work: F) -> DataResult<T>
    where
        F: FnOnce(&Connection) -> DataResult<T>;
}

impl<P: ConnectionProvider> ConnectionProvider for &P {
    fn with_connection<T, F>(&self, work: F) -> DataResult<T>
    where
        F: FnOnce(&Connection) -> DataResult<T>,
    {
        (**self).with_connection(work)
    }
}

impl<P: ConnectionProvider> ConnectionProvider for Arc<P> {
    fn with_connection<T, F>(&self, work: F) -> DataResult<T>
    where
        F: FnOnce(&Connection) -> DataResult<T>,
    {
        (**self).with_connection(work)
    }
}

/// One long-lived connection guarded by a mutex.
///
/// The natural choice for in-memory databases, which vanish when their only
/// connection closes.
pub struct SharedConnection {
    conn: Mutex<Connection>,
}

impl SharedConnection {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens a fresh migrated in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Returns the wrapped connection.
    pub fn into_inner(self) -> DbResult<Connection> {
        self.conn.into_inner().map_err(|_| DbError::ConnectionPoisoned)
    }
}

impl ConnectionProvider for SharedConnection {
    fn with_connection<T, F>(&self, work: F) -> DataResult<T>
    where
        F: FnOnce(&Connection) -> DataResult<T>,
    {
        let guard = self.conn.lock().map_err(|_| DbError::ConnectionPoisoned)?;
        trace!("event=db_acquire module=db status=ok mode=shared");
        work(&guard)
    }
}

/// Opens a new connection to a database file for every unit of work.
///
/// Connections are independent, so concurrent threads contend only on
/// SQLite's own locking.
#[derive(Debug, Clone)]
pub struct PathConnectionProvider {
    path: PathBuf,
}

impl PathConnectionProvider {
    /// Provisions the schema at `path` and returns a provider for it.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        drop(open_db(&path)?);
        Ok(Self { path })
    }

    /// Database file this provider connects to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionProvider for PathConnectionProvider {
    fn with_connection<T, F>(&self, work: F) -> DataResult<T>
    where
        F: FnOnce(&Connection) -> DataResult<T>,
    {
        let conn = Connection::open(&self.path).map_err(DbError::from)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(DbError::from)?;
        trace!("event=db_acquire module=db status=ok mode=file");
        work(&conn)
    }
}
