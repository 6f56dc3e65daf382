//! Query template: positional statements with caller-supplied row callbacks.
//!
//! # Responsibility
//! - Hide connection acquisition and release from callers.
//! - Leave row interpretation to a per-call closure.
//!
//! # Invariants
//! - Only positional `?` parameters are accepted.
//! - Binding failures are reported before a connection is acquired.

use crate::db::ConnectionProvider;
use crate::error::{DataError, DataResult, MappingError};
use crate::sql::binding::{bind, Params};
use crate::sql::exec;
use crate::sql::row::ResultRow;
use rusqlite::types::Value;

/// Statement helper over a connection provider.
pub struct QueryTemplate<P> {
    provider: P,
}

impl<P: ConnectionProvider> QueryTemplate<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs a read statement and maps every row with `mapper`.
    pub fn query<T, F>(&self, sql: &str, args: &[Value], mut mapper: F) -> DataResult<Vec<T>>
    where
        F: FnMut(&ResultRow) -> Result<T, MappingError>,
    {
        let statement = bind(sql, Params::Positional(args.to_vec()))?;
        let rows = exec::query_rows(&self.provider, &statement)?;
        rows.iter()
            .map(|row| mapper(row).map_err(DataError::from))
            .collect()
    }

    /// Runs a read statement expected to match at most one row.
    pub fn query_for_optional<T, F>(
        &self,
        sql: &str,
        args: &[Value],
        mut mapper: F,
    ) -> DataResult<Option<T>>
    where
        F: FnMut(&ResultRow) -> Result<T, MappingError>,
    {
        let statement = bind(sql, Params::Positional(args.to_vec()))?;
        let rows = exec::query_rows(&self.provider, &statement)?;
        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(mapper(row)?)),
            many => Err(DataError::Cardinality { actual: many.len() }),
        }
    }

    /// Runs an insert, update or delete and returns the affected row count.
    pub fn update(&self, sql: &str, args: &[Value]) -> DataResult<usize> {
        let statement = bind(sql, Params::Positional(args.to_vec()))?;
        exec::execute(&self.provider, &statement)
    }
}
