//! Statement execution on a borrowed connection.
//!
//! # Responsibility
//! - Run one bound statement and detach its rows from SQLite.
//! - Apply result cardinality rules shared by every access strategy.
//!
//! # Invariants
//! - Exactly one statement runs per call.
//! - Rows are copied out before the connection is released, so mapping can
//!   happen after the provider scope ends.

use crate::db::ConnectionProvider;
use crate::error::{DataError, DataResult};
use crate::sql::binding::BoundStatement;
use crate::sql::row::{ResultRow, RowMapper};
use log::{debug, error};
use rusqlite::{params_from_iter, Connection};
use std::time::Instant;

/// Runs a read statement through `provider` and returns its detached rows.
pub fn query_rows<P>(provider: &P, statement: &BoundStatement) -> DataResult<Vec<ResultRow>>
where
    P: ConnectionProvider,
{
    provider.with_connection(|conn| fetch_rows(conn, statement))
}

/// Runs a mutating statement through `provider` and returns the affected
/// row count.
pub fn execute<P>(provider: &P, statement: &BoundStatement) -> DataResult<usize>
where
    P: ConnectionProvider,
{
    provider.with_connection(|conn| execute_on(conn, statement))
}

/// Runs a read statement on `conn`.
pub fn fetch_rows(conn: &Connection, statement: &BoundStatement) -> DataResult<Vec<ResultRow>> {
    let started_at = Instant::now();
    match read_all(conn, statement) {
        Ok(rows) => {
            debug!(
                "event=sql_query module=sql status=ok params={} rows={} duration_ms={}",
                statement.values().len(),
                rows.len(),
                started_at.elapsed().as_millis()
            );
            Ok(rows)
        }
        Err(err) => {
            error!(
                "event=sql_query module=sql status=error params={} duration_ms={} error={err}",
                statement.values().len(),
                started_at.elapsed().as_millis()
            );
            Err(err.into())
        }
    }
}

fn read_all(conn: &Connection, statement: &BoundStatement) -> rusqlite::Result<Vec<ResultRow>> {
    let mut stmt = conn.prepare(statement.sql())?;
    let names = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    let mut rows = stmt.query(params_from_iter(statement.values()))?;
    let mut detached = Vec::new();
    while let Some(row) = rows.next()? {
        detached.push(ResultRow::from_sqlite(row, &names)?);
    }
    Ok(detached)
}

/// Runs a mutating statement on `conn`.
pub fn execute_on(conn: &Connection, statement: &BoundStatement) -> DataResult<usize> {
    let started_at = Instant::now();
    match conn.execute(statement.sql(), params_from_iter(statement.values())) {
        Ok(changed) => {
            debug!(
                "event=sql_execute module=sql status=ok params={} affected={changed} duration_ms={}",
                statement.values().len(),
                started_at.elapsed().as_millis()
            );
            Ok(changed)
        }
        Err(err) => {
            error!(
                "event=sql_execute module=sql status=error params={} duration_ms={} error={err}",
                statement.values().len(),
                started_at.elapsed().as_millis()
            );
            Err(err.into())
        }
    }
}

/// Maps every row, preserving storage order.
pub fn map_all<E: RowMapper>(rows: &[ResultRow]) -> DataResult<Vec<E>> {
    rows.iter()
        .map(|row| E::map_row(row).map_err(DataError::from))
        .collect()
}

/// Maps at most one row; more than one is a cardinality failure.
pub fn map_optional<E: RowMapper>(rows: &[ResultRow]) -> DataResult<Option<E>> {
    match rows {
        [] => Ok(None),
        [row] => Ok(Some(E::map_row(row)?)),
        many => Err(DataError::Cardinality { actual: many.len() }),
    }
}

/// Maps exactly one row; none is `NoRows`, more is a cardinality failure.
pub fn map_single<E: RowMapper>(rows: &[ResultRow]) -> DataResult<E> {
    map_optional(rows)?.ok_or(DataError::NoRows)
}
