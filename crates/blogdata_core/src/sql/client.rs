//! Fluent statement builder.
//!
//! # Responsibility
//! - Collect statement text and parameters through a chained API.
//! - Execute reads with list/optional cardinality and writes with an
//!   affected-row count.
//!
//! # Invariants
//! - One statement invocation uses either positional or named parameters,
//!   never both.
//! - All binding checks run before the connection provider is touched.
//! - Zero affected rows is a normal result; callers decide what it means.
//!
//! ```no_run
//! use blogdata_core::db::SharedConnection;
//! use blogdata_core::{Post, SqlClient};
//!
//! let client = SqlClient::new(SharedConnection::open_in_memory()?);
//! let post: Option<Post> = client
//!     .sql("SELECT * FROM post WHERE id = :id")
//!     .param("id", "1234".to_string())
//!     .query()
//!     .optional()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::db::ConnectionProvider;
use crate::error::{BindingError, DataResult};
use crate::sql::binding::{bind, BoundStatement, Params};
use crate::sql::exec;
use crate::sql::row::{ResultRow, RowMapper};
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Entry point for ad hoc statements over a connection provider.
pub struct SqlClient<P> {
    provider: P,
}

impl<P: ConnectionProvider> SqlClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Starts a statement.
    pub fn sql(&self, sql: impl Into<String>) -> StatementSpec<'_, P> {
        StatementSpec {
            client: self,
            sql: sql.into(),
            positional: Vec::new(),
            named: BTreeMap::new(),
            error: None,
        }
    }

    /// Runs a read and maps every row.
    pub fn query<E: RowMapper>(&self, sql: &str, params: Params) -> DataResult<Vec<E>> {
        let statement = bind(sql, params)?;
        let rows = exec::query_rows(&self.provider, &statement)?;
        exec::map_all(&rows)
    }

    /// Runs a read expected to match at most one row.
    pub fn query_one<E: RowMapper>(&self, sql: &str, params: Params) -> DataResult<Option<E>> {
        let statement = bind(sql, params)?;
        let rows = exec::query_rows(&self.provider, &statement)?;
        exec::map_optional(&rows)
    }

    /// Runs an insert, update or delete and returns the affected row count.
    pub fn execute(&self, sql: &str, params: Params) -> DataResult<usize> {
        let statement = bind(sql, params)?;
        exec::execute(&self.provider, &statement)
    }
}

/// A statement being assembled.
#[must_use = "a statement does nothing until a terminal method runs it"]
pub struct StatementSpec<'c, P> {
    client: &'c SqlClient<P>,
    sql: String,
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
    error: Option<BindingError>,
}

impl<'c, P: ConnectionProvider> StatementSpec<'c, P> {
    /// Appends one positional value.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends positional values in order.
    pub fn params<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.positional.extend(values.into_iter().map(Into::into));
        self
    }

    /// Sets one named value.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if self.named.contains_key(&name) {
            self.error.get_or_insert(BindingError::DuplicateNamed(name));
        } else {
            self.named.insert(name, value.into());
        }
        self
    }

    /// Sets several named values.
    pub fn param_map<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        pairs
            .into_iter()
            .fold(self, |spec, (name, value)| spec.param(name, value))
    }

    /// Checks parameters against placeholders without executing.
    pub fn prepare(self) -> Result<BoundStatement, BindingError> {
        let (_, statement) = self.into_bound()?;
        Ok(statement)
    }

    /// Switches to entity-mapped reads.
    pub fn query<E: RowMapper>(self) -> MappedQuery<'c, P, E> {
        MappedQuery {
            spec: self,
            _entity: PhantomData,
        }
    }

    /// Runs the read and returns unmapped rows.
    pub fn query_rows(self) -> DataResult<Vec<ResultRow>> {
        let (client, statement) = self.into_bound()?;
        exec::query_rows(&client.provider, &statement)
    }

    /// Runs the statement as a mutation and returns the affected row count.
    pub fn update(self) -> DataResult<usize> {
        let (client, statement) = self.into_bound()?;
        exec::execute(&client.provider, &statement)
    }

    fn into_bound(self) -> Result<(&'c SqlClient<P>, BoundStatement), BindingError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let params = match (self.positional.is_empty(), self.named.is_empty()) {
            (true, true) => Params::None,
            (false, true) => Params::Positional(self.positional),
            (true, false) => Params::Named(self.named),
            (false, false) => return Err(BindingError::MixedParameters),
        };
        let statement = bind(&self.sql, params)?;
        Ok((self.client, statement))
    }
}

/// A read whose rows map to `E`.
#[must_use = "a query does nothing until a terminal method runs it"]
pub struct MappedQuery<'c, P, E> {
    spec: StatementSpec<'c, P>,
    _entity: PhantomData<fn() -> E>,
}

impl<P: ConnectionProvider, E: RowMapper> MappedQuery<'_, P, E> {
    /// All rows in storage order.
    pub fn list(self) -> DataResult<Vec<E>> {
        let rows = self.spec.query_rows()?;
        exec::map_all(&rows)
    }

    /// Zero or one row; more is a cardinality failure.
    pub fn optional(self) -> DataResult<Option<E>> {
        let rows = self.spec.query_rows()?;
        exec::map_optional(&rows)
    }

    /// Exactly one row.
    pub fn single(self) -> DataResult<E> {
        let rows = self.spec.query_rows()?;
        exec::map_single(&rows)
    }
}
