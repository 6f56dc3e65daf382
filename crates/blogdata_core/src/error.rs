//! Typed failures for statement binding, row mapping and repository writes.
//!
//! # Invariants
//! - Every failure reaches the caller as a distinct variant; nothing is
//!   retried or swallowed inside core.
//! - `Binding` failures are raised before a connection is acquired.

use crate::db::DbError;
use crate::model::post::PostValidationError;
use thiserror::Error;

pub type DataResult<T> = Result<T, DataError>;

/// Caller-fixable mismatch between statement placeholders and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("statement mixes positional `?` and named `:name` placeholders")]
    MixedPlaceholders,
    #[error("positional and named parameters cannot be supplied to one statement")]
    MixedParameters,
    #[error("statement uses {statement} placeholders but {supplied} parameters were supplied")]
    ModeMismatch {
        statement: &'static str,
        supplied: &'static str,
    },
    #[error("statement has {expected} positional placeholders but {actual} values were supplied")]
    PositionalCount { expected: usize, actual: usize },
    #[error("no value supplied for named parameter `{0}`")]
    MissingNamed(String),
    #[error("named parameter `{0}` does not occur in the statement")]
    UnusedNamed(String),
    #[error("named parameter `{0}` supplied more than once")]
    DuplicateNamed(String),
    #[error("numbered placeholder `{0}` is not supported; use `?` or `:name`")]
    NumberedPlaceholder(String),
    #[error("prefixed placeholder `{0}` is not supported; use `?` or `:name`")]
    PrefixedPlaceholder(String),
}

/// A result row that cannot be converted into an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("required column `{0}` is missing from the result row")]
    MissingColumn(&'static str),
    #[error("column `{0}` is NULL but the field is required")]
    UnexpectedNull(&'static str),
    #[error("column `{column}` holds {found}, expected {expected}")]
    WrongType {
        column: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("column `{column}` value `{value}` cannot be converted to {expected}")]
    Unconvertible {
        column: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("row maps to an invalid entity: {0}")]
    Invalid(String),
}

/// Error surface shared by the template, fluent client and repository.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("expected at most one row, statement returned {actual}")]
    Cardinality { actual: usize },
    #[error("expected exactly one row, statement returned none")]
    NoRows,
    #[error("optimistic lock conflict on {table} `{id}`: version {expected_version} is not current")]
    ConcurrencyConflict {
        table: &'static str,
        id: String,
        expected_version: i64,
    },
    #[error("{table} `{id}` already exists")]
    DuplicateKey { table: &'static str, id: String },
    /// A guarded write was asked for on an entity that carries no version.
    #[error("{table} `{id}` has no version to guard the write with")]
    MissingVersion { table: &'static str, id: String },
    #[error("{table} `{id}` version {version} cannot be incremented")]
    VersionOverflow {
        table: &'static str,
        id: String,
        version: i64,
    },
    #[error(transparent)]
    Validation(#[from] PostValidationError),
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl DataError {
    /// Whether re-running the caller's whole read-modify-write cycle can
    /// succeed without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

impl From<rusqlite::Error> for DataError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}
