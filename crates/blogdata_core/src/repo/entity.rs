//! Entity metadata and the declarative finder table.
//!
//! # Responsibility
//! - Describe how an entity maps to its table: identity, version and data
//!   columns.
//! - Turn "field compares to value" declarations into SQL fragments.
//!
//! # Invariants
//! - Column and table names come from `'static` metadata, never from
//!   caller input.
//! - A finder binds exactly one value, except `IsNull`, which binds none.
//! - `Like` patterns use `\` to escape `%` and `_`.

use crate::error::DataResult;
use crate::sql::binding::Params;
use crate::sql::row::RowMapper;
use rusqlite::types::Value;

/// Table metadata plus value accessors for a persisted entity.
pub trait Entity: RowMapper {
    const TABLE: &'static str;
    /// Primary-key column.
    const ID_COLUMN: &'static str;
    /// Optimistic-lock counter column.
    const VERSION_COLUMN: &'static str;
    /// Remaining columns, in the order `data_values` returns them.
    const DATA_COLUMNS: &'static [&'static str];

    fn id_value(&self) -> Value;
    fn version(&self) -> Option<i64>;
    /// Returns this entity with `version` replaced.
    fn with_version(self, version: i64) -> Self;
    fn data_values(&self) -> Vec<Value>;

    /// Checks field invariants before any write.
    fn validate(&self) -> DataResult<()> {
        Ok(())
    }
}

/// Comparison operator of a derived finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    NotEquals,
    Like,
    GreaterThan,
    LessThan,
    IsNull,
}

impl Comparison {
    /// SQL fragment placed after the column name.
    pub fn fragment(self) -> &'static str {
        match self {
            Self::Equals => "= ?",
            Self::NotEquals => "<> ?",
            Self::Like => "LIKE ? ESCAPE '\\'",
            Self::GreaterThan => "> ?",
            Self::LessThan => "< ?",
            Self::IsNull => "IS NULL",
        }
    }

    /// Whether the fragment carries a placeholder.
    pub fn binds_value(self) -> bool {
        !matches!(self, Self::IsNull)
    }
}

/// One declarative finder: `column <comparison> value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedQuery {
    pub column: &'static str,
    pub comparison: Comparison,
}

impl DerivedQuery {
    pub const fn new(column: &'static str, comparison: Comparison) -> Self {
        Self { column, comparison }
    }

    pub const fn equals(column: &'static str) -> Self {
        Self::new(column, Comparison::Equals)
    }

    /// `WHERE` condition with at most one positional placeholder.
    pub fn condition(&self) -> String {
        format!("{} {}", self.column, self.comparison.fragment())
    }

    /// Parameters for `condition`; `value` is dropped when nothing binds it.
    pub fn params(&self, value: Value) -> Params {
        if self.comparison.binds_value() {
            Params::Positional(vec![value])
        } else {
            Params::None
        }
    }
}
