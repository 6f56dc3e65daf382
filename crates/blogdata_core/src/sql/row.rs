//! Detached result rows and row-to-entity mapping.
//!
//! # Responsibility
//! - Copy one SQLite result row into an owned `ResultRow`.
//! - Convert a `ResultRow` into an entity through `RowMapper`.
//!
//! # Invariants
//! - Mapping is pure: it never touches a connection.
//! - NULL in a required column is an error, never a default.
//! - Column lookup ignores ASCII case.

use crate::error::MappingError;
use crate::model::post::Post;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::Row;

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One result row as an ordered list of column name and raw value pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultRow {
    columns: Vec<(String, Value)>,
}

/// Converts one result row into a value.
pub trait RowMapper: Sized {
    fn map_row(row: &ResultRow) -> Result<Self, MappingError>;
}

impl ResultRow {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub(crate) fn from_sqlite(row: &Row<'_>, names: &[String]) -> rusqlite::Result<Self> {
        let mut columns = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            let value = Value::from(row.get_ref(index)?);
            columns.push((name.clone(), value));
        }
        Ok(Self { columns })
    }

    /// Raw value of `column`, or `None` when the row has no such column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Required text column.
    pub fn text(&self, column: &'static str) -> Result<String, MappingError> {
        self.require(column)?;
        self.opt_text(column)?
            .ok_or(MappingError::UnexpectedNull(column))
    }

    /// Nullable text column. An absent column reads as NULL.
    pub fn opt_text(&self, column: &'static str) -> Result<Option<String>, MappingError> {
        match self.nullable(column) {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text.clone())),
            Some(other) => Err(wrong_type(column, "TEXT", other)),
        }
    }

    /// Required integer column. Text holding a base-10 integer is coerced.
    pub fn int(&self, column: &'static str) -> Result<i64, MappingError> {
        self.require(column)?;
        self.opt_int(column)?
            .ok_or(MappingError::UnexpectedNull(column))
    }

    /// Nullable integer column. An absent column reads as NULL.
    pub fn opt_int(&self, column: &'static str) -> Result<Option<i64>, MappingError> {
        match self.nullable(column) {
            None => Ok(None),
            Some(Value::Integer(value)) => Ok(Some(*value)),
            Some(Value::Text(text)) => text.trim().parse::<i64>().map(Some).map_err(|_| {
                MappingError::Unconvertible {
                    column,
                    value: text.clone(),
                    expected: "integer",
                }
            }),
            Some(other) => Err(wrong_type(column, "INTEGER", other)),
        }
    }

    /// Required calendar date stored as `YYYY-MM-DD` text.
    pub fn date(&self, column: &'static str) -> Result<NaiveDate, MappingError> {
        let text = self.text(column)?;
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| {
            MappingError::Unconvertible {
                column,
                value: text,
                expected: "calendar date",
            }
        })
    }

    fn require(&self, column: &'static str) -> Result<&Value, MappingError> {
        self.get(column).ok_or(MappingError::MissingColumn(column))
    }

    fn nullable(&self, column: &'static str) -> Option<&Value> {
        self.get(column).filter(|value| !matches!(value, Value::Null))
    }
}

impl RowMapper for ResultRow {
    fn map_row(row: &ResultRow) -> Result<Self, MappingError> {
        Ok(row.clone())
    }
}

/// Converts a date into the value bound for `DATE` columns.
pub fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format(DATE_FORMAT).to_string())
}

fn wrong_type(column: &'static str, expected: &'static str, found: &Value) -> MappingError {
    MappingError::WrongType {
        column,
        expected,
        found: value_kind(found),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Integer(_) => "INTEGER",
        Value::Real(_) => "REAL",
        Value::Text(_) => "TEXT",
        Value::Blob(_) => "BLOB",
    }
}

impl RowMapper for Post {
    fn map_row(row: &ResultRow) -> Result<Self, MappingError> {
        let time_to_read = row.int("time_to_read")?;
        let time_to_read =
            i32::try_from(time_to_read).map_err(|_| MappingError::Unconvertible {
                column: "time_to_read",
                value: time_to_read.to_string(),
                expected: "32-bit integer",
            })?;

        let post = Post {
            id: row.text("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            date: row.date("date")?,
            time_to_read,
            tags: row.opt_text("tags")?,
            version: row.opt_int("version")?,
        };
        post.validate()
            .map_err(|err| MappingError::Invalid(err.to_string()))?;
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::{date_value, ResultRow, RowMapper};
    use crate::error::MappingError;
    use crate::model::post::Post;
    use chrono::NaiveDate;
    use rusqlite::types::Value;

    fn post_row() -> Vec<(String, Value)> {
        vec![
            ("id".to_string(), Value::Text("1234".to_string())),
            ("title".to_string(), Value::Text("Hello, World!".to_string())),
            ("slug".to_string(), Value::Text("hello-world".to_string())),
            ("date".to_string(), Value::Text("2024-01-01".to_string())),
            ("time_to_read".to_string(), Value::Integer(10)),
            ("tags".to_string(), Value::Text("Spring Boot".to_string())),
            ("version".to_string(), Value::Integer(3)),
        ]
    }

    fn with_column(column: &str, value: Value) -> ResultRow {
        let mut columns = post_row();
        for entry in columns.iter_mut() {
            if entry.0 == column {
                entry.1 = value.clone();
            }
        }
        ResultRow::new(columns)
    }

    fn without_column(column: &str) -> ResultRow {
        ResultRow::new(
            post_row()
                .into_iter()
                .filter(|(name, _)| name != column)
                .collect(),
        )
    }

    #[test]
    fn maps_complete_row() {
        let post = Post::map_row(&ResultRow::new(post_row())).unwrap();
        assert_eq!(post.id, "1234");
        assert_eq!(post.title, "Hello, World!");
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(post.time_to_read, 10);
        assert_eq!(post.tags.as_deref(), Some("Spring Boot"));
        assert_eq!(post.version, Some(3));
    }

    #[test]
    fn column_lookup_ignores_case() {
        let upper = post_row()
            .into_iter()
            .map(|(name, value)| (name.to_ascii_uppercase(), value))
            .collect();
        let post = Post::map_row(&ResultRow::new(upper)).unwrap();
        assert_eq!(post.slug, "hello-world");
    }

    #[test]
    fn nullable_columns_map_null_and_absence_to_none() {
        let post = Post::map_row(&with_column("tags", Value::Null)).unwrap();
        assert_eq!(post.tags, None);

        let post = Post::map_row(&without_column("version")).unwrap();
        assert_eq!(post.version, None);
    }

    #[test]
    fn missing_required_column_is_error() {
        let err = Post::map_row(&without_column("slug")).unwrap_err();
        assert_eq!(err, MappingError::MissingColumn("slug"));
    }

    #[test]
    fn null_in_required_column_is_error() {
        let err = Post::map_row(&with_column("title", Value::Null)).unwrap_err();
        assert_eq!(err, MappingError::UnexpectedNull("title"));
    }

    #[test]
    fn numeric_text_is_coerced_and_garbage_is_rejected() {
        let post =
            Post::map_row(&with_column("time_to_read", Value::Text(" 7 ".to_string()))).unwrap();
        assert_eq!(post.time_to_read, 7);

        let err = Post::map_row(&with_column("time_to_read", Value::Text("ten".to_string())))
            .unwrap_err();
        assert!(matches!(
            err,
            MappingError::Unconvertible {
                column: "time_to_read",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_time_to_read_is_rejected() {
        let err = Post::map_row(&with_column("time_to_read", Value::Integer(i64::MAX)))
            .unwrap_err();
        assert!(matches!(err, MappingError::Unconvertible { .. }));
    }

    #[test]
    fn wrong_storage_type_is_rejected() {
        let err = Post::map_row(&with_column("time_to_read", Value::Real(1.5))).unwrap_err();
        assert_eq!(
            err,
            MappingError::WrongType {
                column: "time_to_read",
                expected: "INTEGER",
                found: "REAL",
            }
        );
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let err =
            Post::map_row(&with_column("date", Value::Text("01/02/2024".to_string()))).unwrap_err();
        assert!(matches!(err, MappingError::Unconvertible { column: "date", .. }));
    }

    #[test]
    fn blank_title_fails_validation() {
        let err = Post::map_row(&with_column("title", Value::Text("  ".to_string()))).unwrap_err();
        assert!(matches!(err, MappingError::Invalid(_)));
    }

    #[test]
    fn date_value_uses_iso_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(date_value(date), Value::Text("2024-03-09".to_string()));
    }
}
