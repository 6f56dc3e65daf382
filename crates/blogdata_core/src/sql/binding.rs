//! Placeholder scanning and parameter binding.
//!
//! # Responsibility
//! - Find `?` and `:name` placeholders in statement text.
//! - Pair them with positional or named values.
//! - Rewrite the text to SQLite numbered placeholders (`?1`, `?2`, ...).
//!
//! # Invariants
//! - Values are never spliced into statement text.
//! - Placeholders inside string literals, quoted identifiers and comments
//!   are left untouched.
//! - Binding is pure and completes before any connection is acquired.

use crate::error::BindingError;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::ops::Range;

// Literals, quoted identifiers and comments are matched first so that the
// placeholder alternatives never fire inside them.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|`[^`]*`|\[[^\]]*\]|--[^\n]*|/\*(?s:.*?)\*/|\?(\d*)|:([A-Za-z_][A-Za-z0-9_]*)|[$@][A-Za-z_][A-Za-z0-9_]*"#,
    )
    .expect("valid placeholder regex")
});

/// Parameters supplied to one statement invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// No parameters.
    #[default]
    None,
    /// Values matched left to right against `?` placeholders.
    Positional(Vec<Value>),
    /// Values matched by name against `:name` placeholders.
    Named(BTreeMap<String, Value>),
}

impl Params {
    /// Builds positional parameters from any sequence of bindable values.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Builds named parameters from `(name, value)` pairs.
    ///
    /// A repeated name keeps its last value; the fluent client rejects
    /// repeats instead.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::None => "no",
            Self::Positional(_) => "positional",
            Self::Named(_) => "named",
        }
    }
}

/// Statement text with numbered placeholders and values in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    sql: String,
    values: Vec<Value>,
}

impl BoundStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder<'a> {
    Positional,
    Named(&'a str),
}

/// Pairs `params` with the placeholders found in `sql`.
///
/// # Errors
/// - `MixedPlaceholders` when the text uses both `?` and `:name`.
/// - `ModeMismatch` when the supplied parameter kind differs from the text.
/// - `PositionalCount`, `MissingNamed`, `UnusedNamed` on count mismatches.
/// - `NumberedPlaceholder` for `?N` placeholders.
/// - `PrefixedPlaceholder` for `$name` and `@name` placeholders.
pub fn bind(sql: &str, params: Params) -> Result<BoundStatement, BindingError> {
    let placeholders = scan(sql)?;
    let positional = placeholders
        .iter()
        .filter(|(_, kind)| *kind == Placeholder::Positional)
        .count();
    let named = placeholders.len() - positional;

    if positional > 0 && named > 0 {
        return Err(BindingError::MixedPlaceholders);
    }

    match params {
        Params::Positional(values) if named == 0 => bind_positional(sql, &placeholders, values),
        Params::Named(values) if positional == 0 => bind_named(sql, &placeholders, values),
        Params::None if placeholders.is_empty() => Ok(BoundStatement {
            sql: sql.to_string(),
            values: Vec::new(),
        }),
        Params::None if named == 0 => Err(BindingError::PositionalCount {
            expected: positional,
            actual: 0,
        }),
        Params::None => {
            let first = placeholders
                .iter()
                .find_map(|(_, kind)| match kind {
                    Placeholder::Named(name) => Some(name.to_string()),
                    Placeholder::Positional => None,
                })
                .unwrap_or_default();
            Err(BindingError::MissingNamed(first))
        }
        other => Err(BindingError::ModeMismatch {
            statement: if named > 0 { "named" } else { "positional" },
            supplied: other.kind(),
        }),
    }
}

fn scan(sql: &str) -> Result<Vec<(Range<usize>, Placeholder<'_>)>, BindingError> {
    let mut placeholders = Vec::new();
    for caps in TOKEN_RE.captures_iter(sql) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if let Some(number) = caps.get(1) {
            if !number.as_str().is_empty() {
                return Err(BindingError::NumberedPlaceholder(whole.as_str().to_string()));
            }
            placeholders.push((whole.range(), Placeholder::Positional));
        } else if let Some(name) = caps.get(2) {
            placeholders.push((whole.range(), Placeholder::Named(name.as_str())));
        } else if whole.as_str().starts_with(['$', '@']) {
            return Err(BindingError::PrefixedPlaceholder(whole.as_str().to_string()));
        }
    }
    Ok(placeholders)
}

fn bind_positional(
    sql: &str,
    placeholders: &[(Range<usize>, Placeholder<'_>)],
    values: Vec<Value>,
) -> Result<BoundStatement, BindingError> {
    if placeholders.len() != values.len() {
        return Err(BindingError::PositionalCount {
            expected: placeholders.len(),
            actual: values.len(),
        });
    }

    let numbers = (1..=placeholders.len()).collect::<Vec<_>>();
    Ok(BoundStatement {
        sql: rewrite(sql, placeholders, &numbers),
        values,
    })
}

fn bind_named(
    sql: &str,
    placeholders: &[(Range<usize>, Placeholder<'_>)],
    mut supplied: BTreeMap<String, Value>,
) -> Result<BoundStatement, BindingError> {
    let mut order: Vec<&str> = Vec::new();
    let mut values = Vec::new();
    let mut numbers = Vec::with_capacity(placeholders.len());

    for (_, kind) in placeholders {
        let Placeholder::Named(name) = kind else {
            continue;
        };
        let number = match order.iter().position(|seen| seen == name) {
            Some(index) => index + 1,
            None => {
                let value = supplied
                    .remove(*name)
                    .ok_or_else(|| BindingError::MissingNamed(name.to_string()))?;
                order.push(*name);
                values.push(value);
                order.len()
            }
        };
        numbers.push(number);
    }

    if let Some(unused) = supplied.into_keys().next() {
        return Err(BindingError::UnusedNamed(unused));
    }

    Ok(BoundStatement {
        sql: rewrite(sql, placeholders, &numbers),
        values,
    })
}

fn rewrite(sql: &str, placeholders: &[(Range<usize>, Placeholder<'_>)], numbers: &[usize]) -> String {
    let mut out = String::with_capacity(sql.len() + placeholders.len() * 2);
    let mut cursor = 0;
    for ((range, _), number) in placeholders.iter().zip(numbers) {
        out.push_str(&sql[cursor..range.start]);
        out.push('?');
        out.push_str(&number.to_string());
        cursor = range.end;
    }
    out.push_str(&sql[cursor..]);
    out
}
