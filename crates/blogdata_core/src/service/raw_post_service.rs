//! Post reads written directly against a borrowed connection.
//!
//! # Responsibility
//! - Prepare, run and iterate one statement with no helper layers.
//!
//! # Invariants
//! - The connection is released when the provider scope ends, also on error.

use crate::db::ConnectionProvider;
use crate::error::{DataResult, MappingError};
use crate::model::post::Post;
use crate::sql::row::DATE_FORMAT;
use chrono::NaiveDate;

/// Lowest-level access strategy: rusqlite statements and column getters.
pub struct RawPostService<P> {
    provider: P,
}

impl<P: ConnectionProvider> RawPostService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Reads every post in storage order.
    pub fn find_all(&self) -> DataResult<Vec<Post>> {
        self.provider.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, slug, date, time_to_read, tags, version FROM post",
            )?;
            let mut rows = stmt.query([])?;

            let mut posts = Vec::new();
            while let Some(row) = rows.next()? {
                let date_text: String = row.get("date")?;
                let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
                    MappingError::Unconvertible {
                        column: "date",
                        value: date_text.clone(),
                        expected: "calendar date",
                    }
                })?;
                posts.push(Post {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    slug: row.get("slug")?,
                    date,
                    time_to_read: row.get("time_to_read")?,
                    tags: row.get("tags")?,
                    version: row.get("version")?,
                });
            }
            Ok(posts)
        })
    }
}
