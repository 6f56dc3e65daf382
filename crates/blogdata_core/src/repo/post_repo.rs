//! Post repository: `post` table metadata and derived lookups.
//!
//! # Responsibility
//! - Declare identity, version and data columns for `Post`.
//! - Offer slug and tag lookups without hand-written SQL.
//!
//! # Invariants
//! - `slug` is not unique in storage; `find_by_slug` reports duplicates as a
//!   cardinality failure instead of picking one.

use crate::db::ConnectionProvider;
use crate::error::DataResult;
use crate::model::post::Post;
use crate::repo::crud_repo::SqlRepository;
use crate::repo::entity::{Comparison, DerivedQuery, Entity};
use crate::sql::row::date_value;
use rusqlite::types::Value;

/// Repository over the `post` table.
pub type PostRepository<P> = SqlRepository<Post, P>;

/// `slug = ?`
pub const BY_SLUG: DerivedQuery = DerivedQuery::equals("slug");
/// `tags LIKE ?`
pub const TAGS_LIKE: DerivedQuery = DerivedQuery::new("tags", Comparison::Like);

impl Entity for Post {
    const TABLE: &'static str = "post";
    const ID_COLUMN: &'static str = "id";
    const VERSION_COLUMN: &'static str = "version";
    const DATA_COLUMNS: &'static [&'static str] =
        &["title", "slug", "date", "time_to_read", "tags"];

    fn id_value(&self) -> Value {
        Value::Text(self.id.clone())
    }

    fn version(&self) -> Option<i64> {
        self.version
    }

    fn with_version(self, version: i64) -> Self {
        Self {
            version: Some(version),
            ..self
        }
    }

    fn data_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.slug.clone()),
            date_value(self.date),
            Value::Integer(i64::from(self.time_to_read)),
            Value::from(self.tags.clone()),
        ]
    }

    fn validate(&self) -> DataResult<()> {
        Ok(Post::validate(self)?)
    }
}

impl<P: ConnectionProvider> SqlRepository<Post, P> {
    pub fn find_by_slug(&self, slug: &str) -> DataResult<Option<Post>> {
        self.find_by(&BY_SLUG, slug.to_string())
    }

    /// Posts whose tag list contains `tag` as a substring.
    pub fn find_all_tagged(&self, tag: &str) -> DataResult<Vec<Post>> {
        let pattern = format!("%{}%", escape_like(tag));
        self.find_all_by(&TAGS_LIKE, pattern)
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
