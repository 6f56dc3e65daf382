//! Post use-cases on top of `QueryTemplate`.
//!
//! # Responsibility
//! - Keep statement text here and row interpretation in `Post::map_row`.
//!
//! # Invariants
//! - Every statement uses positional parameters only.
//! - Inserts start the version counter at 0.

use crate::db::ConnectionProvider;
use crate::error::DataResult;
use crate::model::post::Post;
use crate::repo::entity::Entity;
use crate::sql::row::RowMapper;
use crate::sql::template::QueryTemplate;
use rusqlite::types::Value;

const SELECT_POST: &str = "SELECT id, title, slug, date, time_to_read, tags, version FROM post";

/// Template-based access strategy.
pub struct TemplatePostService<P> {
    template: QueryTemplate<P>,
}

impl<P: ConnectionProvider> TemplatePostService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            template: QueryTemplate::new(provider),
        }
    }

    pub fn find_all(&self) -> DataResult<Vec<Post>> {
        self.template.query(SELECT_POST, &[], Post::map_row)
    }

    pub fn find_by_id(&self, id: &str) -> DataResult<Option<Post>> {
        self.template.query_for_optional(
            &format!("{SELECT_POST} WHERE id = ?"),
            &[Value::Text(id.to_string())],
            Post::map_row,
        )
    }

    pub fn find_by_slug(&self, slug: &str) -> DataResult<Option<Post>> {
        self.template.query_for_optional(
            &format!("{SELECT_POST} WHERE slug = ?"),
            &[Value::Text(slug.to_string())],
            Post::map_row,
        )
    }

    /// Inserts `post` and returns the affected row count.
    pub fn create(&self, post: &Post) -> DataResult<usize> {
        post.validate()?;
        let mut args = vec![post.id_value()];
        args.extend(post.data_values());
        args.push(Value::Integer(0));
        self.template.update(
            "INSERT INTO post (id, title, slug, date, time_to_read, tags, version)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            &args,
        )
    }

    /// Overwrites the data columns of the row with `id`; `version` is left alone.
    pub fn update(&self, post: &Post, id: &str) -> DataResult<usize> {
        post.validate()?;
        let mut args = post.data_values();
        args.push(Value::Text(id.to_string()));
        self.template.update(
            "UPDATE post
             SET title = ?, slug = ?, date = ?, time_to_read = ?, tags = ?
             WHERE id = ?",
            &args,
        )
    }

    /// Deletes by id and returns the affected row count.
    pub fn delete(&self, id: &str) -> DataResult<usize> {
        self.template
            .update("DELETE FROM post WHERE id = ?", &[Value::Text(id.to_string())])
    }
}
