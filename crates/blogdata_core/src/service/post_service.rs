//! Post use-cases on top of the fluent `SqlClient`.
//!
//! # Responsibility
//! - Express CRUD with hand-written statements and the builder's binding.
//!
//! # Invariants
//! - Lookups and deletes by id use named parameters; writes use positional.
//! - These statements do not touch `version`; optimistic locking lives in
//!   the repository.

use crate::db::ConnectionProvider;
use crate::error::DataResult;
use crate::model::post::Post;
use crate::sql::client::SqlClient;
use crate::sql::row::date_value;

/// Fluent-builder access strategy.
pub struct PostService<P> {
    client: SqlClient<P>,
}

impl<P: ConnectionProvider> PostService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            client: SqlClient::new(provider),
        }
    }

    pub fn find_all(&self) -> DataResult<Vec<Post>> {
        self.client
            .sql("SELECT id, title, slug, date, time_to_read, tags FROM post")
            .query()
            .list()
    }

    pub fn find_by_id(&self, id: &str) -> DataResult<Option<Post>> {
        self.client
            .sql("SELECT id, title, slug, date, time_to_read, tags FROM post WHERE id = :id")
            .param("id", id.to_string())
            .query()
            .optional()
    }

    /// Inserts `post` and returns the affected row count.
    pub fn create(&self, post: &Post) -> DataResult<usize> {
        post.validate()?;
        self.client
            .sql(
                "INSERT INTO post (id, title, slug, date, time_to_read, tags)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(post.id.clone())
            .bind(post.title.clone())
            .bind(post.slug.clone())
            .bind(date_value(post.date))
            .bind(post.time_to_read)
            .bind(post.tags.clone())
            .update()
    }

    /// Overwrites the row with `id` using the fields of `post`.
    pub fn update(&self, post: &Post, id: &str) -> DataResult<usize> {
        post.validate()?;
        self.client
            .sql(
                "UPDATE post
                 SET title = ?, slug = ?, date = ?, time_to_read = ?, tags = ?
                 WHERE id = ?",
            )
            .bind(post.title.clone())
            .bind(post.slug.clone())
            .bind(date_value(post.date))
            .bind(post.time_to_read)
            .bind(post.tags.clone())
            .bind(id.to_string())
            .update()
    }

    /// Deletes by id and returns the affected row count.
    pub fn delete(&self, id: &str) -> DataResult<usize> {
        self.client
            .sql("DELETE FROM post WHERE id = :id")
            .param("id", id.to_string())
            .update()
    }
}
