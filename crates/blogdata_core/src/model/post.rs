//! Post domain model.
//!
//! # Responsibility
//! - Define the in-memory shape of one `post` row.
//! - Validate field-level invariants before persistence.
//!
//! # Invariants
//! - `id` is stable and never reassigned once persisted.
//! - `title` and `slug` are non-blank; `time_to_read` is non-negative.
//! - `version` is `None` until the first insert, then only ever grows by one
//!   per accepted mutation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Primary key of a post.
pub type PostId = String;

/// Field-level invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostValidationError {
    #[error("post id cannot be blank")]
    BlankId,
    #[error("post title cannot be blank")]
    BlankTitle,
    #[error("post slug cannot be blank")]
    BlankSlug,
    #[error("time to read must be non-negative, got {0}")]
    NegativeTimeToRead(i32),
    #[error("version must be non-negative, got {0}")]
    NegativeVersion(i64),
}

/// One blog post row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    /// Estimated reading time in minutes.
    pub time_to_read: i32,
    /// Free-form comma-delimited list, stored verbatim.
    pub tags: Option<String>,
    /// Optimistic-lock counter. `None` marks a post that was never saved.
    pub version: Option<i64>,
}

impl Post {
    /// Creates an unsaved post with a generated id.
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        date: NaiveDate,
        time_to_read: i32,
        tags: Option<String>,
    ) -> Result<Self, PostValidationError> {
        Self::with_id(
            Uuid::new_v4().to_string(),
            title,
            slug,
            date,
            time_to_read,
            tags,
        )
    }

    /// Creates an unsaved post with a caller-provided id.
    pub fn with_id(
        id: impl Into<PostId>,
        title: impl Into<String>,
        slug: impl Into<String>,
        date: NaiveDate,
        time_to_read: i32,
        tags: Option<String>,
    ) -> Result<Self, PostValidationError> {
        let post = Self {
            id: id.into(),
            title: title.into(),
            slug: slug.into(),
            date,
            time_to_read,
            tags,
            version: None,
        };
        post.validate()?;
        Ok(post)
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), PostValidationError> {
        if self.id.trim().is_empty() {
            return Err(PostValidationError::BlankId);
        }
        if self.title.trim().is_empty() {
            return Err(PostValidationError::BlankTitle);
        }
        if self.slug.trim().is_empty() {
            return Err(PostValidationError::BlankSlug);
        }
        if self.time_to_read < 0 {
            return Err(PostValidationError::NegativeTimeToRead(self.time_to_read));
        }
        if let Some(version) = self.version {
            if version < 0 {
                return Err(PostValidationError::NegativeVersion(version));
            }
        }
        Ok(())
    }

    /// Whether this value has never been persisted.
    pub fn is_new(&self) -> bool {
        self.version.is_none()
    }
}
