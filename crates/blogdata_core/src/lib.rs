//! Data-access layer for blog posts stored in SQLite.
//!
//! The same use-cases are offered through four access strategies: raw
//! rusqlite statements, a query template, a fluent statement builder and a
//! declarative repository with optimistic locking.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sql;

pub use error::{BindingError, DataError, DataResult, MappingError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::post::{Post, PostId, PostValidationError};
pub use repo::crud_repo::SqlRepository;
pub use repo::entity::{Comparison, DerivedQuery, Entity};
pub use repo::post_repo::PostRepository;
pub use service::post_service::PostService;
pub use service::raw_post_service::RawPostService;
pub use service::template_post_service::TemplatePostService;
pub use sql::binding::{BoundStatement, Params};
pub use sql::client::{MappedQuery, SqlClient, StatementSpec};
pub use sql::row::{ResultRow, RowMapper};
pub use sql::template::QueryTemplate;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
