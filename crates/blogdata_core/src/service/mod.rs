//! Post use-case services, one per access strategy.
//!
//! # Responsibility
//! - Show the same use-cases through raw statements, the query template and
//!   the fluent client.
//! - Keep callers decoupled from statement details.

pub mod post_service;
pub mod raw_post_service;
pub mod template_post_service;
