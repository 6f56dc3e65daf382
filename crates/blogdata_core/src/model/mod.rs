//! Domain model for the post store.
//!
//! # Invariants
//! - Every post is identified by a stable `PostId`.
//! - Model values carry no behavior beyond validation.

pub mod post;
