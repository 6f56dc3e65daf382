//! Statement layer shared by every access strategy.
//!
//! # Responsibility
//! - Bind parameters, execute one statement and detach result rows.
//! - Map rows into entities.
//!
//! # Invariants
//! - Nothing in this module keeps a connection beyond one call.

pub mod binding;
pub mod client;
pub mod exec;
pub mod row;
pub mod template;
