//! Repository layer: declarative CRUD over entity metadata.
//!
//! # Responsibility
//! - Derive statements from `Entity` metadata instead of hand-written SQL.
//! - Surface optimistic-lock conflicts and duplicate keys as typed errors.
//!
//! # Invariants
//! - Repository writes call `Entity::validate()` before any SQL mutation.
//! - A zero-row guarded mutation is `ConcurrencyConflict`, never not-found.

pub mod crud_repo;
pub mod entity;
pub mod post_repo;
