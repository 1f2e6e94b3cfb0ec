//! Domain model for works and their audit trail.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Define the mutation payload accepted from the request binder.
//!
//! # Invariants
//! - Every work is identified by a server-assigned numeric `WorkId`.
//! - Deletion is represented by a soft-delete tombstone, not hard delete.
//! - Activities are append-only snapshots.

pub mod activity;
pub mod form;
pub mod work;
