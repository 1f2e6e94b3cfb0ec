//! External object storage for uploaded assets.
//!
//! # Responsibility
//! - Generate collision-resistant object keys.
//! - Upload and delete binary assets outside the database transaction.
//!
//! # Invariants
//! - Keys are generated before any database write, so an uploaded object can
//!   always be referenced; a failed write leaves an orphaned object, never a
//!   dangling database reference.

pub mod blob;
pub mod ids;
pub mod s3;
