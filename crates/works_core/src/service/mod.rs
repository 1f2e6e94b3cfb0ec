//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, blob-store and transaction calls into
//!   use-case level APIs.
//! - Translate every lower-layer failure into [`error::ServiceError`].
//! - Keep transport layers decoupled from storage details.

pub mod activity_service;
pub mod error;
pub mod identity;
pub mod pagination;
pub mod work_service;
