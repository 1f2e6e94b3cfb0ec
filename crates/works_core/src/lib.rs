//! Core domain logic for the works content lifecycle.
//! This crate is the single source of truth for work and activity invariants.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use bootstrap::{
    build_services, BlobBackend, BootstrapError, DefaultActivityService, DefaultWorkService,
    Services,
};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, SqliteTransactionRunner, TransactionRunner, UnitOfWork};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::activity::{Activity, ActivityType, NewActivity};
pub use model::form::{Asset, FormValidationError, WorkForm};
pub use model::work::{ContentType, NewWork, Work, WorkId, WorkValidationError};
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::work_repo::{SqliteWorkRepository, WorkRepository};
pub use repo::{RepoError, RepoResult};
pub use service::activity_service::ActivityService;
pub use service::error::{ErrorBody, ErrorKind, ServiceError, ServiceResult};
pub use service::identity::RequestContext;
pub use service::pagination::{PageRequest, Pagination};
pub use service::work_service::WorkService;
pub use storage::blob::{BlobError, BlobStore, FsBlobStore, PublicUrlBase};
pub use storage::s3::{S3BlobStore, S3Settings};
pub use storage::ids::{IdentifierGenerator, UuidGenerator};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
