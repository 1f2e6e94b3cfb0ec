//! Production wiring of services from [`CoreConfig`].

use crate::config::CoreConfig;
use crate::db::{open_db, DbError, SqliteTransactionRunner};
use crate::model::form::Asset;
use crate::repo::activity_repo::SqliteActivityRepository;
use crate::repo::work_repo::SqliteWorkRepository;
use crate::service::activity_service::ActivityService;
use crate::service::work_service::WorkService;
use crate::storage::blob::{BlobError, BlobStore, FsBlobStore};
use crate::storage::ids::UuidGenerator;
use crate::storage::s3::S3BlobStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type SharedRunner = Arc<SqliteTransactionRunner>;

pub type DefaultWorkService = WorkService<
    SharedRunner,
    SqliteWorkRepository,
    SqliteActivityRepository,
    UuidGenerator,
    BlobBackend,
>;

pub type DefaultActivityService = ActivityService<SharedRunner, SqliteActivityRepository>;

/// Object store selected by configuration.
pub enum BlobBackend {
    /// Directory store for local runs.
    Local(FsBlobStore),
    S3(S3BlobStore),
}

impl BlobBackend {
    /// S3 when a bucket is configured, otherwise the directory store.
    pub fn from_config(config: &CoreConfig) -> Result<Self, BlobError> {
        match &config.s3 {
            Some(settings) => S3BlobStore::connect(settings).map(Self::S3),
            None => FsBlobStore::open(&config.blob_root, config.public_base_url.as_str())
                .map(Self::Local),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::S3(_) => "s3",
        }
    }
}

impl BlobStore for BlobBackend {
    fn upload(&self, key: &str, asset: &Asset) -> Result<String, BlobError> {
        match self {
            Self::Local(store) => store.upload(key, asset),
            Self::S3(store) => store.upload(key, asset),
        }
    }

    fn delete(&self, reference: &str) -> Result<(), BlobError> {
        match self {
            Self::Local(store) => store.delete(reference),
            Self::S3(store) => store.delete(reference),
        }
    }
}

/// Services sharing one database connection.
pub struct Services {
    pub works: DefaultWorkService,
    pub activities: DefaultActivityService,
    pub page_limit: u32,
}

#[derive(Debug)]
pub enum BootstrapError {
    Db(DbError),
    Blob(BlobError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database bootstrap failed: {err}"),
            Self::Blob(err) => write!(f, "blob store bootstrap failed: {err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Blob(err) => Some(err),
        }
    }
}

impl From<DbError> for BootstrapError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<BlobError> for BootstrapError {
    fn from(value: BlobError) -> Self {
        Self::Blob(value)
    }
}

/// Opens the database and object store named by `config` and wires services.
pub fn build_services(config: &CoreConfig) -> Result<Services, BootstrapError> {
    let conn = open_db(&config.db_path)?;
    let runner: SharedRunner = Arc::new(SqliteTransactionRunner::new(conn));
    let blobs = BlobBackend::from_config(config)?;

    info!(
        "event=bootstrap module=core status=ok blob_backend={} page_limit={}",
        blobs.name(),
        config.page_limit
    );

    Ok(Services {
        works: WorkService::new(
            Arc::clone(&runner),
            SqliteWorkRepository::new(),
            SqliteActivityRepository::new(),
            UuidGenerator::new(),
            blobs,
        ),
        activities: ActivityService::new(runner, SqliteActivityRepository::new()),
        page_limit: config.page_limit,
    })
}
