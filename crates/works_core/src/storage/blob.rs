//! Blob store port, public URL mapping and directory-backed implementation.
//!
//! # Responsibility
//! - Upload assets under caller-chosen keys and return public URLs.
//! - Delete assets by the URL previously returned.
//!
//! # Invariants
//! - Calls never participate in a database transaction.
//! - Deleting an absent object succeeds (S3 semantics).
//! - `FsBlobStore` never writes outside its root directory.

use crate::model::form::Asset;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

static OBJECT_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("valid key regex"));

/// Blob store failures.
#[derive(Debug)]
pub enum BlobError {
    /// Key is not a single safe object name.
    InvalidKey(String),
    /// Reference does not belong to this store.
    ForeignReference(String),
    Io {
        key: String,
        source: std::io::Error,
    },
    /// Failure reported by a remote store adapter.
    Remote(String),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid object key `{key}`"),
            Self::ForeignReference(reference) => {
                write!(f, "reference is not owned by this store: {reference}")
            }
            Self::Io { key, source } => write!(f, "object `{key}` io failure: {source}"),
            Self::Remote(message) => write!(f, "remote store failure: {message}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Object storage port for binary assets.
pub trait BlobStore {
    /// Stores `asset` under `key` and returns its durable public URL.
    fn upload(&self, key: &str, asset: &Asset) -> Result<String, BlobError>;
    /// Deletes the object behind a URL returned by [`BlobStore::upload`].
    fn delete(&self, reference: &str) -> Result<(), BlobError>;
}

impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    fn upload(&self, key: &str, asset: &Asset) -> Result<String, BlobError> {
        (**self).upload(key, asset)
    }

    fn delete(&self, reference: &str) -> Result<(), BlobError> {
        (**self).delete(reference)
    }
}

/// Rejects keys that are not a single safe object name.
pub(crate) fn check_key(key: &str) -> Result<(), BlobError> {
    if !OBJECT_KEY_RE.is_match(key) || key.contains("..") {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Public URL prefix under which a store serves its objects.
///
/// URLs are `<base>/<key>`; the base is the origin or CDN domain in front of
/// the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlBase(String);

impl PublicUrlBase {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into().trim().trim_end_matches('/').to_string())
    }

    /// `https://<domain>` for a bare CDN domain such as `cdn.example.com`.
    pub fn cdn(domain: &str) -> Self {
        let domain = domain.trim();
        let host = domain
            .strip_prefix("https://")
            .or_else(|| domain.strip_prefix("http://"))
            .unwrap_or(domain);
        Self::new(format!("https://{host}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.0)
    }

    /// Recovers the object key from a URL produced by [`Self::url_for`].
    pub fn key_for<'a>(&self, reference: &'a str) -> Result<&'a str, BlobError> {
        let key = reference
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| BlobError::ForeignReference(reference.to_string()))?;
        check_key(key)?;
        Ok(key)
    }
}

/// Bucket-shaped directory store for local runs.
///
/// Objects live flat under `root` and are served from `public_base_url`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    urls: PublicUrlBase,
}

impl FsBlobStore {
    /// Creates the root directory when missing.
    pub fn open(
        root: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, BlobError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| BlobError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self {
            root,
            urls: PublicUrlBase::new(public_base_url),
        })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, BlobError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

impl BlobStore for FsBlobStore {
    fn upload(&self, key: &str, asset: &Asset) -> Result<String, BlobError> {
        let path = self.object_path(key)?;
        if let Err(source) = fs::write(&path, &asset.bytes) {
            error!(
                "event=blob_upload module=storage status=error key={key} error_code=blob_write_failed error={source}"
            );
            return Err(BlobError::Io {
                key: key.to_string(),
                source,
            });
        }

        info!(
            "event=blob_upload module=storage status=ok key={key} size_bytes={}",
            asset.bytes.len()
        );
        Ok(self.urls.url_for(key))
    }

    fn delete(&self, reference: &str) -> Result<(), BlobError> {
        let key = self.urls.key_for(reference)?;
        let path = self.object_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("event=blob_delete module=storage status=ok key={key}");
                Ok(())
            }
            Err(source) if source.kind() == ErrorKind::NotFound => {
                info!("event=blob_delete module=storage status=ok key={key} absent=true");
                Ok(())
            }
            Err(source) => Err(BlobError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}
