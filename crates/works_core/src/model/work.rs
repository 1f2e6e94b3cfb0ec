//! Work domain model.
//!
//! # Responsibility
//! - Define the primary content record and its content-source kind.
//! - Provide persisted-state validation used by repository read/write paths.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused.
//! - `version` starts at 1 and only grows by one per successful update.
//! - `author_id` is written once at creation.
//! - `deleted_at` is the source of truth for tombstone state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Server-assigned numeric work identifier.
pub type WorkId = i64;

/// Version every newly created work starts with.
pub const INITIAL_VERSION: u32 = 1;

/// Decides which of the URL fields are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    /// Content lives at a caller-supplied external URL.
    #[serde(rename = "url")]
    ByUrl,
    /// Thumbnail and content were uploaded to the blob store.
    #[serde(rename = "file")]
    ByFile,
}

impl ContentType {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByUrl => "url",
            Self::ByFile => "file",
        }
    }

    /// Parses the storage value written by [`ContentType::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "url" => Some(Self::ByUrl),
            "file" => Some(Self::ByFile),
            _ => None,
        }
    }
}

/// Canonical persisted work record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: WorkId,
    /// Serialized as `type` to match the external schema naming.
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub title: String,
    pub description: String,
    pub author_id: String,
    /// Empty for `ContentType::ByUrl` works.
    pub thumbnail_url: String,
    pub content_url: String,
    /// Optimistic-lock token.
    pub version: u32,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl Work {
    /// Returns whether this work is still visible to read paths.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Blob references owned by this work.
    ///
    /// URL-sourced works point at external content and own nothing.
    pub fn owned_blob_refs(&self) -> Vec<&str> {
        match self.kind {
            ContentType::ByUrl => Vec::new(),
            ContentType::ByFile => [self.thumbnail_url.as_str(), self.content_url.as_str()]
                .into_iter()
                .filter(|url| !url.is_empty())
                .collect(),
        }
    }

    /// Validates persisted-state invariants.
    pub fn validate(&self) -> Result<(), WorkValidationError> {
        validate_fields(&self.title, &self.author_id, self.version)
    }
}

/// Insert shape for a work that has no storage identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWork {
    pub kind: ContentType,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub thumbnail_url: String,
    pub content_url: String,
    pub version: u32,
}

impl NewWork {
    /// Validates the row before insert.
    pub fn validate(&self) -> Result<(), WorkValidationError> {
        validate_fields(&self.title, &self.author_id, self.version)
    }
}

/// Persisted-state validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkValidationError {
    EmptyTitle,
    EmptyAuthor,
    InvalidVersion(u32),
}

impl Display for WorkValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "work title must not be empty"),
            Self::EmptyAuthor => write!(f, "work author must not be empty"),
            Self::InvalidVersion(version) => {
                write!(f, "work version must be >= {INITIAL_VERSION}, got {version}")
            }
        }
    }
}

impl Error for WorkValidationError {}

fn validate_fields(title: &str, author_id: &str, version: u32) -> Result<(), WorkValidationError> {
    if title.trim().is_empty() {
        return Err(WorkValidationError::EmptyTitle);
    }
    if author_id.trim().is_empty() {
        return Err(WorkValidationError::EmptyAuthor);
    }
    if version < INITIAL_VERSION {
        return Err(WorkValidationError::InvalidVersion(version));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ContentType, Work, WorkValidationError};

    fn file_work() -> Work {
        Work {
            id: 7,
            kind: ContentType::ByFile,
            title: "title".to_string(),
            description: String::new(),
            author_id: "auth0|alice".to_string(),
            thumbnail_url: "https://cdn.example.com/a.png".to_string(),
            content_url: "https://cdn.example.com/b.zip".to_string(),
            version: 1,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    #[test]
    fn content_type_storage_values_roundtrip() {
        for kind in [ContentType::ByUrl, ContentType::ByFile] {
            assert_eq!(ContentType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ContentType::parse("ftp"), None);
    }

    #[test]
    fn url_works_own_no_blobs() {
        let mut work = file_work();
        assert_eq!(work.owned_blob_refs().len(), 2);

        work.kind = ContentType::ByUrl;
        assert!(work.owned_blob_refs().is_empty());
    }

    #[test]
    fn validate_rejects_zero_version() {
        let mut work = file_work();
        work.version = 0;
        assert_eq!(work.validate(), Err(WorkValidationError::InvalidVersion(0)));
    }
}
