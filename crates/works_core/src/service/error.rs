//! Service error taxonomy.
//!
//! # Responsibility
//! - Define the closed set of failure kinds surfaced to callers.
//! - Translate repository and blob-store causes into those kinds.
//!
//! # Invariants
//! - This module is the only place where low-level causes become kinds.
//! - `Internal` keeps its cause for logs; its public message is generic.
//! - Codes are stable across releases.

use crate::model::form::FormValidationError;
use crate::model::work::WorkId;
use crate::repo::RepoError;
use crate::storage::blob::BlobError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Stable failure kind shared by every service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Field-level input rejected by the form binder.
    Validation,
    /// Target does not exist or was deleted.
    NotFound,
    /// Optimistic-lock mismatch; re-fetch and retry.
    Conflict,
    /// Anything else; cause is kept for logs only.
    Internal,
}

impl ErrorKind {
    /// Stable client-facing code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "WUE00",
            Self::NotFound => "WUE01",
            Self::Conflict => "WUE02",
            Self::Internal => "WUE99",
        }
    }
}

/// Causes collapsed into [`ErrorKind::Internal`].
#[derive(Debug)]
pub enum InternalError {
    /// The call context carried no verified subject.
    MissingIdentity,
    Repo(RepoError),
    Blob(BlobError),
}

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "request context has no verified subject"),
            Self::Repo(err) => write!(f, "repository failure: {err}"),
            Self::Blob(err) => write!(f, "blob store failure: {err}"),
        }
    }
}

impl Error for InternalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingIdentity => None,
            Self::Repo(err) => Some(err),
            Self::Blob(err) => Some(err),
        }
    }
}

impl From<RepoError> for InternalError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<BlobError> for InternalError {
    fn from(value: BlobError) -> Self {
        Self::Blob(value)
    }
}

/// Error returned by every service operation.
#[derive(Debug)]
pub enum ServiceError {
    Validation(FormValidationError),
    NotFound(WorkId),
    Conflict {
        id: WorkId,
        expected: u32,
        actual: u32,
    },
    Internal(InternalError),
}

impl ServiceError {
    /// Wraps any cause as `Internal`, regardless of its own semantics.
    pub fn internal(cause: impl Into<InternalError>) -> Self {
        Self::Internal(cause.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::NotFound(id) => format!("the specified work {id} was not found"),
            Self::Conflict { .. } => {
                "the work was updated by another user; reload it and try again".to_string()
            }
            Self::Internal(_) => {
                "a system error occurred; please contact the administrator".to_string()
            }
        }
    }

    /// Caller-facing error envelope.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.public_message(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::NotFound(id) => write!(f, "work not found: {id}"),
            Self::Conflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "version conflict on work {id}: request has {expected}, stored is {actual}"
            ),
            Self::Internal(err) => write!(f, "internal error: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Internal(err) => Some(err),
            Self::NotFound(_) | Self::Conflict { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Internal(InternalError::Repo(other)),
        }
    }
}

impl From<FormValidationError> for ServiceError {
    fn from(value: FormValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BlobError> for ServiceError {
    fn from(value: BlobError) -> Self {
        Self::Internal(InternalError::Blob(value))
    }
}

/// Serialized `{code, message}` error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, InternalError, ServiceError};
    use crate::repo::RepoError;
    use std::error::Error;

    #[test]
    fn repo_not_found_maps_to_not_found() {
        let err = ServiceError::from(RepoError::NotFound(42));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), "WUE01");
    }

    #[test]
    fn other_repo_errors_collapse_to_internal_with_cause() {
        let err = ServiceError::from(RepoError::NotInTransaction);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.source().is_some());
    }

    #[test]
    fn internal_public_message_hides_cause() {
        let err = ServiceError::internal(RepoError::InvalidData("secret detail".to_string()));
        let body = err.to_body();
        assert_eq!(body.code, "WUE99");
        assert!(!body.message.contains("secret detail"));
        assert!(err.to_string().contains("secret detail"));
    }

    #[test]
    fn missing_identity_is_internal() {
        let err = ServiceError::Internal(InternalError::MissingIdentity);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
