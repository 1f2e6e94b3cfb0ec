//! Verified caller identity.
//!
//! The subject is verified upstream (JWT `sub` claim); services only read it.

use crate::service::error::{InternalError, ServiceError};

/// Per-call context handed in by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    subject: Option<String>,
}

impl RequestContext {
    /// Context for a request whose token has already been verified.
    pub fn authenticated(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
        }
    }

    /// Context without identity (public read paths).
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the usable subject identifier, if any.
    pub fn subject(&self) -> Option<&str> {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty())
    }

    /// Returns the subject or an `Internal` error.
    ///
    /// Mutation routes sit behind the authenticator, so a missing subject is a
    /// wiring bug rather than a client mistake.
    pub(crate) fn require_subject(&self) -> Result<&str, ServiceError> {
        self.subject()
            .ok_or(ServiceError::Internal(InternalError::MissingIdentity))
    }
}

#[cfg(test)]
mod tests {
    use super::RequestContext;
    use crate::service::error::ErrorKind;

    #[test]
    fn blank_subject_is_not_usable() {
        let ctx = RequestContext::authenticated("   ");
        assert_eq!(ctx.subject(), None);
        assert_eq!(
            ctx.require_subject().unwrap_err().kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn subject_is_trimmed() {
        let ctx = RequestContext::authenticated(" auth0|alice ");
        assert_eq!(ctx.subject(), Some("auth0|alice"));
    }
}
