//! Mutation payload bound from the request and its field-level rules.
//!
//! # Responsibility
//! - Carry create/update input (`WorkForm`) and uploaded files (`Asset`).
//! - Reject malformed input before any side effect happens.
//!
//! # Invariants
//! - `ContentType::ByUrl` forms carry an absolute http(s) `content_url`.
//! - `ContentType::ByFile` forms carry both `thumbnail` and `content`.
//! - Update forms carry the caller's last-known `version`.

use crate::model::work::ContentType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 200;

static CONTENT_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("valid content url regex"));

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Original client-side file name; only its extension is kept in storage.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Asset {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Create/update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkForm {
    pub kind: ContentType,
    pub title: String,
    pub description: String,
    /// Authoritative only for `ContentType::ByUrl`.
    pub content_url: Option<String>,
    /// Authoritative only for `ContentType::ByFile`.
    pub thumbnail: Option<Asset>,
    /// Authoritative only for `ContentType::ByFile`.
    pub content: Option<Asset>,
    /// Last-known version; required by update, ignored by create.
    pub version: Option<u32>,
}

impl WorkForm {
    /// Builds a URL-sourced form.
    pub fn by_url(
        title: impl Into<String>,
        description: impl Into<String>,
        content_url: impl Into<String>,
    ) -> Self {
        Self {
            kind: ContentType::ByUrl,
            title: title.into(),
            description: description.into(),
            content_url: Some(content_url.into()),
            thumbnail: None,
            content: None,
            version: None,
        }
    }

    /// Builds a file-sourced form.
    pub fn by_file(
        title: impl Into<String>,
        description: impl Into<String>,
        thumbnail: Asset,
        content: Asset,
    ) -> Self {
        Self {
            kind: ContentType::ByFile,
            title: title.into(),
            description: description.into(),
            content_url: None,
            thumbnail: Some(thumbnail),
            content: Some(content),
            version: None,
        }
    }

    /// Sets the last-known version for update requests.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Validates fields shared by create and update.
    pub fn validate(&self) -> Result<(), FormValidationError> {
        if self.title.trim().is_empty() {
            return Err(FormValidationError::Required("title"));
        }
        check_max_chars("title", &self.title, TITLE_MAX_CHARS)?;
        check_max_chars("description", &self.description, DESCRIPTION_MAX_CHARS)?;

        match self.kind {
            ContentType::ByUrl => {
                let url = self
                    .content_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .ok_or(FormValidationError::Required("contentUrl"))?;
                if !CONTENT_URL_RE.is_match(url) {
                    return Err(FormValidationError::InvalidUrl("contentUrl"));
                }
            }
            ContentType::ByFile => {
                check_asset("thumbnail", self.thumbnail.as_ref())?;
                check_asset("content", self.content.as_ref())?;
            }
        }

        Ok(())
    }

    /// Validates an update payload and returns the caller's version.
    pub fn validate_for_update(&self) -> Result<u32, FormValidationError> {
        self.validate()?;
        self.version.ok_or(FormValidationError::Required("version"))
    }
}

/// Field-level input errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValidationError {
    Required(&'static str),
    TooLong { field: &'static str, max_chars: usize },
    InvalidUrl(&'static str),
    OutOfRange(&'static str),
}

impl FormValidationError {
    /// Name of the offending field as seen by the client.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required(field)
            | Self::TooLong { field, .. }
            | Self::InvalidUrl(field)
            | Self::OutOfRange(field) => field,
        }
    }
}

impl Display for FormValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{field} is required"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
            Self::InvalidUrl(field) => write!(f, "{field} must be an absolute http(s) URL"),
            Self::OutOfRange(field) => write!(f, "{field} is out of range"),
        }
    }
}

impl Error for FormValidationError {}

fn check_max_chars(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), FormValidationError> {
    if value.chars().count() > max_chars {
        return Err(FormValidationError::TooLong { field, max_chars });
    }
    Ok(())
}

fn check_asset(field: &'static str, asset: Option<&Asset>) -> Result<(), FormValidationError> {
    match asset {
        Some(asset) if !asset.file_name.trim().is_empty() => Ok(()),
        _ => Err(FormValidationError::Required(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::{Asset, FormValidationError, WorkForm, DESCRIPTION_MAX_CHARS};

    #[test]
    fn url_form_requires_http_url() {
        let form = WorkForm::by_url("foo", "bar", "javascript:alert(1)");
        assert_eq!(
            form.validate(),
            Err(FormValidationError::InvalidUrl("contentUrl"))
        );

        let form = WorkForm::by_url("foo", "bar", "https://example.com");
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn file_form_requires_both_assets() {
        let mut form = WorkForm::by_file(
            "foo",
            "",
            Asset::new("thumb.png", vec![1]),
            Asset::new("work.zip", vec![2]),
        );
        assert_eq!(form.validate(), Ok(()));

        form.content = None;
        assert_eq!(form.validate(), Err(FormValidationError::Required("content")));
    }

    #[test]
    fn description_length_counts_chars_not_bytes() {
        let at_limit = "あ".repeat(DESCRIPTION_MAX_CHARS);
        assert!(WorkForm::by_url("t", at_limit, "https://example.com")
            .validate()
            .is_ok());

        let over = "a".repeat(DESCRIPTION_MAX_CHARS + 1);
        let err = WorkForm::by_url("t", over, "https://example.com")
            .validate()
            .unwrap_err();
        assert_eq!(err.field(), "description");
    }

    #[test]
    fn update_requires_version() {
        let form = WorkForm::by_url("foo", "bar", "https://example.com");
        assert_eq!(
            form.validate_for_update(),
            Err(FormValidationError::Required("version"))
        );
        assert_eq!(form.with_version(3).validate_for_update(), Ok(3));
    }
}
