//! Listing request normalization and response envelope.

use crate::model::form::FormValidationError;
use serde::Serialize;

/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Normalized `offset`/`limit` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Resolves raw query values.
    ///
    /// Rules:
    /// - missing `offset` means 0.
    /// - missing `limit` or `-1` means `default_limit`.
    /// - any other negative or oversized value is rejected.
    pub fn resolve(
        offset: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
    ) -> Result<Self, FormValidationError> {
        let offset = match offset {
            None => 0,
            Some(value) => {
                u32::try_from(value).map_err(|_| FormValidationError::OutOfRange("offset"))?
            }
        };
        let limit = match limit {
            None | Some(-1) => default_limit,
            Some(value) => {
                u32::try_from(value).map_err(|_| FormValidationError::OutOfRange("limit"))?
            }
        };
        Ok(Self { offset, limit })
    }
}

/// `{totalItems, offset, items}` listing envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination<T> {
    /// Count of all live rows, independent of `offset`/`limit`.
    pub total_items: u64,
    pub offset: u32,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::{PageRequest, DEFAULT_PAGE_LIMIT};
    use crate::model::form::FormValidationError;

    #[test]
    fn resolve_applies_defaults() {
        assert_eq!(
            PageRequest::resolve(None, None, DEFAULT_PAGE_LIMIT),
            Ok(PageRequest::default())
        );
        assert_eq!(
            PageRequest::resolve(Some(5), Some(-1), 20),
            Ok(PageRequest::new(5, 20))
        );
    }

    #[test]
    fn resolve_rejects_negative_values() {
        assert_eq!(
            PageRequest::resolve(Some(-3), None, DEFAULT_PAGE_LIMIT),
            Err(FormValidationError::OutOfRange("offset"))
        );
        assert_eq!(
            PageRequest::resolve(None, Some(-2), DEFAULT_PAGE_LIMIT),
            Err(FormValidationError::OutOfRange("limit"))
        );
    }
}
