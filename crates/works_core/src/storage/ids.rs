//! Object key generation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

static EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{1,16}$").expect("valid extension regex"));

/// Produces unique identifiers used as storage object keys.
pub trait IdentifierGenerator {
    fn generate(&self) -> String;
}

impl<G: IdentifierGenerator + ?Sized> IdentifierGenerator for Arc<G> {
    fn generate(&self) -> String {
        (**self).generate()
    }
}

/// Random UUID v4 generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl UuidGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdentifierGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Builds an object key from a fresh id and the client file name.
///
/// The original extension is kept (`<id>.<ext>`); extensions that are not
/// short alphanumerics are dropped so they cannot smuggle path segments.
pub fn object_key(id: &str, file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| EXTENSION_RE.is_match(ext));
    match extension {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{object_key, IdentifierGenerator, UuidGenerator};

    #[test]
    fn object_key_preserves_extension() {
        assert_eq!(object_key("abc", "cover.PNG"), "abc.PNG");
        assert_eq!(object_key("abc", "archive.tar.gz"), "abc.gz");
    }

    #[test]
    fn object_key_drops_missing_or_unsafe_extension() {
        assert_eq!(object_key("abc", "README"), "abc");
        assert_eq!(object_key("abc", ".bashrc"), "abc");
        assert_eq!(object_key("abc", "x.p/ng"), "abc");
    }

    #[test]
    fn uuid_generator_produces_distinct_ids() {
        let generator = UuidGenerator::new();
        assert_ne!(generator.generate(), generator.generate());
    }
}
