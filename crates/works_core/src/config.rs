//! Process configuration.
//!
//! # Responsibility
//! - Read `WORKS_*` environment variables into [`CoreConfig`].
//! - Apply defaults for everything left unset.
//!
//! # Invariants
//! - Loading never mutates the process environment.
//! - Blank values count as unset.

use crate::logging::default_log_level;
use crate::service::pagination::DEFAULT_PAGE_LIMIT;
use crate::storage::s3::S3Settings;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "WORKS_DB_PATH";
pub const ENV_BLOB_ROOT: &str = "WORKS_BLOB_ROOT";
pub const ENV_PUBLIC_BASE_URL: &str = "WORKS_PUBLIC_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "WORKS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "WORKS_LOG_DIR";
pub const ENV_PAGE_LIMIT: &str = "WORKS_PAGE_LIMIT";
pub const ENV_S3_BUCKET: &str = "WORKS_S3_BUCKET";
pub const ENV_S3_REGION: &str = "WORKS_S3_REGION";
pub const ENV_S3_ENDPOINT: &str = "WORKS_S3_ENDPOINT";
pub const ENV_CDN_DOMAIN: &str = "WORKS_CDN_DOMAIN";

const DEFAULT_DB_FILE_NAME: &str = "works.sqlite3";
const DEFAULT_BLOB_DIR_NAME: &str = "works-blobs";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080/files";

#[derive(Debug)]
pub enum ConfigError {
    /// Value could not be parsed for `key`.
    Invalid { key: &'static str, value: String },
    /// Path must be absolute.
    RelativePath { key: &'static str, value: String },
    /// `key` is required because `required_by` is set.
    Missing {
        key: &'static str,
        required_by: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { key, value } => write!(f, "invalid value for {key}: `{value}`"),
            Self::RelativePath { key, value } => {
                write!(f, "{key} must be an absolute path, got `{value}`")
            }
            Self::Missing { key, required_by } => {
                write!(f, "{key} is required when {required_by} is set")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings for one core process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub blob_root: PathBuf,
    /// Origin or CDN base serving `blob_root`.
    pub public_base_url: String,
    pub log_level: String,
    /// File logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub page_limit: u32,
    /// S3 object storage; the directory store under `blob_root` is used when
    /// `None`.
    pub s3: Option<S3Settings>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        Self {
            db_path: tmp.join(DEFAULT_DB_FILE_NAME),
            blob_root: tmp.join(DEFAULT_BLOB_DIR_NAME),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_limit: DEFAULT_PAGE_LIMIT,
            s3: None,
        }
    }
}

impl CoreConfig {
    /// Loads from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_BLOB_ROOT) {
            config.blob_root = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_PUBLIC_BASE_URL) {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    key: ENV_PUBLIC_BASE_URL,
                    value,
                });
            }
            config.public_base_url = value;
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level = value;
        }
        if let Some(value) = get(ENV_LOG_DIR) {
            let dir = PathBuf::from(&value);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativePath {
                    key: ENV_LOG_DIR,
                    value,
                });
            }
            config.log_dir = Some(dir);
        }
        if let Some(value) = get(ENV_PAGE_LIMIT) {
            config.page_limit = match value.parse::<u32>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: ENV_PAGE_LIMIT,
                        value,
                    })
                }
            };
        }

        if let Some(bucket) = get(ENV_S3_BUCKET) {
            let cdn_domain = get(ENV_CDN_DOMAIN).ok_or(ConfigError::Missing {
                key: ENV_CDN_DOMAIN,
                required_by: ENV_S3_BUCKET,
            })?;
            config.s3 = Some(S3Settings {
                bucket,
                cdn_domain,
                region: get(ENV_S3_REGION),
                endpoint_url: get(ENV_S3_ENDPOINT),
            });
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, ENV_CDN_DOMAIN, ENV_LOG_DIR, ENV_PAGE_LIMIT, ENV_S3_BUCKET,
    };
    use crate::storage::s3::S3Settings;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(load(&[]).unwrap(), CoreConfig::default());
        assert_eq!(CoreConfig::default().page_limit, 100);
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("WORKS_DB_PATH", "/data/works.db"),
            ("WORKS_PUBLIC_BASE_URL", "https://cdn.example.com"),
            ("WORKS_LOG_DIR", "/var/log/works"),
            ("WORKS_PAGE_LIMIT", "25"),
            ("WORKS_BLOB_ROOT", "  "),
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/works.db"));
        assert_eq!(config.public_base_url, "https://cdn.example.com");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/works")));
        assert_eq!(config.page_limit, 25);
        assert_eq!(config.blob_root, CoreConfig::default().blob_root);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[(ENV_PAGE_LIMIT, "0")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[(ENV_PAGE_LIMIT, "many")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[(ENV_LOG_DIR, "logs")]),
            Err(ConfigError::RelativePath { .. })
        ));
        assert!(matches!(
            load(&[("WORKS_PUBLIC_BASE_URL", "ftp://x")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn s3_settings_require_cdn_domain() {
        let config = load(&[
            (ENV_S3_BUCKET, "works-assets"),
            (ENV_CDN_DOMAIN, "cdn.example.com"),
            ("WORKS_S3_REGION", "ap-northeast-1"),
        ])
        .unwrap();
        assert_eq!(
            config.s3,
            Some(S3Settings {
                bucket: "works-assets".to_string(),
                cdn_domain: "cdn.example.com".to_string(),
                region: Some("ap-northeast-1".to_string()),
                endpoint_url: None,
            })
        );

        assert!(matches!(
            load(&[(ENV_S3_BUCKET, "works-assets")]),
            Err(ConfigError::Missing {
                key: "WORKS_CDN_DOMAIN",
                ..
            })
        ));
        assert_eq!(load(&[(ENV_CDN_DOMAIN, "cdn.example.com")]).unwrap().s3, None);
    }
}
