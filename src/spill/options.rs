//! Spill adapter options.
//!
//! Adapters are configured from a flat map of named string options. Keys are
//! `type` plus backend-scoped keys (`fs.dir`, `s3.bucket`, ...). Keys no
//! adapter recognizes are ignored.

use std::collections::HashMap;

use strum_macros::{Display, EnumString};

use crate::config::ENV_PREFIX;
use crate::error_handling::StorageError;

/// Selects the backend.
pub const KEY_TYPE: &str = "type";
/// Spill directory of the local adapter.
pub const KEY_FS_DIR: &str = "fs.dir";
/// Bucket of the object store adapter.
pub const KEY_S3_BUCKET: &str = "s3.bucket";
/// Endpoint (host[:port] or URL) of the object store.
pub const KEY_S3_ENDPOINT: &str = "s3.endpoint";
/// Access key id.
pub const KEY_S3_ACCESS_KEY: &str = "s3.access_key";
/// Secret access key.
pub const KEY_S3_SECRET_KEY: &str = "s3.secret_key";
/// Whether a scheme-less endpoint is reached over TLS (default `true`).
pub const KEY_S3_USE_SSL: &str = "s3.use_ssl";
/// Signing region.
pub const KEY_S3_REGION: &str = "s3.region";
/// Optional key prefix under which artifacts are stored.
pub const KEY_S3_PREFIX: &str = "s3.prefix";

/// Spill backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AdapterKind {
    /// Local directory.
    Fs,
    /// S3-compatible object store.
    S3,
}

/// Named options consumed by `DataAdapter::init`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    values: HashMap<String, String>,
}

impl AdapterOptions {
    /// Creates an empty option set (local adapter, default directory).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the options with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the value of `key` or an error naming the missing option.
    pub fn require(&self, key: &str) -> Result<&str, StorageError> {
        self.get(key).ok_or_else(|| StorageError::InvalidOption {
            key: key.to_string(),
            reason: "required option is missing".to_string(),
        })
    }

    /// Parses `key` as a boolean, falling back to `default` when unset.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, StorageError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(StorageError::InvalidOption {
                    key: key.to_string(),
                    reason: format!("expected a boolean, got {raw:?}"),
                }),
            },
        }
    }

    /// Returns the selected backend (`fs` when `type` is unset).
    pub fn kind(&self) -> Result<AdapterKind, StorageError> {
        match self.get(KEY_TYPE) {
            None => Ok(AdapterKind::Fs),
            Some(raw) => raw.parse().map_err(|_| StorageError::InvalidOption {
                key: KEY_TYPE.to_string(),
                reason: format!("unknown adapter type {raw:?}"),
            }),
        }
    }

    /// Reads options from `SPILLWAY_*` environment variables.
    ///
    /// `SPILLWAY_TYPE` maps to `type`, `SPILLWAY_FS_DIR` to `fs.dir`,
    /// `SPILLWAY_S3_ACCESS_KEY` to `s3.access_key`, and so on.
    pub fn from_env() -> Self {
        Self::from_env_vars(std::env::vars())
    }

    pub(crate) fn from_env_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut options = Self::new();
        for (name, value) in vars {
            let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let suffix = suffix.to_ascii_lowercase();
            let key = match suffix.split_once('_') {
                Some((scope @ ("fs" | "s3"), rest)) => format!("{scope}.{rest}"),
                _ => suffix,
            };
            options.set(key, value);
        }
        options
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AdapterOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.set(key, value);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults_to_fs() {
        assert_eq!(AdapterOptions::new().kind().unwrap(), AdapterKind::Fs);
    }

    #[test]
    fn test_kind_parses_case_insensitively() {
        let options = AdapterOptions::new().with(KEY_TYPE, "S3");
        assert_eq!(options.kind().unwrap(), AdapterKind::S3);
        assert_eq!(AdapterKind::S3.to_string(), "s3");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let options = AdapterOptions::new().with(KEY_TYPE, "tape");
        assert!(matches!(
            options.kind(),
            Err(StorageError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_get_bool() {
        let options: AdapterOptions = [(KEY_S3_USE_SSL, "false"), ("x", "maybe")]
            .into_iter()
            .collect();
        assert!(!options.get_bool(KEY_S3_USE_SSL, true).unwrap());
        assert!(options.get_bool("unset", true).unwrap());
        assert!(options.get_bool("x", true).is_err());
    }

    #[test]
    fn test_require_names_missing_key() {
        let error = AdapterOptions::new().require(KEY_S3_BUCKET).unwrap_err();
        assert!(error.to_string().contains("s3.bucket"));
    }

    #[test]
    fn test_from_env_vars_maps_scoped_keys() {
        let options = AdapterOptions::from_env_vars(vec![
            ("SPILLWAY_TYPE".to_string(), "s3".to_string()),
            ("SPILLWAY_FS_DIR".to_string(), "/var/spill".to_string()),
            ("SPILLWAY_S3_ACCESS_KEY".to_string(), "AKIA".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ]);
        assert_eq!(options.get(KEY_TYPE), Some("s3"));
        assert_eq!(options.get(KEY_FS_DIR), Some("/var/spill"));
        assert_eq!(options.get(KEY_S3_ACCESS_KEY), Some("AKIA"));
        assert_eq!(options.get("path"), None);
    }
}
