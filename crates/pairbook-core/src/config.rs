//! Catalogue configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use pairbook_upload::DEFAULT_MAX_UPLOAD_BYTES;

use crate::error::CoreError;
use crate::Result;

const DATABASE_FILE: &str = "pairbook.db";
const DEFAULT_BRIDGE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Largest image accepted by the upload pipeline
    pub max_upload_bytes: u64,
    /// How long a bridge call may wait on the storage host
    pub bridge_timeout_ms: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join(DATABASE_FILE),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            bridge_timeout_ms: DEFAULT_BRIDGE_TIMEOUT_MS,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Pairbook"))
            .unwrap_or_else(|| PathBuf::from(".pairbook"))
    }

    /// Defaults, overridden by `PAIRBOOK_DATA_DIR`,
    /// `PAIRBOOK_MAX_UPLOAD_BYTES` and `PAIRBOOK_BRIDGE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("PAIRBOOK_DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);

        let mut config = Self::new(data_dir);

        if let Some(value) = lookup("PAIRBOOK_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_number("PAIRBOOK_MAX_UPLOAD_BYTES", &value)?;
        }
        if let Some(value) = lookup("PAIRBOOK_BRIDGE_TIMEOUT_MS") {
            config.bridge_timeout_ms = parse_number("PAIRBOOK_BRIDGE_TIMEOUT_MS", &value)?;
        }

        Ok(config)
    }

    pub fn bridge_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CoreError::Config(format!(
            "{key} must be a positive integer, got {value:?}"
        ))),
    }
}

// Simple dirs implementation for common directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(config.database_path.ends_with("pairbook.db"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.bridge_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PAIRBOOK_DATA_DIR", "/tmp/pairbook-data"),
            ("PAIRBOOK_MAX_UPLOAD_BYTES", "1024"),
            ("PAIRBOOK_BRIDGE_TIMEOUT_MS", " 250 "),
        ]))
        .unwrap();

        assert_eq!(
            config.database_path,
            PathBuf::from("/tmp/pairbook-data/pairbook.db")
        );
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.bridge_timeout_ms, 250);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        for value in ["lots", "-1", "0"] {
            let result = Config::from_lookup(lookup(&[("PAIRBOOK_MAX_UPLOAD_BYTES", value)]));
            assert!(matches!(result, Err(CoreError::Config(_))), "accepted {value}");
        }
    }
}
