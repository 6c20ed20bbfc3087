use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SCHEMA: &str = "client_requirements_questions.json";
pub const DEFAULT_STORAGE_KEY: &str = "project_requirements_v1";
pub const DEFAULT_ENDPOINT: &str = "https://api.web3forms.com/submit";
pub const DEFAULT_SUBJECT: &str = "New Project Requirements Submission";
const DEFAULT_TOAST_MILLIS: u64 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Runtime settings. Every field has a default so a partial JSON file is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Schema document path or `http(s)` URL.
    pub schema: String,
    /// Key the draft record is stored under.
    pub storage_key: String,
    /// Form-delivery endpoint receiving the multipart POST.
    pub endpoint: String,
    pub access_key: String,
    pub subject: String,
    pub toast_millis: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.into(),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            access_key: String::new(),
            subject: DEFAULT_SUBJECT.into(),
            toast_millis: DEFAULT_TOAST_MILLIS,
        }
    }
}

impl FormConfig {
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(ConfigError::Parse)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config =
            FormConfig::from_json_str(r#"{ "access_key": "abc", "toast_millis": 500 }"#)
                .expect("parse");
        assert_eq!(config.access_key, "abc");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.toast_duration(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_malformed_config() {
        assert!(matches!(
            FormConfig::from_json_str("[1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }
}
