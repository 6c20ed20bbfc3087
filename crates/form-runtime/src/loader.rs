use std::fmt;
use std::io;
use std::path::PathBuf;

use form_spec::FormSchema;
use thiserror::Error;
use tracing::{debug, info};

/// User-facing message shown when the schema cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load form data. Please refresh.";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("schema request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("schema request to '{url}' returned status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read schema '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("schema document is not valid: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Where the schema document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Url(String),
    Path(PathBuf),
}

impl SchemaSource {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            SchemaSource::Url(trimmed.to_string())
        } else {
            SchemaSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Url(url) => write!(f, "{}", url),
            SchemaSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches and parses the schema in a single attempt.
pub async fn load_schema(source: &SchemaSource) -> Result<FormSchema, LoadError> {
    info!(%source, "loading schema");
    let body = match source {
        SchemaSource::Url(url) => {
            let response = reqwest::get(url).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            response.text().await?
        }
        SchemaSource::Path(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Read {
                    path: path.clone(),
                    source,
                })?
        }
    };
    let schema = parse_schema(&body)?;
    debug!(sections = schema.len(), "schema loaded");
    Ok(schema)
}

pub fn parse_schema(body: &str) -> Result<FormSchema, LoadError> {
    serde_json::from_str(body).map_err(LoadError::Parse)
}
