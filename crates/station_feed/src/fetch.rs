//! Retrieval of the marker source document.
//!
//! The loader only needs "text for a locator"; this module provides the HTTP
//! implementation used in production and a file implementation for offline
//! runs and tests.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::RetrievalError;

/// Request timeout used by [`HttpFetcher::new`].
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetches a text resource by locator.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_text(&self, locator: &str) -> Result<String, RetrievalError>;
}

/// Fetches documents over HTTP(S) with reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, RetrievalError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Request {
                locator: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_text(&self, locator: &str) -> Result<String, RetrievalError> {
        debug!("Fetching {}", locator);
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| RetrievalError::Request {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                locator: locator.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| RetrievalError::Body {
            locator: locator.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Reads documents from the local filesystem. The locator is a path,
/// optionally prefixed with `file://`.
#[derive(Debug, Default, Clone)]
pub struct FileFetcher;

#[async_trait]
impl DocumentFetcher for FileFetcher {
    async fn fetch_text(&self, locator: &str) -> Result<String, RetrievalError> {
        let path = PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| RetrievalError::Io {
                locator: locator.to_string(),
                source,
            })
    }
}

/// Picks the fetcher matching the locator's scheme.
pub fn fetcher_for(locator: &str) -> Result<Arc<dyn DocumentFetcher>, RetrievalError> {
    if is_http(locator) {
        Ok(Arc::new(HttpFetcher::new()?))
    } else {
        Ok(Arc::new(FileFetcher))
    }
}

fn is_http(locator: &str) -> bool {
    let lower = locator.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Builds the raw.githubusercontent.com style URL for a file in a repository.
pub fn raw_file_url(base_url: &str, owner: &str, repo: &str, git_ref: &str, path: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        owner,
        repo,
        git_ref,
        path.trim_start_matches('/')
    )
}
