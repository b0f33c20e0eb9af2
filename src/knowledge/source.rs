//! Knowledge sources
//!
//! A source yields the knowledge base as a JSON array of
//! `{"topic": ..., "content": ...}` objects, either from disk or over HTTP.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::knowledge::KnowledgeItem;
use crate::{Error, Result};

/// Timeout for fetching a remote knowledge base
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Something the knowledge base can be loaded from
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Load every item, in source order
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the source is unreachable or malformed
    async fn load(&self) -> Result<Vec<KnowledgeItem>>;

    /// Location for logging
    fn describe(&self) -> String;
}

/// JSON file on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KnowledgeSource for JsonFileSource {
    async fn load(&self) -> Result<Vec<KnowledgeItem>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Load(format!("{}: {e}", self.path.display())))?;

        parse_items(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// JSON document served over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: Client,
}

impl HttpSource {
    /// Create a source for `url` with the fetch timeout applied
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl KnowledgeSource for HttpSource {
    async fn load(&self) -> Result<Vec<KnowledgeItem>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Load(format!("fetch {} failed: {e}", self.url)))?;

        if !response.status().is_success() {
            return Err(Error::Load(format!(
                "fetch {} failed: HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Load(format!("read {} failed: {e}", self.url)))?;

        parse_items(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Pick the source matching a location string
///
/// `http://` and `https://` locations are fetched, anything else is a path.
///
/// # Errors
///
/// Returns error if the HTTP client for a remote location cannot be built
pub fn source_for(location: &str) -> Result<Box<dyn KnowledgeSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSource::new(location)?))
    } else {
        Ok(Box::new(JsonFileSource::new(location)))
    }
}

fn parse_items(json: &str) -> Result<Vec<KnowledgeItem>> {
    serde_json::from_str(json).map_err(|e| Error::Load(format!("invalid knowledge base: {e}")))
}
