//! Sources the dashboard reads its catalog and health-check reports from

use crate::errors::{ReportError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Name of the service catalog document at the source root.
pub const CATALOG_PATH: &str = "config.json";

/// Anything that can hand out text documents by relative path.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch_text(&self, path: &str) -> Result<String>;

    /// Human readable location, for logs.
    fn describe(&self) -> String;
}

/// Pick an HTTP source for URLs and a directory source for everything else.
pub fn open_source(location: &str, http_timeout: Duration) -> Result<Arc<dyn LogSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(location.to_string(), http_timeout)?))
    } else {
        Ok(Arc::new(DirectorySource::new(location)))
    }
}

/// Reads documents from a status site over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: String, http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("uptime_reporter/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ReportError::Http)?;

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn handle_response(&self, response: Response, url: &str) -> Result<String> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        let error_message = match status.as_u16() {
            401 | 403 => format!("Access denied for {}", url),
            404 => format!("No document at {}", url),
            429 => format!("Rate limited fetching {}", url),
            500..=599 => format!("Server error {} fetching {}", status, url),
            _ => format!("Unexpected response {} for {}", status, url),
        };

        Err(ReportError::Source(error_message))
    }
}

#[async_trait]
impl LogSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let url = self.url_for(path);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await?;
        self.handle_response(response, &url).await
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Reads documents from a local directory laid out like the status site.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LogSource for DirectorySource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let full_path = self.root.join(path.trim_start_matches('/'));
        debug!("Reading {}", full_path.display());

        Ok(tokio::fs::read_to_string(&full_path).await?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Documents already held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(path.into(), text.into());
        self
    }
}

#[async_trait]
impl LogSource for MemorySource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| ReportError::Source(format!("No document at {}", path)))
    }

    fn describe(&self) -> String {
        format!("memory ({} documents)", self.documents.len())
    }
}
