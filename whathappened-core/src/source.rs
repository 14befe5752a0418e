use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::OsmType;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A raw payload together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub location: String,
    pub body: String,
}

impl Document {
    pub fn new(location: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            body: body.into(),
        }
    }
}

/// Read-only access to changeset and history documents.
#[async_trait]
pub trait OsmSource: Send + Sync {
    /// The `osmChange` document of a changeset.
    async fn changeset_document(&self, identifier: u64) -> Result<Document>;

    /// The `osm` document listing every version of an entity.
    async fn history_document(&self, osmtype: OsmType, identifier: u64) -> Result<Document>;
}

#[async_trait]
impl<T: OsmSource + ?Sized> OsmSource for Arc<T> {
    async fn changeset_document(&self, identifier: u64) -> Result<Document> {
        (**self).changeset_document(identifier).await
    }

    async fn history_document(&self, osmtype: OsmType, identifier: u64) -> Result<Document> {
        (**self).history_document(osmtype, identifier).await
    }
}

#[async_trait]
impl<T: OsmSource + ?Sized> OsmSource for &T {
    async fn changeset_document(&self, identifier: u64) -> Result<Document> {
        (**self).changeset_document(identifier).await
    }

    async fn history_document(&self, osmtype: OsmType, identifier: u64) -> Result<Document> {
        (**self).history_document(osmtype, identifier).await
    }
}

/// The OSM API 0.6 over HTTP.
#[derive(Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn changeset_url(&self, identifier: u64) -> String {
        format!("{}/changeset/{}/download", self.base_url, identifier)
    }

    pub fn history_url(&self, osmtype: OsmType, identifier: u64) -> String {
        format!("{}/{}/{}/history", self.base_url, osmtype, identifier)
    }

    async fn get(&self, url: String) -> Result<Document> {
        debug!(%url, "fetching");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "request failed");
                return Err(Error::remote(url, e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "unexpected status");
            return Err(Error::remote(url, format!("status {}", status)));
        }

        let body = response.text().await.map_err(|e| Error::remote(&url, e))?;
        Ok(Document::new(url, body))
    }
}

#[async_trait]
impl OsmSource for HttpSource {
    async fn changeset_document(&self, identifier: u64) -> Result<Document> {
        self.get(self.changeset_url(identifier)).await
    }

    async fn history_document(&self, osmtype: OsmType, identifier: u64) -> Result<Document> {
        self.get(self.history_url(osmtype, identifier)).await
    }
}
