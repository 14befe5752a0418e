//! # whathappened-sdk
//!
//! Client for programs that consume a running whathappened server.
//!
//! ## Example
//!
//! ```no_run
//! use whathappened_sdk::WhathappenedClient;
//! use whathappened_core::OsmType;
//!
//! let client = WhathappenedClient::new("http://localhost:5000");
//!
//! // What did changeset 123456 do to amenity and shop tags on nodes?
//! let report = client.changeset(123456, &["amenity", "shop"], Some(&[OsmType::Node])).unwrap();
//!
//! for change in report.get(OsmType::Node).unwrap_or_default() {
//!     println!("node {} v{}: {:?}", change.id, change.version, change.created);
//! }
//! ```

use anyhow::Result;
use reqwest::Url;
use whathappened_core::{OsmType, WatchReport};

#[derive(Clone)]
pub struct WhathappenedClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl WhathappenedClient {
    /// Create a new whathappened client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the whathappened server (e.g., "http://localhost:5000")
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Watched tag changes made by a changeset
    ///
    /// Without `osmtypes` the server's defaults apply (nodes and ways).
    pub fn changeset(
        &self,
        identifier: u64,
        watchlist: &[&str],
        osmtypes: Option<&[OsmType]>,
    ) -> Result<WatchReport> {
        let mut request = self.client.get(self.changeset_url(identifier, watchlist)?);

        if let Some(osmtypes) = osmtypes {
            request = request.query(&[("osmtypes", join_types(osmtypes))]);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            anyhow::bail!("whathappened server answered {}: {}", status, message);
        }

        Ok(response.json()?)
    }

    /// Check server health
    pub fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: serde_json::Value = response.json()?;
        Ok(body["status"] == "ok")
    }

    /// Watch keys go into a single path segment, percent-encoded so that
    /// `/`, `?` or `#` inside a key stay part of it.
    fn changeset_url(&self, identifier: u64, watchlist: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("{} cannot be a base URL", self.base_url))?
            .pop_if_empty()
            .push("whathappened")
            .push(&identifier.to_string())
            .push(&watchlist.join("|"));
        Ok(url)
    }
}

fn join_types(osmtypes: &[OsmType]) -> String {
    osmtypes
        .iter()
        .map(OsmType::as_str)
        .collect::<Vec<_>>()
        .join("|")
}
