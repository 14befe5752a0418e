#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use whathappened_core::{Document, Error, OsmSource, OsmType, Result};

/// In-memory source serving fixed documents.
///
/// Anything not registered answers like an unreachable server.
#[derive(Default)]
pub struct FixtureSource {
    changesets: HashMap<u64, String>,
    histories: HashMap<(OsmType, u64), String>,
    history_fetches: AtomicUsize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changeset(mut self, identifier: u64, body: impl Into<String>) -> Self {
        self.changesets.insert(identifier, body.into());
        self
    }

    pub fn with_history(mut self, osmtype: OsmType, identifier: u64, body: impl Into<String>) -> Self {
        self.histories.insert((osmtype, identifier), body.into());
        self
    }

    pub fn history_fetches(&self) -> usize {
        self.history_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OsmSource for FixtureSource {
    async fn changeset_document(&self, identifier: u64) -> Result<Document> {
        let location = format!("fixture://changeset/{}/download", identifier);
        match self.changesets.get(&identifier) {
            Some(body) => Ok(Document::new(location, body.clone())),
            None => Err(Error::remote(location, "connection refused")),
        }
    }

    async fn history_document(&self, osmtype: OsmType, identifier: u64) -> Result<Document> {
        self.history_fetches.fetch_add(1, Ordering::SeqCst);
        let location = format!("fixture://{}/{}/history", osmtype, identifier);
        match self.histories.get(&(osmtype, identifier)) {
            Some(body) => Ok(Document::new(location, body.clone())),
            None => Err(Error::remote(location, "connection refused")),
        }
    }
}

/// Wraps entity elements in an `osmChange` modify section.
pub fn modify(elements: &[&str]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<osmChange version="0.6" generator="fixture"><modify>{}</modify></osmChange>"#,
        elements.concat()
    )
}

/// Wraps entity elements in an `osm` history document.
pub fn history(elements: &[&str]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="fixture">{}</osm>"#,
        elements.concat()
    )
}

pub fn watch(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}
