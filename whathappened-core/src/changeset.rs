use crate::error::{Error, Result};
use crate::models::VersionedObject;
use crate::source::{Document, OsmSource};
use crate::xml;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// The objects touched by one changeset, split by kind of edit.
#[derive(Debug, Clone, Serialize)]
pub struct Changeset {
    pub identifier: u64,
    pub created: Vec<VersionedObject>,
    pub modified: Vec<VersionedObject>,
    pub deleted: Vec<VersionedObject>,
}

impl Changeset {
    pub async fn load<S>(source: &S, identifier: u64) -> Result<Self>
    where
        S: OsmSource + ?Sized,
    {
        let document = source.changeset_document(identifier).await?;
        let changeset = Self::from_document(identifier, &document)?;

        info!(
            changeset = identifier,
            created = changeset.created.len(),
            modified = changeset.modified.len(),
            deleted = changeset.deleted.len(),
            "changeset loaded"
        );

        Ok(changeset)
    }

    pub fn from_document(identifier: u64, document: &Document) -> Result<Self> {
        let parsed =
            xml::parse_document(&document.body).map_err(|e| Error::malformed(&document.location, e))?;

        if parsed.root != "osmChange" {
            return Err(Error::malformed(
                &document.location,
                format!("expected <osmChange> root element, found <{}>", parsed.root),
            ));
        }

        let mut changeset = Changeset {
            identifier,
            created: Vec::new(),
            modified: Vec::new(),
            deleted: Vec::new(),
        };

        for entry in parsed.entries {
            match entry.section.as_str() {
                "create" => changeset.created.push(entry.object),
                "modify" => changeset.modified.push(entry.object),
                "delete" => changeset.deleted.push(entry.object),
                other => debug!(section = other, object = %entry.object, "ignoring entry"),
            }
        }

        Ok(changeset)
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.modified.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Changeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "changeset {}", self.identifier)
    }
}
