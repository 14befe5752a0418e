use crate::error::{Error, Result};
use crate::models::{OsmType, VersionedObject};
use crate::source::{Document, OsmSource};
use crate::xml;
use tracing::debug;

/// Edit history of one entity.
///
/// Slot `v - 1` holds version `v`; redacted versions are `None`. The slot
/// count is the highest version observed, which can differ from the version of
/// the object that owns the history.
#[derive(Debug, Clone, Default)]
pub enum History {
    #[default]
    NotLoaded,
    Loaded(Vec<Option<VersionedObject>>),
}

impl History {
    /// Builds a sparse history from version records. Records are assumed to
    /// belong to one entity; a later record for the same version wins.
    ///
    /// Versions start at 1, a record with version 0 is `InvalidVersion`.
    pub fn from_records(records: impl IntoIterator<Item = VersionedObject>) -> Result<Self> {
        let mut slots: Vec<Option<VersionedObject>> = Vec::new();
        for record in records {
            if record.version == 0 {
                return Err(Error::InvalidVersion(format!(
                    "{} {} v0",
                    record.osmtype, record.identifier
                )));
            }
            let index = (record.version - 1) as usize;
            if slots.len() <= index {
                slots.resize(index + 1, None);
            }
            slots[index] = Some(record);
        }
        Ok(History::Loaded(slots))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, History::Loaded(_))
    }

    pub fn slots(&self) -> Option<&[Option<VersionedObject>]> {
        match self {
            History::Loaded(slots) => Some(slots),
            History::NotLoaded => None,
        }
    }

    /// The record for `version`, if loaded and not redacted.
    pub fn get(&self, version: u32) -> Option<&VersionedObject> {
        let index = version.checked_sub(1)? as usize;
        self.slots()?.get(index)?.as_ref()
    }

    /// The highest present version.
    pub fn latest_version(&self) -> Option<&VersionedObject> {
        self.slots()?.iter().rev().find_map(Option::as_ref)
    }

    pub fn present_count(&self) -> usize {
        self.slots()
            .map(|slots| slots.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }
}

/// Fetches and parses the full edit history of an entity.
pub async fn fetch_history<S>(source: &S, osmtype: OsmType, identifier: u64) -> Result<History>
where
    S: OsmSource + ?Sized,
{
    let document = source.history_document(osmtype, identifier).await?;
    history_from_document(osmtype, identifier, &document)
}

pub(crate) fn history_from_document(
    osmtype: OsmType,
    identifier: u64,
    document: &Document,
) -> Result<History> {
    let parsed =
        xml::parse_document(&document.body).map_err(|e| Error::malformed(&document.location, e))?;

    if parsed.root != "osm" {
        return Err(Error::malformed(
            &document.location,
            format!("expected <osm> root element, found <{}>", parsed.root),
        ));
    }

    let mut records = Vec::with_capacity(parsed.entries.len());
    for entry in parsed.entries {
        let record = entry.object;
        if record.osmtype != osmtype || record.identifier != identifier {
            return Err(Error::malformed(
                &document.location,
                format!(
                    "history of {} {} contains {}",
                    osmtype, identifier, record
                ),
            ));
        }
        records.push(record);
    }

    let history = History::from_records(records)?;
    debug!(
        %osmtype,
        identifier,
        slots = history.slots().map(|s| s.len()).unwrap_or(0),
        present = history.present_count(),
        "history loaded"
    );
    Ok(history)
}

impl VersionedObject {
    /// Retrieves the edit history unless it is already loaded.
    pub async fn load_history<S>(&mut self, source: &S) -> Result<()>
    where
        S: OsmSource + ?Sized,
    {
        if self.history.is_loaded() {
            return Ok(());
        }
        self.history = fetch_history(source, self.osmtype, self.identifier).await?;
        Ok(())
    }

    /// Returns the most recent existing version older than this one.
    ///
    /// Redacted versions are skipped. The history is fetched on the first
    /// call and reused afterwards.
    pub async fn previous_version<S>(&mut self, source: &S) -> Result<&VersionedObject>
    where
        S: OsmSource + ?Sized,
    {
        if self.version == 1 {
            return Err(Error::InvalidOperation(format!(
                "there is nothing before v1 of {} {}",
                self.osmtype, self.identifier
            )));
        }
        self.load_history(source).await?;
        self.previous_in_history()
    }

    /// The record at `version` in the loaded history.
    pub fn history_version(&self, version: u32) -> Option<&VersionedObject> {
        self.history.get(version)
    }

    fn previous_in_history(&self) -> Result<&VersionedObject> {
        let slots = self.history.slots().ok_or_else(|| {
            Error::InvalidOperation(format!("history of {} is not loaded", self))
        })?;

        (1..self.version)
            .rev()
            .find_map(|version| slots.get((version - 1) as usize).and_then(Option::as_ref))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no previous version of {} because of redaction",
                    self
                ))
            })
    }
}
