use crate::changeset::Changeset;
use crate::diff::{compare, TagChange, TagDiff};
use crate::error::Result;
use crate::models::{OsmType, VersionedObject};
use crate::source::OsmSource;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// What happened to the watched tags of one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedChange {
    pub id: u64,
    pub version: u32,
    pub created: BTreeMap<String, String>,
    pub modified: BTreeMap<String, TagChange>,
    pub deleted: BTreeMap<String, String>,
}

impl WatchedChange {
    pub fn to_diff(&self) -> TagDiff {
        TagDiff {
            created: self.created.clone(),
            deleted: self.deleted.clone(),
            modified: self.modified.clone(),
            same: BTreeSet::new(),
        }
    }
}

/// Watched changes grouped by requested object type name.
///
/// Holds exactly the requested names, each possibly with an empty list. A
/// name that is not an OSM type stays empty since no object can match it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchReport(BTreeMap<String, Vec<WatchedChange>>);

impl WatchReport {
    pub fn new<T: AsRef<str>>(osmtypes: &[T]) -> Self {
        Self(
            osmtypes
                .iter()
                .map(|t| (t.as_ref().to_string(), Vec::new()))
                .collect(),
        )
    }

    pub fn get(&self, osmtype: impl AsRef<str>) -> Option<&[WatchedChange]> {
        self.0.get(osmtype.as_ref()).map(Vec::as_slice)
    }

    pub fn osmtypes(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[WatchedChange])> + '_ {
        self.0
            .iter()
            .map(|(t, changes)| (t.as_str(), changes.as_slice()))
    }

    /// Number of reported objects across all types.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    fn push(&mut self, osmtype: OsmType, change: WatchedChange) {
        if let Some(changes) = self.0.get_mut(osmtype.as_str()) {
            changes.push(change);
        }
    }
}

/// Reports watched tag changes of the objects modified by a changeset.
pub struct WatchEvaluator<S> {
    source: S,
    max_concurrent_fetches: usize,
}

impl<S: OsmSource> WatchEvaluator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit.max(1);
        self
    }

    /// Evaluates changeset `identifier` against `watchlist`.
    ///
    /// Only modified objects of the requested types are examined. An object
    /// is examined only when its current tags include a watched key, so an
    /// edit that removed the last watched tag is not reported. Any failure
    /// aborts the whole evaluation.
    pub async fn evaluate<T: AsRef<str>>(
        &self,
        identifier: u64,
        watchlist: &[String],
        osmtypes: &[T],
    ) -> Result<WatchReport> {
        let mut report = WatchReport::new(osmtypes);
        let changeset = Changeset::load(&self.source, identifier).await?;
        let watched: BTreeSet<String> = watchlist.iter().cloned().collect();

        let candidates: Vec<VersionedObject> = changeset
            .modified
            .into_iter()
            .filter(|object| {
                osmtypes
                    .iter()
                    .any(|t| t.as_ref() == object.osmtype.as_str())
            })
            .filter(|object| object.has_any_tag(&watched))
            .collect();

        info!(
            changeset = identifier,
            candidates = candidates.len(),
            "evaluating modified objects"
        );

        let outcomes: Vec<Option<(OsmType, WatchedChange)>> = stream::iter(candidates)
            .map(|object| self.examine(object, &watched))
            .buffered(self.max_concurrent_fetches)
            .try_collect()
            .await?;

        for (osmtype, change) in outcomes.into_iter().flatten() {
            report.push(osmtype, change);
        }

        info!(changeset = identifier, reported = report.total(), "evaluation done");
        Ok(report)
    }

    async fn examine(
        &self,
        mut object: VersionedObject,
        watched: &BTreeSet<String>,
    ) -> Result<Option<(OsmType, WatchedChange)>> {
        let older = object.previous_version(&self.source).await?.clone();
        let diff = compare(&object, &older)?;

        if !diff.touches(watched) {
            debug!(object = %object, "no watched tag changed");
            return Ok(None);
        }

        let diff = diff.restrict(watched);
        debug!(object = %object, previous = older.version, "watched tags changed");

        Ok(Some((
            object.osmtype,
            WatchedChange {
                id: object.identifier,
                version: object.version,
                created: diff.created,
                modified: diff.modified,
                deleted: diff.deleted,
            },
        )))
    }
}

/// One-shot evaluation with the default fetch concurrency.
pub async fn evaluate<S, T>(
    source: &S,
    identifier: u64,
    watchlist: &[String],
    osmtypes: &[T],
) -> Result<WatchReport>
where
    S: OsmSource + ?Sized,
    T: AsRef<str>,
{
    WatchEvaluator::new(source)
        .evaluate(identifier, watchlist, osmtypes)
        .await
}
