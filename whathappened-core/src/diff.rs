use crate::error::{Error, Result};
use crate::models::VersionedObject;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChange {
    pub new: String,
    pub old: String,
}

/// Tag-level difference between two versions of one object.
///
/// The four categories partition the union of both key sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDiff {
    pub created: BTreeMap<String, String>,
    pub deleted: BTreeMap<String, String>,
    pub modified: BTreeMap<String, TagChange>,
    pub same: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineType {
    Created,
    Deleted,
    Modified,
}

#[derive(Debug, Clone)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub content: String,
}

/// Compares `newer` against `older`, which must be an earlier version of the
/// same object.
pub fn compare(newer: &VersionedObject, older: &VersionedObject) -> Result<TagDiff> {
    if newer.version == 1 {
        return Err(Error::InvalidOperation(format!(
            "there is nothing before v1 of {} {}",
            newer.osmtype, newer.identifier
        )));
    }
    if newer.version <= older.version {
        return Err(Error::InvalidOperation(format!(
            "{} can only be compared to an older version, got v{}",
            newer, older.version
        )));
    }

    let mut diff = TagDiff::default();

    for (key, new_value) in &newer.tags {
        match older.tags.get(key) {
            None => {
                diff.created.insert(key.clone(), new_value.clone());
            }
            Some(old_value) if old_value == new_value => {
                diff.same.insert(key.clone());
            }
            Some(old_value) => {
                diff.modified.insert(
                    key.clone(),
                    TagChange {
                        new: new_value.clone(),
                        old: old_value.clone(),
                    },
                );
            }
        }
    }

    for (key, old_value) in &older.tags {
        if !newer.tags.contains_key(key) {
            diff.deleted.insert(key.clone(), old_value.clone());
        }
    }

    Ok(diff)
}

impl TagDiff {
    /// True if nothing was created, deleted or modified.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Whether a watched key was created, modified or deleted.
    pub fn touches(&self, watchlist: &BTreeSet<String>) -> bool {
        watchlist.iter().any(|key| {
            self.created.contains_key(key)
                || self.modified.contains_key(key)
                || self.deleted.contains_key(key)
        })
    }

    /// Keeps only the entries whose key is watched.
    pub fn restrict(&self, watchlist: &BTreeSet<String>) -> TagDiff {
        TagDiff {
            created: keep_watched(&self.created, watchlist),
            deleted: keep_watched(&self.deleted, watchlist),
            modified: keep_watched(&self.modified, watchlist),
            same: self.same.intersection(watchlist).cloned().collect(),
        }
    }

    pub fn lines(&self) -> Vec<DiffLine> {
        let mut lines = Vec::new();

        for (key, value) in &self.created {
            lines.push(DiffLine {
                line_type: DiffLineType::Created,
                content: format!("{}={}", key, value),
            });
        }
        for (key, change) in &self.modified {
            lines.push(DiffLine {
                line_type: DiffLineType::Modified,
                content: format!("{}: {} -> {}", key, change.old, change.new),
            });
        }
        for (key, value) in &self.deleted {
            lines.push(DiffLine {
                line_type: DiffLineType::Deleted,
                content: format!("{}={}", key, value),
            });
        }

        lines
    }
}

fn keep_watched<V: Clone>(
    entries: &BTreeMap<String, V>,
    watchlist: &BTreeSet<String>,
) -> BTreeMap<String, V> {
    entries
        .iter()
        .filter(|(key, _)| watchlist.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
