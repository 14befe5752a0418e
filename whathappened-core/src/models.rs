use crate::error::Error;
use crate::history::History;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl OsmType {
    pub const ALL: [OsmType; 3] = [OsmType::Node, OsmType::Way, OsmType::Relation];

    pub fn as_str(&self) -> &'static str {
        match self {
            OsmType::Node => "node",
            OsmType::Way => "way",
            OsmType::Relation => "relation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" => Some(OsmType::Node),
            "way" => Some(OsmType::Way),
            "relation" => Some(OsmType::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for OsmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for OsmType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for OsmType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::InvalidOsmType(s.to_string()))
    }
}

/// One OSM entity at one version.
///
/// The edit history of the entity is fetched lazily, see
/// [`VersionedObject::previous_version`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedObject {
    pub osmtype: OsmType,
    pub identifier: u64,
    pub version: u32,
    pub tags: Tags,
    pub changeset: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub user: Option<String>,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(skip)]
    pub(crate) history: History,
}

fn visible_by_default() -> bool {
    true
}

impl VersionedObject {
    pub fn new(osmtype: OsmType, identifier: u64, version: u32) -> Self {
        Self {
            osmtype,
            identifier,
            version,
            tags: Tags::new(),
            changeset: None,
            timestamp: None,
            user: None,
            visible: true,
            history: History::NotLoaded,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_changeset(mut self, changeset: u64) -> Self {
        self.changeset = Some(changeset);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Seeds the object with an already retrieved history so that no remote
    /// fetch happens on the next lookup.
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether any of the current tag keys is in `keys`.
    pub fn has_any_tag(&self, keys: &BTreeSet<String>) -> bool {
        self.tags.keys().any(|key| keys.contains(key))
    }
}

impl fmt::Display for VersionedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} v{}", self.osmtype, self.identifier, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osmtype_round_trips_through_text() {
        for osmtype in OsmType::ALL {
            assert_eq!(OsmType::parse(osmtype.as_str()), Some(osmtype));
        }
        assert_eq!(OsmType::parse("Node"), None);
        assert_eq!(OsmType::parse("changeset"), None);
    }

    #[test]
    fn test_osmtype_from_str_rejects_unknown() {
        assert_eq!("way".parse::<OsmType>().unwrap(), OsmType::Way);

        let err = "area".parse::<OsmType>().unwrap_err();
        assert!(matches!(err, Error::InvalidOsmType(name) if name == "area"));
    }

    #[test]
    fn test_osmtype_serializes_lowercase() {
        let json = serde_json::to_string(&OsmType::Relation).unwrap();
        assert_eq!(json, "\"relation\"");
    }

    #[test]
    fn test_object_builder() {
        let object = VersionedObject::new(OsmType::Way, 42, 3)
            .with_tag("highway", "residential")
            .with_tags([("name", "Main Street")])
            .with_user("mapper")
            .with_changeset(1001);

        assert_eq!(object.tags.len(), 2);
        assert_eq!(object.tags["highway"], "residential");
        assert_eq!(object.user.as_deref(), Some("mapper"));
        assert_eq!(object.changeset, Some(1001));
        assert!(object.visible);
        assert!(!object.history().is_loaded());
        assert_eq!(object.to_string(), "way 42 v3");
    }

    #[test]
    fn test_has_any_tag() {
        let object = VersionedObject::new(OsmType::Node, 1, 2).with_tag("amenity", "cafe");
        let watched: BTreeSet<String> = ["amenity".to_string()].into();
        let unwatched: BTreeSet<String> = ["shop".to_string()].into();

        assert!(object.has_any_tag(&watched));
        assert!(!object.has_any_tag(&unwatched));
    }
}
