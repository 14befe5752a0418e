//! Reader for the OSM API XML formats (`osmChange` and `osm`).
//!
//! Both formats are walked as one event stream. Every `node`, `way` or
//! `relation` element becomes an [`Entry`] labelled with the name of its
//! enclosing element, so callers decide what a section means.

use crate::models::{OsmType, VersionedObject};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str::FromStr;

#[derive(Debug)]
pub(crate) struct Entry {
    pub section: String,
    pub object: VersionedObject,
}

#[derive(Debug)]
pub(crate) struct OsmDocument {
    pub root: String,
    pub entries: Vec<Entry>,
}

pub(crate) fn parse_document(xml: &str) -> Result<OsmDocument, String> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<String> = Vec::new();
    let mut root: Option<String> = None;
    // Entity being read, with the depth it was opened at.
    let mut current: Option<(usize, Entry)> = None;
    let mut entries = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(element) => {
                let name = element_name(&element)?;
                if root.is_none() {
                    root = Some(name.clone());
                } else if let Some((_, entry)) = current.as_mut() {
                    if name == "tag" {
                        let (key, value) = read_tag(&element)?;
                        entry.object.tags.insert(key, value);
                    }
                } else if let Some(osmtype) = OsmType::parse(&name) {
                    let entry = Entry {
                        section: open.last().cloned().unwrap_or_default(),
                        object: read_object(osmtype, &element)?,
                    };
                    current = Some((open.len(), entry));
                }
                open.push(name);
            }
            Event::Empty(element) => {
                let name = element_name(&element)?;
                if root.is_none() {
                    root = Some(name);
                    continue;
                }
                if let Some((_, entry)) = current.as_mut() {
                    if name == "tag" {
                        let (key, value) = read_tag(&element)?;
                        entry.object.tags.insert(key, value);
                    }
                } else if let Some(osmtype) = OsmType::parse(&name) {
                    entries.push(Entry {
                        section: open.last().cloned().unwrap_or_default(),
                        object: read_object(osmtype, &element)?,
                    });
                }
            }
            Event::End(_) => {
                open.pop();
                if matches!(current, Some((depth, _)) if depth == open.len()) {
                    if let Some((_, entry)) = current.take() {
                        entries.push(entry);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(format!("unexpected end of document inside <{}>", open.join("/")));
    }
    let root = root.ok_or_else(|| "document has no root element".to_string())?;

    Ok(OsmDocument { root, entries })
}

fn element_name(element: &BytesStart<'_>) -> Result<String, String> {
    std::str::from_utf8(element.name().as_ref())
        .map(str::to_owned)
        .map_err(|e| e.to_string())
}

fn read_object(osmtype: OsmType, element: &BytesStart<'_>) -> Result<VersionedObject, String> {
    let mut identifier = None;
    let mut version = None;
    let mut changeset = None;
    let mut timestamp = None;
    let mut user = None;
    let mut visible = true;

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        match attribute.key.as_ref() {
            b"id" => identifier = Some(parse_number::<u64>(osmtype, "id", &value)?),
            b"version" => version = Some(parse_number::<u32>(osmtype, "version", &value)?),
            b"changeset" => changeset = Some(parse_number::<u64>(osmtype, "changeset", &value)?),
            b"timestamp" => timestamp = Some(parse_timestamp(&value)?),
            b"user" => user = Some(value.into_owned()),
            b"visible" => visible = value != "false",
            _ => {}
        }
    }

    let identifier = identifier.ok_or_else(|| format!("<{}> without id", osmtype))?;
    let version =
        version.ok_or_else(|| format!("<{} id=\"{}\"> without version", osmtype, identifier))?;
    if version == 0 {
        return Err(format!("{} {} has version 0", osmtype, identifier));
    }

    let mut object = VersionedObject::new(osmtype, identifier, version).with_visible(visible);
    if let Some(changeset) = changeset {
        object = object.with_changeset(changeset);
    }
    if let Some(timestamp) = timestamp {
        object = object.with_timestamp(timestamp);
    }
    if let Some(user) = user {
        object = object.with_user(user);
    }
    Ok(object)
}

fn read_tag(element: &BytesStart<'_>) -> Result<(String, String), String> {
    let mut key = None;
    let mut value = None;

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        match attribute.key.as_ref() {
            b"k" => key = Some(attribute.unescape_value().map_err(|e| e.to_string())?),
            b"v" => value = Some(attribute.unescape_value().map_err(|e| e.to_string())?),
            _ => {}
        }
    }

    match (key, value) {
        (Some(key), Some(value)) => Ok((key.into_owned(), value.into_owned())),
        _ => Err("<tag> without k or v".to_string()),
    }
}

fn parse_number<T: FromStr>(osmtype: OsmType, attribute: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("<{}> has invalid {} {:?}", osmtype, attribute, value))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp {:?}: {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osmChange version="0.6" generator="OpenStreetMap server">
  <modify>
    <node id="101" version="3" changeset="9000" user="alice" timestamp="2024-03-01T10:00:00Z" visible="true" lat="51.5" lon="-0.1">
      <tag k="amenity" v="cafe"/>
      <tag k="name" v="Tom &amp; Jerry's"/>
    </node>
    <way id="202" version="2" changeset="9000">
      <nd ref="1"/>
      <nd ref="2"/>
      <tag k="highway" v="service"/>
    </way>
  </modify>
  <delete>
    <relation id="303" version="5" changeset="9000" visible="false"/>
  </delete>
</osmChange>"#;

    #[test]
    fn test_entries_keep_section_and_order() {
        let document = parse_document(CHANGE).unwrap();

        assert_eq!(document.root, "osmChange");
        let sections: Vec<&str> = document.entries.iter().map(|e| e.section.as_str()).collect();
        assert_eq!(sections, vec!["modify", "modify", "delete"]);

        let node = &document.entries[0].object;
        assert_eq!(node.osmtype, OsmType::Node);
        assert_eq!(node.identifier, 101);
        assert_eq!(node.version, 3);
        assert_eq!(node.changeset, Some(9000));
        assert_eq!(node.user.as_deref(), Some("alice"));
        assert_eq!(node.tags["name"], "Tom & Jerry's");
        assert!(node.timestamp.is_some());

        let way = &document.entries[1].object;
        assert_eq!(way.osmtype, OsmType::Way);
        assert_eq!(way.tags.len(), 1);

        let relation = &document.entries[2].object;
        assert!(!relation.visible);
        assert!(relation.tags.is_empty());
    }

    #[test]
    fn test_reads_tags_with_closing_element() {
        let xml = r#"<osm>
  <node id="7" version="2">
    <tag k="amenity" v="cafe"></tag>
    <tag k="name" v="Corner"/>
  </node>
  <way id="8" version="1"><tag k="highway" v="path"></tag></way>
</osm>"#;
        let document = parse_document(xml).unwrap();

        assert_eq!(document.entries.len(), 2);
        let node = &document.entries[0].object;
        assert_eq!(node.tags.len(), 2);
        assert_eq!(node.tags["amenity"], "cafe");
        assert_eq!(node.tags["name"], "Corner");
        assert_eq!(document.entries[1].object.tags["highway"], "path");
    }

    #[test]
    fn test_rejects_closed_tag_without_value() {
        let xml = r#"<osm><node id="7" version="2"><tag k="amenity"></tag></node></osm>"#;
        assert!(parse_document(xml).is_err());
    }

    #[test]
    fn test_empty_root_is_a_document() {
        let document = parse_document(r#"<osm version="0.6"/>"#).unwrap();
        assert_eq!(document.root, "osm");
        assert!(document.entries.is_empty());
    }

    #[test]
    fn test_rejects_non_xml() {
        assert!(parse_document("").is_err());
        assert!(parse_document("<html><body>").is_err());
    }

    #[test]
    fn test_rejects_missing_version() {
        let err = parse_document(r#"<osm><node id="1"/></osm>"#).unwrap_err();
        assert!(err.contains("without version"));
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        let err = parse_document(r#"<osm><way id="-x" version="1"/></osm>"#).unwrap_err();
        assert!(err.contains("invalid id"));
    }

    #[test]
    fn test_rejects_tag_without_value() {
        let xml = r#"<osm><node id="1" version="1"><tag k="name"/></node></osm>"#;
        assert!(parse_document(xml).is_err());
    }

    #[test]
    fn test_ignores_tags_outside_entities() {
        let xml = r#"<osm><changeset id="5"><tag k="comment" v="fix"/></changeset></osm>"#;
        let document = parse_document(xml).unwrap();
        assert!(document.entries.is_empty());
    }
}
