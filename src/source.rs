//! Business extraction from the OpenStreetMap Overpass API.
//!
//! The source is queried exactly once, before the enrichment loop starts.
//! Any failure here is fatal: there is nothing to resume into, and the
//! result store has not been touched yet.

use crate::schema::{BusinessRecord, TagFilter, TagSelector};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Bounding box in Overpass order: south, west, north, east.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bbox {
    /// Parse `S,W,N,E` as given on the command line.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts = raw
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .with_context(|| format!("parse bbox coordinate {part:?}"))
            })
            .collect::<Result<Vec<f64>>>()?;
        if parts.len() != 4 {
            return Err(anyhow!("bbox must be south,west,north,east (got {raw:?})"));
        }
        let bbox = Bbox {
            south: parts[0],
            west: parts[1],
            north: parts[2],
            east: parts[3],
        };
        if bbox.south >= bbox.north || bbox.west >= bbox.east {
            return Err(anyhow!("bbox covers no area: {raw:?}"));
        }
        Ok(bbox)
    }
}

/// Where to search: a named area or an explicit bounding box.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchArea {
    Place(String),
    Bounds(Bbox),
}

impl fmt::Display for SearchArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchArea::Place(place) => write!(f, "{place}"),
            SearchArea::Bounds(bbox) => write!(
                f,
                "bbox {},{},{},{}",
                bbox.south, bbox.west, bbox.north, bbox.east
            ),
        }
    }
}

/// Query the Overpass interpreter and return named, deduplicated records.
pub fn extract_businesses(
    endpoint: &str,
    area: &SearchArea,
    tags: &TagFilter,
) -> Result<Vec<BusinessRecord>> {
    let query = overpass_query(area, tags);
    tracing::debug!(%query, "overpass query");
    let mut response = ureq::post(endpoint)
        .send_form([("data", query.as_str())])
        .with_context(|| format!("query record source at {endpoint}"))?;
    let payload: Value = response
        .body_mut()
        .read_json()
        .context("decode record source payload")?;
    records_from_payload(&payload)
}

/// Build the Overpass QL for an area and tag filter. Value sets expand to
/// one selector per value; an any-value key selects on key presence alone.
pub fn overpass_query(area: &SearchArea, tags: &TagFilter) -> String {
    let mut query = String::from("[out:json][timeout:180]");
    if let SearchArea::Bounds(bbox) = area {
        query.push_str(&format!(
            "[bbox:{},{},{},{}]",
            bbox.south, bbox.west, bbox.north, bbox.east
        ));
    }
    query.push_str(";\n");
    let mut area_filter = "";
    if let SearchArea::Place(place) = area {
        query.push_str(&format!(
            "area[\"name\"=\"{}\"]->.search;\n",
            escape(area_name(place))
        ));
        area_filter = "(area.search)";
    }
    query.push_str("(\n");
    for (key, selector) in tags {
        match selector {
            TagSelector::Any(true) => {
                query.push_str(&format!("  nwr[\"{}\"]{};\n", escape(key), area_filter));
            }
            TagSelector::Any(false) => {}
            TagSelector::Values(values) => {
                for value in values {
                    query.push_str(&format!(
                        "  nwr[\"{}\"=\"{}\"]{};\n",
                        escape(key),
                        escape(value),
                        area_filter
                    ));
                }
            }
        }
    }
    query.push_str(");\nout center;\n");
    query
}

/// The search area is named by the segment before the first comma, so a
/// "City, Country" place identifier matches the city area.
fn area_name(place: &str) -> &str {
    place.split(',').next().unwrap_or(place).trim()
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

fn records_from_payload(payload: &Value) -> Result<Vec<BusinessRecord>> {
    let elements = payload
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("record source payload has no elements"))?;
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for element in elements {
        let Some(record) = record_from_element(element) else {
            continue;
        };
        if seen.insert(record.name.clone()) {
            records.push(record);
        }
    }
    Ok(records)
}

fn record_from_element(element: &Value) -> Option<BusinessRecord> {
    let tags = element.get("tags")?;
    let name = tags.get("name").and_then(Value::as_str)?.trim();
    if name.is_empty() {
        return None;
    }
    let (lat, lon) = coordinate(element)?;
    Some(BusinessRecord {
        name: name.to_string(),
        lat,
        lon,
        website: website_tag(tags),
    })
}

/// Nodes carry their own position; ways and relations are reduced to the
/// center Overpass computes for them.
fn coordinate(element: &Value) -> Option<(f64, f64)> {
    let point = if element.get("lat").is_some() {
        element
    } else {
        element.get("center")?
    };
    Some((point.get("lat")?.as_f64()?, point.get("lon")?.as_f64()?))
}

/// First website-ish tag wins; bare domains get a scheme prepended so the
/// persisted column is directly usable.
fn website_tag(tags: &Value) -> Option<String> {
    for key in ["website", "url", "contact:website"] {
        let Some(site) = tags.get(key).and_then(Value::as_str) else {
            continue;
        };
        let site = site.trim();
        if site.is_empty() {
            continue;
        }
        if site.starts_with("http://") || site.starts_with("https://") {
            return Some(site.to_string());
        }
        return Some(format!("http://{site}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn any_tags() -> TagFilter {
        let mut tags = TagFilter::new();
        tags.insert("shop".to_string(), TagSelector::Any(true));
        tags
    }

    #[test]
    fn bbox_parse_accepts_four_coordinates() {
        let bbox = Bbox::parse("55.6780, 12.5830, 55.6800, 12.5850").unwrap();
        assert_eq!(bbox.south, 55.6780);
        assert_eq!(bbox.east, 12.5850);
    }

    #[test]
    fn bbox_parse_rejects_bad_input() {
        assert!(Bbox::parse("55.6,12.5,55.7").is_err());
        assert!(Bbox::parse("55.6,12.5,55.7,abc").is_err());
        assert!(Bbox::parse("55.7,12.5,55.6,12.6").is_err());
    }

    #[test]
    fn query_for_place_selects_named_area() {
        let mut tags = any_tags();
        tags.insert(
            "amenity".to_string(),
            TagSelector::Values(vec!["cafe".to_string(), "bar".to_string()]),
        );
        let query = overpass_query(
            &SearchArea::Place("København, Danmark".to_string()),
            &tags,
        );
        assert!(query.contains("area[\"name\"=\"København\"]->.search;"));
        assert!(query.contains("nwr[\"shop\"](area.search);"));
        assert!(query.contains("nwr[\"amenity\"=\"cafe\"](area.search);"));
        assert!(query.contains("nwr[\"amenity\"=\"bar\"](area.search);"));
        assert!(query.ends_with("out center;\n"));
    }

    #[test]
    fn query_for_bbox_uses_global_bbox_setting() {
        let bbox = Bbox::parse("55.6780,12.5830,55.6800,12.5850").unwrap();
        let query = overpass_query(&SearchArea::Bounds(bbox), &any_tags());
        assert!(query.starts_with("[out:json][timeout:180][bbox:55.678,12.583,55.68,12.585];"));
        assert!(query.contains("nwr[\"shop\"];"));
        assert!(!query.contains("area."));
    }

    #[test]
    fn payload_parsing_dedups_and_skips_unnamed() {
        let payload = json!({
            "elements": [
                {
                    "type": "node",
                    "lat": 55.6,
                    "lon": 12.5,
                    "tags": { "name": "Cafe A", "website": "cafea.dk" }
                },
                {
                    "type": "way",
                    "center": { "lat": 55.61, "lon": 12.51 },
                    "tags": { "name": "Bakery B" }
                },
                { "type": "node", "lat": 55.62, "lon": 12.52, "tags": { "shop": "bakery" } },
                {
                    "type": "node",
                    "lat": 55.63,
                    "lon": 12.53,
                    "tags": { "name": "Cafe A", "amenity": "cafe" }
                }
            ]
        });
        let records = records_from_payload(&payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Cafe A");
        assert_eq!(records[0].website.as_deref(), Some("http://cafea.dk"));
        assert_eq!(records[1].name, "Bakery B");
        assert_eq!(records[1].lat, 55.61);
        assert_eq!(records[1].website, None);
    }

    #[test]
    fn website_tag_fallback_order_and_scheme() {
        let tags = json!({ "url": "https://b.dk", "contact:website": "c.dk" });
        assert_eq!(website_tag(&tags).as_deref(), Some("https://b.dk"));
        let tags = json!({ "contact:website": "c.dk" });
        assert_eq!(website_tag(&tags).as_deref(), Some("http://c.dk"));
        let tags = json!({ "website": "   " });
        assert_eq!(website_tag(&tags), None);
    }

    #[test]
    fn payload_without_elements_is_an_error() {
        assert!(records_from_payload(&json!({ "remark": "timeout" })).is_err());
    }
}
