//! Points of interest from Overpass-style exports.
//!
//! Tagged nodes become single-member POIs. Tagged ways become POIs whose
//! members are their nodes plus a centroid. Untagged nodes only supply
//! coordinates for the ways that reference them.

use std::collections::HashMap;
use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use waymesh_core::{PoiId, PointOfInterest, Tags};

use crate::fs::open_utf8_file;
use crate::network::Numeric;
use crate::tags::collect_tags;

/// Errors returned by [`read_pois`].
#[derive(Debug, Error)]
pub enum PoiFileError {
    /// The file could not be opened.
    #[error("failed to open POI file {path}: {source}")]
    Open {
        /// File location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not an Overpass document.
    #[error("failed to parse POI file {path}: {source}")]
    Parse {
        /// File location.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Counters for one POI file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoiLoadReport {
    /// POIs mapped as nodes.
    pub nodes: usize,
    /// POIs mapped as ways.
    pub ways: usize,
    /// Elements rejected as malformed.
    pub skipped: usize,
    /// Way node references with no matching node.
    pub unresolved_nodes: usize,
}

/// POIs read from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiDocument {
    /// POIs in file order, nodes first.
    pub pois: Vec<PointOfInterest>,
    /// Load counters.
    pub report: PoiLoadReport,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    elements: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id: u64,
        lat: Numeric,
        lon: Numeric,
        #[serde(default)]
        tags: Map<String, Value>,
    },
    Way {
        id: u64,
        #[serde(default)]
        nodes: Vec<u64>,
        #[serde(default)]
        tags: Map<String, Value>,
    },
    #[serde(other)]
    Other,
}

struct PendingWay {
    id: PoiId,
    nodes: Vec<u64>,
    tags: Tags,
}

/// Read a POI file from disk.
///
/// # Errors
///
/// Returns [`PoiFileError`] when the file cannot be opened or has no
/// `elements` array. Malformed elements are skipped.
pub fn read_pois(path: &Utf8Path) -> Result<PoiDocument, PoiFileError> {
    let file = open_utf8_file(path).map_err(|source| PoiFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_pois(BufReader::new(file)).map_err(|source| PoiFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let report = document.report;
    info!(
        "{path}: {} node POIs, {} way POIs, {} elements skipped",
        report.nodes, report.ways, report.skipped
    );
    Ok(document)
}

/// Parse an Overpass document from `reader`.
///
/// # Errors
///
/// Returns the decoder error when the input is not a JSON object with an
/// `elements` array.
pub fn parse_pois<R: Read>(reader: R) -> Result<PoiDocument, serde_json::Error> {
    let raw: RawDocument = serde_json::from_reader(reader)?;
    let mut document = PoiDocument::default();
    let mut locations: HashMap<u64, Coord<f64>> = HashMap::new();
    let mut ways = Vec::new();

    for (position, element) in raw.elements.into_iter().enumerate() {
        let element = match serde_json::from_value::<Element>(element) {
            Ok(element) => element,
            Err(err) => {
                warn!("skipping element {position}: {err}");
                document.report.skipped += 1;
                continue;
            }
        };
        match element {
            Element::Node { id, lat, lon, tags } => {
                let (Some(lat), Some(lon)) = (lat.value(), lon.value()) else {
                    warn!("skipping node {id}: coordinates are not finite numbers");
                    document.report.skipped += 1;
                    continue;
                };
                let location = Coord { x: lon, y: lat };
                locations.insert(id, location);
                let tags = collect_tags(&tags, &[]);
                if !tags.is_empty() {
                    document.pois.push(PointOfInterest::node(id, location, tags));
                    document.report.nodes += 1;
                }
            }
            Element::Way { id, nodes, tags } => {
                let tags = collect_tags(&tags, &[]);
                if !tags.is_empty() {
                    ways.push(PendingWay { id, nodes, tags });
                }
            }
            Element::Other => {}
        }
    }

    for way in ways {
        let mut resolved = Vec::with_capacity(way.nodes.len());
        for node in way.nodes {
            if let Some(location) = locations.get(&node) {
                resolved.push((node, *location));
            } else {
                warn!("way {}: node {node} not found", way.id);
                document.report.unresolved_nodes += 1;
            }
        }
        if resolved.is_empty() {
            warn!("skipping way {}: no resolvable nodes", way.id);
            document.report.skipped += 1;
            continue;
        }
        document
            .pois
            .push(PointOfInterest::way(way.id, way.tags, resolved));
        document.report.ways += 1;
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use waymesh_core::MemberLevel;

    fn parse(document: &Value) -> PoiDocument {
        parse_pois(document.to_string().as_bytes()).expect("valid document")
    }

    #[rstest]
    fn tagged_nodes_and_ways_become_pois() {
        let document = parse(&json!({"elements": [
            {"type": "node", "id": 1, "lat": 45.0, "lon": 9.0, "tags": {"amenity": "cafe"}},
            {"type": "node", "id": 2, "lat": 45.0, "lon": 9.001},
            {"type": "node", "id": 3, "lat": "45.001", "lon": "9.001"},
            {"type": "way", "id": 50, "nodes": [2, 3], "tags": {"building": "museum", "levels": 3}},
            {"type": "relation", "id": 99},
        ]}));

        assert_eq!(document.report.nodes, 1);
        assert_eq!(document.report.ways, 1);
        assert_eq!(document.report.skipped, 0);
        let museum = document.pois.get(1).expect("way POI");
        assert_eq!(museum.id, 50);
        assert_eq!(museum.tags.get("levels").map(String::as_str), Some("3"));
        assert_eq!(museum.point_members().count(), 2);
        assert!(museum.members.iter().any(|m| m.level == MemberLevel::Aggregate));
    }

    #[rstest]
    fn unresolved_way_nodes_are_dropped() {
        let document = parse(&json!({"elements": [
            {"type": "node", "id": 2, "lat": 45.0, "lon": 9.0},
            {"type": "way", "id": 50, "nodes": [2, 404], "tags": {"shop": "bakery"}},
            {"type": "way", "id": 51, "nodes": [405], "tags": {"shop": "florist"}},
        ]}));
        assert_eq!(document.report.ways, 1);
        assert_eq!(document.report.unresolved_nodes, 2);
        assert_eq!(document.report.skipped, 1);
    }

    #[rstest]
    #[case(json!({"type": "node", "id": 1, "lat": "north", "lon": 9.0, "tags": {"a": "b"}}))]
    #[case(json!({"type": "node", "id": 1, "lat": "NaN", "lon": "9.0", "tags": {"amenity": "cafe"}}))]
    #[case(json!({"type": "node", "id": 1, "lat": 45.0, "lon": "inf", "tags": {"amenity": "cafe"}}))]
    #[case(json!({"type": "node", "lat": 45.0, "lon": 9.0}))]
    #[case(json!("node"))]
    fn malformed_elements_are_skipped(#[case] element: Value) {
        let document = parse(&json!({ "elements": [element] }));
        assert!(document.pois.is_empty());
        assert_eq!(document.report.skipped, 1);
    }

    #[rstest]
    fn non_finite_nodes_do_not_place_ways() {
        let document = parse(&json!({"elements": [
            {"type": "node", "id": 2, "lat": "NaN", "lon": 9.0},
            {"type": "way", "id": 50, "nodes": [2], "tags": {"shop": "bakery"}},
        ]}));
        assert!(document.pois.is_empty());
        assert_eq!(document.report.unresolved_nodes, 1);
        assert_eq!(document.report.skipped, 2);
    }
}
