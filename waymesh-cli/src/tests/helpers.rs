//! Test helpers for writing CLI input files into a scratch workspace.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use tempfile::TempDir;

const METRES_PER_DEGREE: f64 = 6_378_137.0 * std::f64::consts::PI / 180.0;

/// Identifiers of the POIs in [`poi_document`].
pub(super) const MUSEUM: u64 = 10;
pub(super) const LIBRARY: u64 = 20;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write fixture file");
}

pub(super) fn write_json_file(path: &Utf8Path, document: &Value) {
    write_utf8(path, document.to_string().as_bytes());
}

fn degrees(metres: f64) -> f64 {
    metres / METRES_PER_DEGREE
}

/// Temporary directory with a UTF-8 root.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Write the standard network, POI and feature documents.
    pub(super) fn with_inputs(self) -> Self {
        write_json_file(&self.path("network.json"), &network_document());
        write_json_file(&self.path("pois.json"), &poi_document());
        write_json_file(&self.path("features.json"), &feature_document());
        self
    }
}

/// Driveable street of four junctions, one hundred metres apart, along the
/// equator.
pub(super) fn network_document() -> Value {
    json!({
        "junctions": [
            {"id": 1, "lat": 0.0, "lon": 0.0},
            {"id": 2, "lat": 0.0, "lon": degrees(100.0)},
            {"id": 3, "lat": 0.0, "lon": degrees(200.0)},
            {"id": 4, "lat": 0.0, "lon": degrees(300.0)},
        ],
        "edges": [
            {"source": 1, "target": 2, "distance": 100, "traffic_volume": 40, "street_id": "via", "status": "active", "driveable": "yes"},
            {"source": 2, "target": 3, "distance": 100, "traffic_volume": 40, "street_id": "via", "status": "active", "driveable": "yes"},
            {"source": 3, "target": 4, "distance": 100, "traffic_volume": 10, "street_id": "corso", "status": "active", "driveable": "yes"},
        ],
    })
}

/// A museum and a library at either end of the street.
pub(super) fn poi_document() -> Value {
    json!({"elements": [
        {"type": "node", "id": MUSEUM, "lat": 0.0, "lon": 0.0, "tags": {"tourism": "museum"}},
        {"type": "node", "id": LIBRARY, "lat": 0.0, "lon": degrees(300.0), "tags": {"amenity": "library"}},
    ]})
}

/// A footway with a crossing node beside it and a street node at its end.
pub(super) fn feature_document() -> Value {
    json!({"data": [
        {"id": 1, "geometry": format!("LINESTRING (0 0, {} 0)", degrees(100.0)), "highway": "footway"},
        {"id": 2, "geometry": format!("POINT (0 {})", degrees(4.0)), "highway": "crossing"},
        {"id": 3, "geometry": format!("POINT ({} 0)", degrees(100.0))},
    ]})
}
