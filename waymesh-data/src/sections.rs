//! JSON export of the street-section dual graph.

use camino::Utf8Path;
use serde::Serialize;
use waymesh_core::{JunctionId, RoadSection, RoadSectionGraph};

use crate::features::{WriteError, write_json};

#[derive(Debug, Serialize)]
struct Connection<'a> {
    from: &'a str,
    to: &'a str,
    junction: JunctionId,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct SectionsDocument<'a> {
    sections: Vec<&'a RoadSection>,
    connections: Vec<Connection<'a>>,
}

/// Write the sections of `graph` and the junctions connecting them.
///
/// # Errors
///
/// Returns [`WriteError`] when the file cannot be created or written.
pub fn write_sections(path: &Utf8Path, graph: &RoadSectionGraph) -> Result<(), WriteError> {
    let document = SectionsDocument {
        sections: graph.sections().collect(),
        connections: graph
            .connections()
            .map(|(from, to, shared)| Connection {
                from,
                to,
                junction: shared.junction,
                lat: shared.location.y,
                lon: shared.location.x,
            })
            .collect(),
    };
    write_json(path, &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use serde_json::Value;
    use tempfile::TempDir;
    use waymesh_core::test_support::{NetworkFixture, edge, metres_east};

    #[rstest]
    fn sections_and_connections_are_written() {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        let network = NetworkFixture::new()
            .junction_at(1, metres_east(0.0))
            .junction_at(2, metres_east(100.0))
            .junction_at(3, metres_east(200.0))
            .edge(edge(1, 2, 100.0).street("a"))
            .edge(edge(2, 3, 100.0).street("b"))
            .network();

        let target = root.join("sections.json");
        write_sections(&target, network.sections()).expect("write sections");

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&target).expect("read output"))
                .expect("json");
        let sections = written["sections"].as_array().expect("sections array");
        assert_eq!(sections.len(), 2);
        let connections = written["connections"].as_array().expect("connections array");
        assert!(
            connections
                .iter()
                .any(|c| c["from"] == "a" && c["to"] == "b" && c["junction"] == 2)
        );
    }
}
