//! Road network files: junctions and directed edges.
//!
//! Each junction and edge is decoded on its own so that one bad record does
//! not reject the whole file. Skipped records are logged and counted.

use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use waymesh_core::{EdgeInput, EdgeStatus, FlagValue, JunctionId, JunctionInput, RoadGraph};

use crate::fs::open_utf8_file;

/// Errors returned by [`read_network`].
#[derive(Debug, Error)]
pub enum NetworkFileError {
    /// The file could not be opened.
    #[error("failed to open network file {path}: {source}")]
    Open {
        /// File location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a network document.
    #[error("failed to parse network file {path}: {source}")]
    Parse {
        /// File location.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Counters for one network file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkLoadReport {
    /// Junctions added to the graph.
    pub junctions: usize,
    /// Edges added to the graph.
    pub edges: usize,
    /// Junction records rejected.
    pub skipped_junctions: usize,
    /// Edge records rejected.
    pub skipped_edges: usize,
}

/// Raw road graph with its load counters.
#[derive(Debug, Default)]
pub struct LoadedNetwork {
    /// Graph ready for augmentation.
    pub roads: RoadGraph,
    /// Load counters.
    pub report: NetworkLoadReport,
}

/// A number that some exports write as a string.
///
/// Only finite values are accepted: `"NaN"` and `"inf"` parse as floats but
/// are rejected like any other non-numeric text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    pub(crate) fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StreetId {
    Text(String),
    Number(serde_json::Number),
}

impl StreetId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JunctionRecord {
    id: JunctionId,
    lat: Numeric,
    lon: Numeric,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    source: JunctionId,
    target: JunctionId,
    distance: Numeric,
    #[serde(default)]
    traffic_volume: Option<Numeric>,
    street_id: StreetId,
    status: String,
    #[serde(default)]
    driveable: Option<FlagValue>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    junctions: Vec<Value>,
    edges: Vec<Value>,
}

/// Why a single record was rejected.
#[derive(Debug, Error)]
enum RecordError {
    #[error(transparent)]
    Shape(#[from] serde_json::Error),
    #[error("{field} is not a finite number")]
    NotNumeric { field: &'static str },
    #[error(transparent)]
    Network(#[from] waymesh_core::NetworkError),
}

/// Read a road network file from disk.
///
/// # Errors
///
/// Returns [`NetworkFileError`] when the file cannot be opened or is not a
/// JSON object. Invalid junctions and edges are skipped.
pub fn read_network(path: &Utf8Path) -> Result<LoadedNetwork, NetworkFileError> {
    let file = open_utf8_file(path).map_err(|source| NetworkFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_network(BufReader::new(file)).map_err(|source| {
        NetworkFileError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let report = loaded.report;
    info!(
        "{path}: {} junctions, {} edges ({} junctions and {} edges skipped)",
        report.junctions, report.edges, report.skipped_junctions, report.skipped_edges
    );
    Ok(loaded)
}

/// Parse a road network document from `reader`.
///
/// # Errors
///
/// Returns the decoder error when the input is not a JSON object with
/// `junctions` and `edges` arrays.
pub fn parse_network<R: Read>(reader: R) -> Result<LoadedNetwork, serde_json::Error> {
    let raw: RawNetwork = serde_json::from_reader(reader)?;
    let mut loaded = LoadedNetwork::default();
    for (position, record) in raw.junctions.into_iter().enumerate() {
        match add_junction(&mut loaded.roads, record) {
            Ok(()) => loaded.report.junctions += 1,
            Err(err) => {
                warn!("skipping junction record {position}: {err}");
                loaded.report.skipped_junctions += 1;
            }
        }
    }
    for (position, record) in raw.edges.into_iter().enumerate() {
        match add_edge(&mut loaded.roads, record) {
            Ok(()) => loaded.report.edges += 1,
            Err(err) => {
                warn!("skipping edge record {position}: {err}");
                loaded.report.skipped_edges += 1;
            }
        }
    }
    Ok(loaded)
}

fn add_junction(roads: &mut RoadGraph, record: Value) -> Result<(), RecordError> {
    let record: JunctionRecord = serde_json::from_value(record)?;
    let lat = record
        .lat
        .value()
        .ok_or(RecordError::NotNumeric { field: "lat" })?;
    let lon = record
        .lon
        .value()
        .ok_or(RecordError::NotNumeric { field: "lon" })?;
    roads.add_junction(JunctionInput {
        id: record.id,
        lat,
        lon,
    })?;
    Ok(())
}

fn add_edge(roads: &mut RoadGraph, record: Value) -> Result<(), RecordError> {
    let record: EdgeRecord = serde_json::from_value(record)?;
    let distance = record
        .distance
        .value()
        .ok_or(RecordError::NotNumeric { field: "distance" })?;
    let traffic_volume = match record.traffic_volume {
        Some(volume) => volume.value().ok_or(RecordError::NotNumeric {
            field: "traffic_volume",
        })?,
        None => 0.0,
    };
    let status: EdgeStatus = record.status.parse()?;
    roads.add_edge(EdgeInput {
        source: record.source,
        target: record.target,
        distance,
        traffic_volume,
        street_id: record.street_id.into_string(),
        status,
        driveable: record.driveable,
        name: record.name,
    })?;
    Ok(())
}
