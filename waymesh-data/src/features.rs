//! Feature files: a `data` array of records carrying an id, a WKT geometry
//! and free-form tags.
//!
//! ```json
//! {"data": [{"id": 7, "geometry": "LINESTRING (9.19 45.46, 9.191 45.46)", "highway": "footway"}]}
//! ```
//!
//! Records that cannot be turned into a [`Feature`] are skipped with a
//! warning and counted in [`FeatureLoadReport`].

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use geo::Geometry;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use waymesh_core::{AdjacencyRecord, Feature, FeatureGeometry, FeatureId, JoinPass};
use wkt::{ToWkt, TryFromWkt};

use crate::fs::{create_utf8_file, open_utf8_file};
use crate::tags::collect_tags;

const KEY_ID: &str = "id";
const KEY_GEOMETRY: &str = "geometry";

/// Errors returned by [`read_features`].
#[derive(Debug, Error)]
pub enum FeatureFileError {
    /// The file could not be opened.
    #[error("failed to open feature file {path}: {source}")]
    Open {
        /// File location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a feature document.
    #[error("failed to parse feature file {path}: {source}")]
    Parse {
        /// File location.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned when writing JSON artefacts.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The file could not be created.
    #[error("failed to create {path}: {source}")]
    Create {
        /// File location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Encoding or flushing the document failed.
    #[error("failed to write {path}: {source}")]
    Encode {
        /// File location.
        path: Utf8PathBuf,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Why a single record was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// The record has no usable id.
    #[error("record has no string or integer id")]
    MissingId,
    /// The record has no geometry string.
    #[error("record {id} has no geometry")]
    MissingGeometry {
        /// Record id.
        id: FeatureId,
    },
    /// The geometry string is not valid WKT.
    #[error("record {id} has invalid WKT: {reason}")]
    InvalidWkt {
        /// Record id.
        id: FeatureId,
        /// Parser message.
        reason: String,
    },
    /// The geometry is valid but neither a point nor a line.
    #[error("record {id} has unsupported {kind} geometry")]
    UnsupportedGeometry {
        /// Record id.
        id: FeatureId,
        /// Geometry type name.
        kind: &'static str,
    },
}

/// Counters for one feature file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureLoadReport {
    /// Records turned into features.
    pub loaded: usize,
    /// Records skipped as invalid.
    pub skipped: usize,
}

/// Features read from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureDocument {
    /// Valid features, in file order.
    pub features: Vec<Feature>,
    /// Load counters.
    pub report: FeatureLoadReport,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    data: Vec<Value>,
}

/// Read a feature file from disk.
///
/// # Errors
///
/// Returns [`FeatureFileError`] when the file cannot be opened or is not a
/// JSON object with a `data` array. Invalid records are not errors.
pub fn read_features(path: &Utf8Path) -> Result<FeatureDocument, FeatureFileError> {
    let file = open_utf8_file(path).map_err(|source| FeatureFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_features(BufReader::new(file)).map_err(|source| {
        FeatureFileError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!(
        "{path}: loaded {} features, skipped {}",
        document.report.loaded, document.report.skipped
    );
    Ok(document)
}

/// Parse a feature document from `reader`.
///
/// # Errors
///
/// Returns the decoder error when the input is not a feature document.
pub fn parse_features<R: Read>(reader: R) -> Result<FeatureDocument, serde_json::Error> {
    let raw: RawDocument = serde_json::from_reader(reader)?;
    let mut document = FeatureDocument::default();
    for (position, record) in raw.data.iter().enumerate() {
        match feature_from_record(record) {
            Ok(feature) => {
                document.features.push(feature);
                document.report.loaded += 1;
            }
            Err(err) => {
                warn!("skipping feature record {position}: {err}");
                document.report.skipped += 1;
            }
        }
    }
    Ok(document)
}

/// Convert one JSON record into a feature.
///
/// # Errors
///
/// Returns [`RecordError`] describing the first problem found.
pub fn feature_from_record(record: &Value) -> Result<Feature, RecordError> {
    let Value::Object(fields) = record else {
        return Err(RecordError::MissingId);
    };
    let id = record_id(fields).ok_or(RecordError::MissingId)?;
    let Some(Value::String(text)) = fields.get(KEY_GEOMETRY) else {
        return Err(RecordError::MissingGeometry { id });
    };
    let geometry = match Geometry::<f64>::try_from_wkt_str(text) {
        Ok(geometry) => geometry,
        Err(err) => {
            return Err(RecordError::InvalidWkt {
                id,
                reason: err.to_string(),
            });
        }
    };
    let geometry = match geometry {
        Geometry::Point(point) => FeatureGeometry::Point(point),
        Geometry::LineString(line) => FeatureGeometry::Line(line),
        other => {
            return Err(RecordError::UnsupportedGeometry {
                id,
                kind: geometry_kind(&other),
            });
        }
    };
    let tags = collect_tags(fields, &[KEY_ID, KEY_GEOMETRY]);
    Ok(Feature::new(id, geometry, tags))
}

fn record_id(fields: &Map<String, Value>) -> Option<FeatureId> {
    match fields.get(KEY_ID)? {
        Value::String(text) if !text.is_empty() => Some(FeatureId::from(text.as_str())),
        Value::Number(number) => number.as_u64().map(FeatureId::from).or_else(|| {
            number
                .as_i64()
                .map(|signed| FeatureId::from(signed.to_string()))
        }),
        _ => None,
    }
}

const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "point",
        Geometry::Line(_) => "line",
        Geometry::LineString(_) => "linestring",
        Geometry::Polygon(_) => "polygon",
        Geometry::MultiPoint(_) => "multipoint",
        Geometry::MultiLineString(_) => "multilinestring",
        Geometry::MultiPolygon(_) => "multipolygon",
        Geometry::GeometryCollection(_) => "geometrycollection",
        Geometry::Rect(_) => "rect",
        Geometry::Triangle(_) => "triangle",
    }
}

/// A feature record as written back to disk, with join results attached.
#[derive(Debug, Serialize)]
struct AnnotatedRecord<'a> {
    id: &'a str,
    geometry: String,
    #[serde(flatten)]
    tags: BTreeMap<&'a str, &'a str>,
    #[serde(flatten)]
    neighbours: BTreeMap<&'static str, Vec<&'a str>>,
}

#[derive(Debug, Serialize)]
struct AnnotatedDocument<'a> {
    data: Vec<AnnotatedRecord<'a>>,
}

/// Write `features` with one list-valued property per pass in `records`.
///
/// Each property lists the ids of the neighbours found for that feature;
/// a feature absent from a record gets an empty list.
///
/// # Errors
///
/// Returns [`WriteError`] when the file cannot be created or written.
pub fn write_annotated(
    path: &Utf8Path,
    features: &[Feature],
    records: &[(JoinPass, &AdjacencyRecord)],
) -> Result<(), WriteError> {
    let data = features
        .iter()
        .map(|feature| AnnotatedRecord {
            id: feature.id.as_str(),
            geometry: feature.geometry.to_geometry().wkt_string(),
            tags: feature
                .tags
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect(),
            neighbours: records
                .iter()
                .map(|(pass, record)| {
                    let ids = record
                        .neighbours(&feature.id)
                        .unwrap_or_default()
                        .iter()
                        .map(|n| n.id.as_str())
                        .collect();
                    (pass.property(), ids)
                })
                .collect(),
        })
        .collect();
    write_json(path, &AnnotatedDocument { data })
}

/// Pretty-print `value` as JSON into `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`WriteError`] when the file cannot be created or written.
pub fn write_json<T: Serialize + ?Sized>(path: &Utf8Path, value: &T) -> Result<(), WriteError> {
    let file = create_utf8_file(path).map_err(|source| WriteError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .and_then(|()| writer.flush().map_err(serde_json::Error::io))
        .map_err(|source| WriteError::Encode {
            path: path.to_path_buf(),
            source,
        })
}
