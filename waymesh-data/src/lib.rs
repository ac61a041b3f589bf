//! File formats and batch drivers for waymesh.
//!
//! This crate reads the interchange files the core engine consumes and
//! writes the artefacts it produces:
//!
//! - WKT feature documents, read with [`read_features`] and written back
//!   with join results attached by [`write_annotated`];
//! - road network documents, read with [`read_network`];
//! - Overpass POI exports, read with [`read_pois`];
//! - the street-section dual graph, written by [`write_sections`].
//!
//! Malformed records never abort a load. They are logged with `log::warn!`
//! and counted in the load report returned alongside the data.
#![forbid(unsafe_code)]

mod features;
pub mod fs;
mod network;
mod passes;
mod pois;
mod sections;
mod tags;

pub use features::{
    FeatureDocument, FeatureFileError, FeatureLoadReport, RecordError, WriteError,
    feature_from_record, parse_features, read_features, write_annotated, write_json,
};
pub use network::{LoadedNetwork, NetworkFileError, NetworkLoadReport, parse_network, read_network};
pub use passes::{JoinOutput, run_passes};
pub use pois::{PoiDocument, PoiFileError, PoiLoadReport, parse_pois, read_pois};
pub use sections::write_sections;
pub use tags::{FeatureFamilies, classify};
