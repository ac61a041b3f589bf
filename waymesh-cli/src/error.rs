//! Error types emitted by the waymesh CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waymesh_core::{JoinError, ParseMetricError, RouteError, SnapshotError, SnapshotWriteError};
use waymesh_data::{FeatureFileError, NetworkFileError, PoiFileError, WriteError};

/// Errors emitted by the waymesh CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The `join` command was given no feature file at all.
    #[error("no feature inputs given (set --features or a per-family flag)")]
    NoFeatureInputs,
    /// Both a network file and a snapshot were given where one is expected.
    #[error("set only one of --{first} and --{second}")]
    ConflictingArguments {
        first: &'static str,
        second: &'static str,
    },
    /// The metric name is not recognised.
    #[error(transparent)]
    InvalidMetric(#[from] ParseMetricError),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory { path: Utf8PathBuf },
    /// An output directory could not be created.
    #[error("failed to create output directory {path:?}: {source}")]
    CreateOutputDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading a feature file failed.
    #[error(transparent)]
    ReadFeatures(#[from] FeatureFileError),
    /// Reading a road network file failed.
    #[error(transparent)]
    ReadNetwork(#[from] NetworkFileError),
    /// Reading a POI file failed.
    #[error(transparent)]
    ReadPois(#[from] PoiFileError),
    /// A join pass rejected its parameters.
    #[error("join failed: {0}")]
    Join(#[from] JoinError),
    /// Writing a JSON artefact failed.
    #[error(transparent)]
    WriteArtefact(#[from] WriteError),
    /// Writing the network snapshot failed.
    #[error(transparent)]
    WriteSnapshot(#[from] SnapshotWriteError),
    /// Loading the network snapshot failed.
    #[error(transparent)]
    LoadSnapshot(#[from] SnapshotError),
    /// The route query failed.
    #[error("routing failed: {0}")]
    Route(#[from] RouteError),
    /// Serializing the command summary failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
