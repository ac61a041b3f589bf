//! Persisted routing network snapshots.
//!
//! A snapshot stores the junctions and edges of an augmented network together
//! with its planar frame. The dual graph, the junction R\*-trees and the edge
//! statistics are rebuilt on load.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use bincode::{deserialize_from, serialize_into};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::PlanarFrame;
use crate::network::{JunctionId, NetworkError, RoadJunction, RouteEdge, RoutingNetwork};

/// File identifier for network snapshots.
pub(crate) const SNAPSHOT_MAGIC: [u8; 4] = *b"WMRN";

/// Supported snapshot format version.
pub(crate) const SNAPSHOT_VERSION: u16 = 1;

/// Payload stored after the header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SnapshotBody {
    pub(crate) frame: PlanarFrame,
    pub(crate) junctions: Vec<RoadJunction>,
    pub(crate) edges: Vec<(JunctionId, JunctionId, RouteEdge)>,
}

/// Error emitted when loading a network snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot could not be read from disk.
    #[error("failed to read network snapshot from {path}: {source}")]
    Io {
        /// Snapshot location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The payload could not be decoded.
    #[error("failed to decode network snapshot from {path}: {source}")]
    Decode {
        /// Snapshot location.
        path: PathBuf,
        /// Decoder error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The file did not start with the snapshot magic.
    #[error("invalid network snapshot magic: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Expected byte sequence.
        expected: [u8; 4],
        /// Sequence read from the file.
        found: [u8; 4],
    },
    /// The snapshot was written by an incompatible version.
    #[error("unsupported network snapshot version {found}; supported version is {supported}")]
    UnsupportedVersion {
        /// Version in the file header.
        found: u16,
        /// Version this binary reads.
        supported: u16,
    },
    /// The decoded junctions and edges do not form a valid network.
    #[error("network snapshot {path} is inconsistent: {source}")]
    Network {
        /// Snapshot location.
        path: PathBuf,
        /// Validation failure.
        #[source]
        source: NetworkError,
    },
}

/// Error emitted when writing a network snapshot.
#[derive(Debug, Error)]
pub enum SnapshotWriteError {
    /// Writing bytes to disk failed.
    #[error("failed to write network snapshot to {path}: {source}")]
    Io {
        /// Destination file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The network could not be encoded.
    #[error("failed to encode network snapshot for {path}: {source}")]
    Encode {
        /// Destination file path.
        path: PathBuf,
        /// Encoder failure from `bincode`.
        #[source]
        source: bincode::Error,
    },
}

/// Persist `network` to `path`, truncating any existing file.
///
/// # Errors
///
/// Returns [`SnapshotWriteError`] when the file cannot be created or written.
pub fn write_network_snapshot(
    path: &Path,
    network: &RoutingNetwork,
) -> Result<(), SnapshotWriteError> {
    let io_err = |source| SnapshotWriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&SNAPSHOT_MAGIC).map_err(io_err)?;
    writer
        .write_all(&SNAPSHOT_VERSION.to_le_bytes())
        .map_err(io_err)?;
    let body = SnapshotBody {
        frame: network.frame(),
        junctions: network.junctions().cloned().collect(),
        edges: network
            .edges()
            .map(|(from, to, edge)| (from, to, edge.clone()))
            .collect(),
    };
    serialize_into(&mut writer, &body).map_err(|source| SnapshotWriteError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    let file = writer
        .into_inner()
        .map_err(|err| io_err(err.into_error()))?;
    file.sync_all().map_err(io_err)
}

/// Load a network written by [`write_network_snapshot`].
///
/// # Errors
///
/// Returns [`SnapshotError`] when the file is missing, has the wrong header,
/// cannot be decoded or describes an inconsistent network.
pub fn load_network_snapshot(path: &Path) -> Result<RoutingNetwork, SnapshotError> {
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut magic = [0_u8; 4];
    reader.read_exact(&mut magic).map_err(io_err)?;
    if magic != SNAPSHOT_MAGIC {
        return Err(SnapshotError::InvalidMagic {
            expected: SNAPSHOT_MAGIC,
            found: magic,
        });
    }

    let mut version_bytes = [0_u8; 2];
    reader.read_exact(&mut version_bytes).map_err(io_err)?;
    let version = u16::from_le_bytes(version_bytes);
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_VERSION,
        });
    }

    let body: SnapshotBody =
        deserialize_from(&mut reader).map_err(|source| SnapshotError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    RoutingNetwork::from_parts(body.junctions, body.edges, body.frame).map_err(|source| {
        SnapshotError::Network {
            path: path.to_path_buf(),
            source,
        }
    })
}
