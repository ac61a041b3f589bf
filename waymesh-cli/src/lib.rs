//! Command-line interface for waymesh's batch tooling.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;

mod error;
mod join;
mod network;
mod route;

pub use error::CliError;

use join::{JoinArgs, run_join};
use network::{NetworkArgs, run_network};
use route::{RouteArgs, run_route};

const ARG_JOIN_FEATURES: &str = "features";
const ARG_JOIN_FOOTWAYS: &str = "footways";
const ARG_JOIN_CROSSING_NODES: &str = "crossing-nodes";
const ARG_JOIN_CYCLEWAYS: &str = "cycleways";
const ARG_JOIN_CROSSING_WAYS: &str = "crossing-ways";
const ARG_JOIN_STREET_NODES: &str = "street-nodes";
const ARG_JOIN_OUTPUT_DIR: &str = "output-dir";

const ARG_NETWORK_INPUT: &str = "network";
const ARG_NETWORK_SNAPSHOT: &str = "snapshot";
const ARG_NETWORK_SECTIONS: &str = "sections";
const ENV_NETWORK_INPUT: &str = "WAYMESH_CMDS_NETWORK_NETWORK";
const ENV_NETWORK_SNAPSHOT: &str = "WAYMESH_CMDS_NETWORK_SNAPSHOT";

const ARG_ROUTE_NETWORK: &str = "network";
const ARG_ROUTE_SNAPSHOT: &str = "snapshot";
const ARG_ROUTE_POIS: &str = "pois";
const ARG_ROUTE_SOURCE: &str = "source";
const ARG_ROUTE_TARGET: &str = "target";
const ARG_ROUTE_METRIC: &str = "metric";
const ENV_ROUTE_NETWORK: &str = "WAYMESH_CMDS_ROUTE_NETWORK";
const ENV_ROUTE_POIS: &str = "WAYMESH_CMDS_ROUTE_POIS";
const ENV_ROUTE_SOURCE: &str = "WAYMESH_CMDS_ROUTE_SOURCE";
const ENV_ROUTE_TARGET: &str = "WAYMESH_CMDS_ROUTE_TARGET";

/// Run the waymesh CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration layering, input
/// loading or output writing fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Join(args) => run_join(args),
        Command::Network(args) => run_network(args),
        Command::Route(args) => run_route(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waymesh",
    about = "Build and query multi-modal street networks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Link footways, cycleways, crossings and street nodes by proximity.
    Join(JoinArgs),
    /// Augment a road network and persist it as a snapshot.
    Network(NetworkArgs),
    /// Route between two points of interest.
    Route(RouteArgs),
}

/// Check that `path` names an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match waymesh_data::fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Pretty-print `value` as JSON followed by a newline.
fn write_output<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
