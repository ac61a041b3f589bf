//! Network command: augment a road network and persist the result.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waymesh_core::{Augmenter, write_network_snapshot};
use waymesh_data::fs::ensure_parent_dir;
use waymesh_data::{read_network, write_sections};

use crate::{
    ARG_NETWORK_INPUT, ARG_NETWORK_SECTIONS, ARG_NETWORK_SNAPSHOT, CliError, ENV_NETWORK_INPUT,
    ENV_NETWORK_SNAPSHOT, require_existing, write_output,
};

/// CLI arguments for the `network` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load a road network, close it under edge reversal, derive \
                 junction driveability and the street-section graph, then \
                 write a binary snapshot for the route command.",
    about = "Augment a road network"
)]
#[ortho_config(prefix = "WAYMESH")]
pub(crate) struct NetworkArgs {
    /// Road network JSON file.
    #[arg(long = ARG_NETWORK_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) network: Option<Utf8PathBuf>,
    /// Destination of the binary network snapshot.
    #[arg(long = ARG_NETWORK_SNAPSHOT, value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot: Option<Utf8PathBuf>,
    /// Optional destination of the street-section graph as JSON.
    #[arg(long = ARG_NETWORK_SECTIONS, value_name = "path")]
    #[serde(default)]
    pub(crate) sections: Option<Utf8PathBuf>,
}

impl NetworkArgs {
    pub(crate) fn into_config(self) -> Result<NetworkConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NetworkConfig::try_from(merged)
    }
}

/// Resolved `network` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NetworkConfig {
    pub(crate) network: Utf8PathBuf,
    pub(crate) snapshot: Utf8PathBuf,
    pub(crate) sections: Option<Utf8PathBuf>,
}

impl TryFrom<NetworkArgs> for NetworkConfig {
    type Error = CliError;

    fn try_from(args: NetworkArgs) -> Result<Self, Self::Error> {
        let network = args.network.ok_or(CliError::MissingArgument {
            field: ARG_NETWORK_INPUT,
            env: ENV_NETWORK_INPUT,
        })?;
        let snapshot = args.snapshot.ok_or(CliError::MissingArgument {
            field: ARG_NETWORK_SNAPSHOT,
            env: ENV_NETWORK_SNAPSHOT,
        })?;
        Ok(Self {
            network,
            snapshot,
            sections: args.sections,
        })
    }
}

/// Summary printed once the `network` command finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NetworkSummary {
    pub(crate) junctions: usize,
    pub(crate) input_edges: usize,
    pub(crate) reverse_edges: usize,
    pub(crate) driveable_junctions: usize,
    pub(crate) invalid_flags: usize,
    pub(crate) sections: usize,
    pub(crate) section_connections: usize,
    pub(crate) skipped_junctions: usize,
    pub(crate) skipped_edges: usize,
    pub(crate) snapshot: Utf8PathBuf,
}

pub(super) fn run_network(args: NetworkArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_network_with(args, &mut stdout)
}

pub(super) fn run_network_with(args: NetworkArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.network, ARG_NETWORK_INPUT)?;
    let summary = execute_network(&config)?;
    write_output(writer, &summary)
}

fn execute_network(config: &NetworkConfig) -> Result<NetworkSummary, CliError> {
    let loaded = read_network(&config.network)?;
    let augmented = Augmenter::default().augment(loaded.roads);
    let report = augmented.report;

    ensure_parent_dir(&config.snapshot).map_err(|source| CliError::CreateOutputDirectory {
        path: config.snapshot.clone(),
        source,
    })?;
    write_network_snapshot(config.snapshot.as_std_path(), &augmented.network)?;
    if let Some(sections) = &config.sections {
        write_sections(sections, augmented.network.sections())?;
    }

    Ok(NetworkSummary {
        junctions: report.junctions,
        input_edges: report.input_edges,
        reverse_edges: report.reverse_edges,
        driveable_junctions: report.driveable_junctions,
        invalid_flags: report.invalid_flags,
        sections: report.sections,
        section_connections: report.section_connections,
        skipped_junctions: loaded.report.skipped_junctions,
        skipped_edges: loaded.report.skipped_edges,
        snapshot: config.snapshot.clone(),
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<NetworkConfig, CliError> {
    let merged = NetworkArgs::merge_from_layers(layers).map_err(CliError::from)?;
    NetworkConfig::try_from(merged)
}
