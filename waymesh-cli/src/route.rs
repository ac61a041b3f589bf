//! Route command: bind POIs to a network and route between two of them.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waymesh_core::{
    Augmenter, CandidateResolver, Metric, PoiBinder, PoiId, RouteOutcome, Router, RoutingNetwork,
    load_network_snapshot,
};
use waymesh_data::{read_network, read_pois};

use crate::{
    ARG_ROUTE_METRIC, ARG_ROUTE_NETWORK, ARG_ROUTE_POIS, ARG_ROUTE_SNAPSHOT, ARG_ROUTE_SOURCE,
    ARG_ROUTE_TARGET, CliError, ENV_ROUTE_NETWORK, ENV_ROUTE_POIS, ENV_ROUTE_SOURCE,
    ENV_ROUTE_TARGET, require_existing, write_output,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Bind every point of interest to its nearest junctions, \
                 then find the cheapest path between two of them. The \
                 network comes from a JSON file or from a snapshot written \
                 by the network command.",
    about = "Route between two points of interest"
)]
#[ortho_config(prefix = "WAYMESH")]
pub(crate) struct RouteArgs {
    /// Road network JSON file, augmented on load.
    #[arg(long = ARG_ROUTE_NETWORK, value_name = "path")]
    #[serde(default)]
    pub(crate) network: Option<Utf8PathBuf>,
    /// Network snapshot written by `waymesh network`.
    #[arg(long = ARG_ROUTE_SNAPSHOT, value_name = "path")]
    #[serde(default)]
    pub(crate) snapshot: Option<Utf8PathBuf>,
    /// Overpass-style POI export.
    #[arg(long = ARG_ROUTE_POIS, value_name = "path")]
    #[serde(default)]
    pub(crate) pois: Option<Utf8PathBuf>,
    /// Id of the origin POI.
    #[arg(long = ARG_ROUTE_SOURCE, value_name = "id")]
    #[serde(default)]
    pub(crate) source: Option<PoiId>,
    /// Id of the destination POI.
    #[arg(long = ARG_ROUTE_TARGET, value_name = "id")]
    #[serde(default)]
    pub(crate) target: Option<PoiId>,
    /// Path cost: `distance` (default), `hops` or `traffic`.
    #[arg(long = ARG_ROUTE_METRIC, value_name = "metric")]
    #[serde(default)]
    pub(crate) metric: Option<String>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Where the routing network comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NetworkSource {
    /// JSON road network, augmented after loading.
    Json(Utf8PathBuf),
    /// Pre-augmented binary snapshot.
    Snapshot(Utf8PathBuf),
}

impl NetworkSource {
    fn path(&self) -> (&Utf8Path, &'static str) {
        match self {
            Self::Json(path) => (path, ARG_ROUTE_NETWORK),
            Self::Snapshot(path) => (path, ARG_ROUTE_SNAPSHOT),
        }
    }

    fn load(&self) -> Result<RoutingNetwork, CliError> {
        match self {
            Self::Json(path) => {
                let loaded = read_network(path)?;
                Ok(Augmenter::default().augment(loaded.roads).network)
            }
            Self::Snapshot(path) => Ok(load_network_snapshot(path.as_std_path())?),
        }
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteConfig {
    pub(crate) network: NetworkSource,
    pub(crate) pois: Utf8PathBuf,
    pub(crate) source: PoiId,
    pub(crate) target: PoiId,
    pub(crate) metric: Metric,
}

impl RouteConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let (network, field) = self.network.path();
        require_existing(network, field)?;
        require_existing(&self.pois, ARG_ROUTE_POIS)?;
        Ok(())
    }
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let network = match (args.network, args.snapshot) {
            (Some(_), Some(_)) => {
                return Err(CliError::ConflictingArguments {
                    first: ARG_ROUTE_NETWORK,
                    second: ARG_ROUTE_SNAPSHOT,
                });
            }
            (Some(path), None) => NetworkSource::Json(path),
            (None, Some(path)) => NetworkSource::Snapshot(path),
            (None, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_ROUTE_NETWORK,
                    env: ENV_ROUTE_NETWORK,
                });
            }
        };
        let pois = args.pois.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_POIS,
            env: ENV_ROUTE_POIS,
        })?;
        let source = args.source.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_SOURCE,
            env: ENV_ROUTE_SOURCE,
        })?;
        let target = args.target.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_TARGET,
            env: ENV_ROUTE_TARGET,
        })?;
        let metric = match args.metric {
            Some(name) => name.parse()?,
            None => Metric::default(),
        };
        Ok(Self {
            network,
            pois,
            source,
            target,
            metric,
        })
    }
}

pub(super) fn run_route(args: RouteArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_route_with(args, &mut stdout)
}

pub(super) fn run_route_with(args: RouteArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let outcome = execute_route(&config)?;
    write_output(writer, &outcome)
}

fn execute_route(config: &RouteConfig) -> Result<RouteOutcome, CliError> {
    let network = config.network.load()?;
    let pois = read_pois(&config.pois)?;
    let router = Router::bind(
        &network,
        &pois.pois,
        PoiBinder::default(),
        CandidateResolver::default(),
    );
    debug!(
        "routing {} -> {} by {}",
        config.source, config.target, config.metric
    );
    Ok(router.route(config.source, config.target, config.metric)?)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
