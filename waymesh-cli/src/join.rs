//! Join command: proximity passes over footways, cycleways, crossings and
//! street nodes.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waymesh_core::{FeatureKind, SpatialJoin};
use waymesh_data::fs::{dir_is_dir, ensure_dir};
use waymesh_data::{FeatureFamilies, read_features, run_passes, write_annotated, write_json};

use crate::{
    ARG_JOIN_CROSSING_NODES, ARG_JOIN_CROSSING_WAYS, ARG_JOIN_CYCLEWAYS, ARG_JOIN_FEATURES,
    ARG_JOIN_FOOTWAYS, ARG_JOIN_OUTPUT_DIR, ARG_JOIN_STREET_NODES, CliError, require_existing,
    write_output,
};

/// Families that receive join annotations, with their output file names.
const ANNOTATED_FAMILIES: [(FeatureKind, &str); 4] = [
    (FeatureKind::CrossingNode, "crossing_nodes.json"),
    (FeatureKind::Cycleway, "cycleways.json"),
    (FeatureKind::Footway, "footways.json"),
    (FeatureKind::CrossingWay, "crossing_ways.json"),
];
const LINKS_FILE: &str = "links.json";

/// CLI arguments for the `join` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run every proximity pass over the given feature files and \
                 write each family back with the ids of the features it \
                 touches. Per-family files are taken as they are; a mixed \
                 --features file is split by tags.",
    about = "Link features by proximity"
)]
#[ortho_config(prefix = "WAYMESH")]
pub(crate) struct JoinArgs {
    /// Feature file mixing several families, classified by tags.
    #[arg(long = ARG_JOIN_FEATURES, value_name = "path")]
    #[serde(default)]
    pub(crate) features: Option<Utf8PathBuf>,
    /// Footway features.
    #[arg(long = ARG_JOIN_FOOTWAYS, value_name = "path")]
    #[serde(default)]
    pub(crate) footways: Option<Utf8PathBuf>,
    /// Crossings mapped as nodes.
    #[arg(long = ARG_JOIN_CROSSING_NODES, value_name = "path")]
    #[serde(default)]
    pub(crate) crossing_nodes: Option<Utf8PathBuf>,
    /// Cycleway features.
    #[arg(long = ARG_JOIN_CYCLEWAYS, value_name = "path")]
    #[serde(default)]
    pub(crate) cycleways: Option<Utf8PathBuf>,
    /// Crossings mapped as ways.
    #[arg(long = ARG_JOIN_CROSSING_WAYS, value_name = "path")]
    #[serde(default)]
    pub(crate) crossing_ways: Option<Utf8PathBuf>,
    /// Street network nodes.
    #[arg(long = ARG_JOIN_STREET_NODES, value_name = "path")]
    #[serde(default)]
    pub(crate) street_nodes: Option<Utf8PathBuf>,
    /// Directory receiving the annotated files (defaults to `.`).
    #[arg(long = ARG_JOIN_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
}

impl JoinArgs {
    pub(crate) fn into_config(self) -> Result<JoinConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        JoinConfig::try_from(merged)
    }
}

/// One feature file and the family its features are assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JoinInput {
    /// Flag the path came from.
    pub(crate) field: &'static str,
    /// Target family, or `None` to classify by tags.
    pub(crate) kind: Option<FeatureKind>,
    /// File location.
    pub(crate) path: Utf8PathBuf,
}

/// Resolved `join` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JoinConfig {
    pub(crate) inputs: Vec<JoinInput>,
    pub(crate) output_dir: Utf8PathBuf,
}

impl JoinConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        for input in &self.inputs {
            require_existing(&input.path, input.field)?;
        }
        match dir_is_dir(&self.output_dir) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::OutputDirectoryNotDirectory {
                path: self.output_dir.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_JOIN_OUTPUT_DIR,
                path: self.output_dir.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<JoinArgs> for JoinConfig {
    type Error = CliError;

    fn try_from(args: JoinArgs) -> Result<Self, Self::Error> {
        let candidates = [
            (ARG_JOIN_FEATURES, None, args.features),
            (ARG_JOIN_FOOTWAYS, Some(FeatureKind::Footway), args.footways),
            (
                ARG_JOIN_CROSSING_NODES,
                Some(FeatureKind::CrossingNode),
                args.crossing_nodes,
            ),
            (ARG_JOIN_CYCLEWAYS, Some(FeatureKind::Cycleway), args.cycleways),
            (
                ARG_JOIN_CROSSING_WAYS,
                Some(FeatureKind::CrossingWay),
                args.crossing_ways,
            ),
            (
                ARG_JOIN_STREET_NODES,
                Some(FeatureKind::StreetNode),
                args.street_nodes,
            ),
        ];
        let inputs: Vec<JoinInput> = candidates
            .into_iter()
            .filter_map(|(field, kind, path)| Some(JoinInput { field, kind, path: path? }))
            .collect();
        if inputs.is_empty() {
            return Err(CliError::NoFeatureInputs);
        }
        let output_dir = args.output_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        Ok(Self { inputs, output_dir })
    }
}

/// A file written by the `join` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WrittenFile {
    pub(crate) kind: FeatureKind,
    pub(crate) path: Utf8PathBuf,
    pub(crate) features: usize,
}

/// Summary printed once the `join` command finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct JoinSummary {
    pub(crate) written: Vec<WrittenFile>,
    pub(crate) links: usize,
    pub(crate) unclassified: usize,
    pub(crate) skipped_records: usize,
}

pub(super) fn run_join(args: JoinArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_join_with(args, &mut stdout)
}

pub(super) fn run_join_with(args: JoinArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let summary = execute_join(&config)?;
    write_output(writer, &summary)
}

pub(super) fn execute_join(config: &JoinConfig) -> Result<JoinSummary, CliError> {
    let (families, skipped_records) = load_families(&config.inputs)?;
    let output = run_passes(&SpatialJoin::default(), &families)?;

    ensure_dir(&config.output_dir).map_err(|source| CliError::CreateOutputDirectory {
        path: config.output_dir.clone(),
        source,
    })?;
    let mut written = Vec::new();
    for (kind, file_name) in ANNOTATED_FAMILIES {
        let features = families.get(kind);
        if features.is_empty() {
            continue;
        }
        let path = config.output_dir.join(file_name);
        write_annotated(&path, features, &output.annotations(kind))?;
        written.push(WrittenFile {
            kind,
            path,
            features: features.len(),
        });
    }
    let links: Vec<_> = output.links.iter().collect();
    write_json(&config.output_dir.join(LINKS_FILE), &links)?;
    info!(
        "wrote {} annotated files and {} links to {}",
        written.len(),
        links.len(),
        config.output_dir
    );

    Ok(JoinSummary {
        written,
        links: links.len(),
        unclassified: families.unclassified,
        skipped_records,
    })
}

fn load_families(inputs: &[JoinInput]) -> Result<(FeatureFamilies, usize), CliError> {
    let mut families = FeatureFamilies::default();
    let mut skipped = 0;
    for input in inputs {
        let document = read_features(&input.path)?;
        skipped += document.report.skipped;
        match input.kind {
            Some(kind) => families.extend(kind, document.features),
            None => {
                let unmatched = families.classify_into(document.features);
                info!("{}: {unmatched} features matched no family", input.path);
            }
        }
    }
    Ok((families, skipped))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<JoinConfig, CliError> {
    let merged = JoinArgs::merge_from_layers(layers).map_err(CliError::from)?;
    JoinConfig::try_from(merged)
}
