//! Running every join pass over classified feature families.

use std::collections::BTreeMap;

use log::info;
use waymesh_core::{AdjacencyRecord, FeatureKind, JoinError, JoinPass, LinkSet, SpatialJoin};

use crate::tags::FeatureFamilies;

/// Records and links produced by [`run_passes`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinOutput {
    /// One record per pass.
    pub records: BTreeMap<JoinPass, AdjacencyRecord>,
    /// Typed links accumulated over all passes.
    pub links: LinkSet,
}

impl JoinOutput {
    /// Records to attach to the features of `kind`, in pass order.
    #[must_use]
    pub fn annotations(&self, kind: FeatureKind) -> Vec<(JoinPass, &AdjacencyRecord)> {
        JoinPass::ALL
            .into_iter()
            .filter(|pass| pass.source_kind() == kind)
            .filter_map(|pass| self.records.get(&pass).map(|record| (pass, record)))
            .collect()
    }
}

/// Run [`JoinPass::ALL`] over `families`.
///
/// A pass whose source or target family is empty still runs and yields a
/// record with empty entries.
///
/// # Errors
///
/// Propagates [`JoinError`] from the first failing pass.
pub fn run_passes(join: &SpatialJoin, families: &FeatureFamilies) -> Result<JoinOutput, JoinError> {
    let mut output = JoinOutput::default();
    for pass in JoinPass::ALL {
        let record = pass.run(
            join,
            families.get(pass.source_kind()),
            families.get(pass.target_kind()),
        )?;
        output.links.extend_from(pass, &record);
        output.records.insert(pass, record);
    }
    info!("join passes produced {} links", output.links.len());
    Ok(output)
}
