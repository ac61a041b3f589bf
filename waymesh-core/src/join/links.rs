//! Typed relationships derived from adjacency records.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{AdjacencyRecord, JoinPass};
use crate::{FeatureId, FeatureKind};

/// Relationship carried by a [`Link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum LinkKind {
    /// Crossing node and the footway it lets pedestrians cross to.
    CrossTheRoad,
    /// From a footway onto a bike lane it touches.
    ContinueOnLane,
    /// From a bike lane onto a footway it touches.
    ContinueOnFootway,
    /// Street node lying on a cycleway, footway or crossing way.
    OnPath,
}

/// One end of a [`Link`]. Ids are only unique within a feature family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkEnd {
    /// Family of the feature.
    pub kind: FeatureKind,
    /// Feature id within its family.
    pub id: FeatureId,
}

/// Directed, typed relationship between two features.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Link {
    /// Origin of the relationship.
    pub from: LinkEnd,
    /// Destination of the relationship.
    pub to: LinkEnd,
    /// Relationship type.
    pub kind: LinkKind,
}

/// De-duplicated set of links. Every relationship is stored in both
/// directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    links: BTreeSet<Link>,
}

impl LinkSet {
    /// Add the links implied by `record`, produced by `pass`.
    pub fn extend_from(&mut self, pass: JoinPass, record: &AdjacencyRecord) {
        let (forward, backward) = kinds_for(pass);
        for (source, found) in record.iter() {
            let from = LinkEnd {
                kind: pass.source_kind(),
                id: source.clone(),
            };
            for neighbour in found {
                let to = LinkEnd {
                    kind: pass.target_kind(),
                    id: neighbour.id.clone(),
                };
                if from == to {
                    continue;
                }
                self.links.insert(Link {
                    from: from.clone(),
                    to: to.clone(),
                    kind: forward,
                });
                self.links.insert(Link {
                    from: to,
                    to: from.clone(),
                    kind: backward,
                });
            }
        }
    }

    /// Whether `from` has a link of `kind` to `to`.
    #[must_use]
    pub fn contains(&self, from: &LinkEnd, to: &LinkEnd, kind: LinkKind) -> bool {
        self.links.contains(&Link {
            from: from.clone(),
            to: to.clone(),
            kind,
        })
    }

    /// Iterate over links in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Number of directed links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the set holds no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

const fn kinds_for(pass: JoinPass) -> (LinkKind, LinkKind) {
    match pass {
        JoinPass::CrossingNodesToFootways => (LinkKind::CrossTheRoad, LinkKind::CrossTheRoad),
        JoinPass::FootwaysTouchingLanes => (LinkKind::ContinueOnLane, LinkKind::ContinueOnFootway),
        JoinPass::CyclewaysToStreetNodes
        | JoinPass::FootwaysToStreetNodes
        | JoinPass::CrossingWaysToStreetNodes => (LinkKind::OnPath, LinkKind::OnPath),
    }
}
