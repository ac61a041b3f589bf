//! Dual graph of street sections.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use geo::Coord;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{JunctionId, RoadJunction, RouteEdge};

/// A street, aggregated over its active edges.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoadSection {
    /// Street id shared by the aggregated edges.
    pub street_id: String,
    /// Mean traffic volume over the edges.
    pub traffic_volume: f64,
    /// Summed edge length in metres.
    pub distance: f64,
    /// Mean traffic per metre; 0 for a zero-length street.
    pub traffic_density: f64,
    /// First street name seen.
    pub name: Option<String>,
}

/// Connection between two sections through a junction they share.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SharedJunction {
    /// The shared junction.
    pub junction: JunctionId,
    /// Its location (`x = lon`, `y = lat`).
    pub location: Coord<f64>,
}

/// Directed dual graph: one node per street, one edge per ordered pair of
/// streets meeting at a junction.
#[derive(Debug, Clone, Default)]
pub struct RoadSectionGraph {
    graph: DiGraph<RoadSection, SharedJunction>,
    index: HashMap<String, NodeIndex>,
}

#[derive(Default)]
struct Accumulator {
    distance: f64,
    traffic: f64,
    edges: u32,
    name: Option<String>,
}

impl RoadSectionGraph {
    /// Build the dual graph from the active edges of `roads`.
    pub(crate) fn from_roads(roads: &DiGraph<RoadJunction, RouteEdge>) -> Self {
        let mut totals: BTreeMap<&str, Accumulator> = BTreeMap::new();
        for edge in roads.edge_references().filter(|e| e.weight().is_active()) {
            let weight = edge.weight();
            let acc = totals.entry(weight.street_id.as_str()).or_default();
            acc.distance += weight.distance;
            acc.traffic += weight.traffic_volume;
            acc.edges += 1;
            if acc.name.is_none() {
                acc.name.clone_from(&weight.name);
            }
        }

        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for (street, acc) in totals {
            let traffic_volume = acc.traffic / f64::from(acc.edges.max(1));
            let traffic_density = if acc.distance > 0.0 {
                traffic_volume / acc.distance
            } else {
                0.0
            };
            let node = graph.add_node(RoadSection {
                street_id: street.to_owned(),
                traffic_volume,
                distance: acc.distance,
                traffic_density,
                name: acc.name,
            });
            index.insert(street.to_owned(), node);
        }

        for junction in roads.node_indices() {
            let Some(location) = roads.node_weight(junction) else {
                continue;
            };
            let streets_at = |direction: Direction| {
                roads
                    .edges_directed(junction, direction)
                    .filter(|e| e.weight().is_active())
                    .map(|e| e.weight().street_id.as_str())
                    .collect::<BTreeSet<_>>()
            };
            let arriving = streets_at(Direction::Incoming);
            let leaving = streets_at(Direction::Outgoing);
            for from in &arriving {
                for to in leaving.iter().filter(|to| *to != from) {
                    if let (Some(&a), Some(&b)) = (index.get(*from), index.get(*to)) {
                        graph.add_edge(
                            a,
                            b,
                            SharedJunction {
                                junction: location.id,
                                location: location.location,
                            },
                        );
                    }
                }
            }
        }
        Self { graph, index }
    }

    /// Section for `street_id`.
    #[must_use]
    pub fn section(&self, street_id: &str) -> Option<&RoadSection> {
        self.index
            .get(street_id)
            .and_then(|node| self.graph.node_weight(*node))
    }

    /// Sections in street id order.
    pub fn sections(&self) -> impl Iterator<Item = &RoadSection> {
        self.graph.node_weights()
    }

    /// `(from street, to street, shared junction)` triples.
    pub fn connections(&self) -> impl Iterator<Item = (&str, &str, &SharedJunction)> {
        self.graph.edge_references().filter_map(|edge| {
            let from = self.graph.node_weight(edge.source())?;
            let to = self.graph.node_weight(edge.target())?;
            Some((from.street_id.as_str(), to.street_id.as_str(), edge.weight()))
        })
    }

    /// Whether `from` connects to `to` at `junction`.
    #[must_use]
    pub fn connects(&self, from: &str, to: &str, junction: JunctionId) -> bool {
        self.connections()
            .any(|(a, b, shared)| a == from && b == to && shared.junction == junction)
    }

    /// Number of sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }
}
