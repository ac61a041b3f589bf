//! The road network: raw graph, augmented routing network and its dual graph.
//!
//! [`RoadGraph`] is the mutable, as-loaded graph. The
//! [`Augmenter`](crate::Augmenter) turns it into a [`RoutingNetwork`], which is
//! immutable and carries the indices needed for snapping and path search.

mod builder;
mod sections;

use std::collections::HashMap;

use geo::Coord;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{PlanarFrame, Projection};

pub use builder::{EdgeInput, FlagValue, JunctionInput, NetworkError, RawEdge, RoadGraph};
pub use sections::{RoadSection, RoadSectionGraph, SharedJunction};

/// Identifier of a road junction.
pub type JunctionId = u64;

type JunctionPoint = GeomWithData<[f64; 2], JunctionId>;

/// Whether a route edge may be traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum EdgeStatus {
    /// Open to traffic.
    Active,
    /// Closed; ignored by routing and by the dual graph.
    Inactive,
}

/// Intersection or endpoint of the road network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoadJunction {
    /// Junction id.
    pub id: JunctionId,
    /// Location (`x = lon`, `y = lat`).
    pub location: Coord<f64>,
    /// Whether any incident edge is driveable.
    pub driveable: bool,
}

/// Directed edge of the routing network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteEdge {
    /// Length in metres.
    pub distance: f64,
    /// Annual average daily traffic.
    pub traffic_volume: f64,
    /// Street the edge belongs to.
    pub street_id: String,
    /// Whether the edge may be traversed.
    pub status: EdgeStatus,
    /// Canonical driveability.
    pub driveable: bool,
    /// Street name.
    pub name: Option<String>,
}

impl RouteEdge {
    /// Whether routing may use this edge.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EdgeStatus::Active
    }
}

/// Which junctions a nearest-neighbour lookup considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionClass {
    /// Junctions with at least one driveable incident edge.
    Driveable,
    /// All other junctions.
    NonDriveable,
}

/// Observed range of one edge attribute.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spread {
    /// Smallest value seen.
    pub min: f64,
    /// Largest value seen.
    pub max: f64,
}

impl Spread {
    fn of(values: impl IntoIterator<Item = f64>) -> Self {
        values
            .into_iter()
            .fold(None, |acc: Option<Self>, v| {
                Some(acc.map_or(Self { min: v, max: v }, |s| Self {
                    min: s.min.min(v),
                    max: s.max.max(v),
                }))
            })
            .unwrap_or_default()
    }

    /// Min-max normalise `value`; a degenerate spread maps everything to 0.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width > 0.0 {
            (value - self.min) / width
        } else {
            0.0
        }
    }
}

/// Ranges of the edge attributes used by the traffic metric, taken over every
/// route edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeStatistics {
    /// Edge lengths.
    pub distance: Spread,
    /// Edge traffic volumes.
    pub traffic_volume: Spread,
}

/// Augmented, immutable road network.
#[derive(Debug, Clone)]
pub struct RoutingNetwork {
    graph: DiGraph<RoadJunction, RouteEdge>,
    index: HashMap<JunctionId, NodeIndex>,
    sections: RoadSectionGraph,
    frame: PlanarFrame,
    driveable: RTree<JunctionPoint>,
    non_driveable: RTree<JunctionPoint>,
    statistics: EdgeStatistics,
}

impl RoutingNetwork {
    /// Wrap an augmented graph and derive the dual graph and indices.
    pub(crate) fn assemble(
        graph: DiGraph<RoadJunction, RouteEdge>,
        index: HashMap<JunctionId, NodeIndex>,
        frame: PlanarFrame,
    ) -> Self {
        let sections = RoadSectionGraph::from_roads(&graph);
        let (driveable, non_driveable): (Vec<_>, Vec<_>) = graph
            .node_weights()
            .map(|junction| {
                let planar = frame.project(junction.location);
                (junction.driveable, JunctionPoint::new([planar.x, planar.y], junction.id))
            })
            .partition(|(driveable, _)| *driveable);
        let statistics = EdgeStatistics {
            distance: Spread::of(graph.edge_weights().map(|e| e.distance)),
            traffic_volume: Spread::of(graph.edge_weights().map(|e| e.traffic_volume)),
        };
        Self {
            graph,
            index,
            sections,
            frame,
            driveable: RTree::bulk_load(driveable.into_iter().map(|(_, p)| p).collect()),
            non_driveable: RTree::bulk_load(non_driveable.into_iter().map(|(_, p)| p).collect()),
            statistics,
        }
    }

    /// Rebuild a network from previously augmented junctions and edges.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] when junction ids repeat or an edge references
    /// an unknown junction.
    pub fn from_parts(
        junctions: Vec<RoadJunction>,
        edges: Vec<(JunctionId, JunctionId, RouteEdge)>,
        frame: PlanarFrame,
    ) -> Result<Self, NetworkError> {
        let mut graph = DiGraph::with_capacity(junctions.len(), edges.len());
        let mut index = HashMap::with_capacity(junctions.len());
        for junction in junctions {
            let id = junction.id;
            if index.contains_key(&id) {
                return Err(NetworkError::DuplicateJunction { id });
            }
            index.insert(id, graph.add_node(junction));
        }
        for (from, to, edge) in edges {
            let lookup = |missing: JunctionId| {
                index
                    .get(&missing)
                    .copied()
                    .ok_or(NetworkError::UnknownJunction { from, to, missing })
            };
            let (a, b) = (lookup(from)?, lookup(to)?);
            graph.add_edge(a, b, edge);
        }
        Ok(Self::assemble(graph, index, frame))
    }

    /// Junction by id.
    #[must_use]
    pub fn junction(&self, id: JunctionId) -> Option<&RoadJunction> {
        self.node(id).and_then(|node| self.graph.node_weight(node))
    }

    /// All junctions, in insertion order.
    pub fn junctions(&self) -> impl Iterator<Item = &RoadJunction> {
        self.graph.node_weights()
    }

    /// All directed edges as `(from, to, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (JunctionId, JunctionId, &RouteEdge)> {
        self.graph.edge_references().filter_map(|edge| {
            let from = self.graph.node_weight(edge.source())?.id;
            let to = self.graph.node_weight(edge.target())?.id;
            Some((from, to, edge.weight()))
        })
    }

    /// Edges leaving `id`.
    pub fn outgoing(&self, id: JunctionId) -> impl Iterator<Item = (JunctionId, &RouteEdge)> {
        self.incident(id, Direction::Outgoing)
    }

    /// Edges arriving at `id`.
    pub fn incoming(&self, id: JunctionId) -> impl Iterator<Item = (JunctionId, &RouteEdge)> {
        self.incident(id, Direction::Incoming)
    }

    fn incident(
        &self,
        id: JunctionId,
        direction: Direction,
    ) -> impl Iterator<Item = (JunctionId, &RouteEdge)> {
        self.node(id)
            .into_iter()
            .flat_map(move |node| self.graph.edges_directed(node, direction))
            .filter_map(move |edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                Some((self.graph.node_weight(other)?.id, edge.weight()))
            })
    }

    /// Whether `id` has at least one active edge leaving it.
    #[must_use]
    pub fn has_outgoing_active(&self, id: JunctionId) -> bool {
        self.outgoing(id).any(|(_, edge)| edge.is_active())
    }

    /// Whether `id` has at least one active edge arriving at it.
    #[must_use]
    pub fn has_incoming_active(&self, id: JunctionId) -> bool {
        self.incoming(id).any(|(_, edge)| edge.is_active())
    }

    /// Number of junctions.
    #[must_use]
    pub fn junction_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether any junction is driveable.
    #[must_use]
    pub fn has_driveable_junctions(&self) -> bool {
        self.driveable.size() > 0
    }

    /// Dual graph of street sections.
    #[must_use]
    pub const fn sections(&self) -> &RoadSectionGraph {
        &self.sections
    }

    /// Planar frame used for snapping.
    #[must_use]
    pub const fn frame(&self) -> PlanarFrame {
        self.frame
    }

    /// Edge attribute ranges.
    #[must_use]
    pub const fn statistics(&self) -> &EdgeStatistics {
        &self.statistics
    }

    /// Nearest junction of `class` to `location` (`x = lon`, `y = lat`).
    ///
    /// Returns the junction id and planar distance in metres. Equidistant
    /// junctions resolve to the lowest id. With `max_distance`, only
    /// junctions strictly closer than it are considered. A location that does
    /// not project to finite planar coordinates has no nearest junction.
    #[must_use]
    pub fn nearest_junction(
        &self,
        location: Coord<f64>,
        class: JunctionClass,
        max_distance: Option<f64>,
    ) -> Option<(JunctionId, f64)> {
        let tree = match class {
            JunctionClass::Driveable => &self.driveable,
            JunctionClass::NonDriveable => &self.non_driveable,
        };
        let planar = self.frame.project(location);
        if !(planar.x.is_finite() && planar.y.is_finite()) {
            return None;
        }
        let mut hits = tree.nearest_neighbor_iter_with_distance_2(&[planar.x, planar.y]);
        let (first, best) = hits.next()?;
        let id = hits
            .take_while(|(_, d2)| *d2 == best)
            .map(|(point, _)| point.data)
            .fold(first.data, JunctionId::min);
        let distance = best.sqrt();
        match max_distance {
            Some(limit) if distance >= limit => None,
            _ => Some((id, distance)),
        }
    }

    pub(crate) fn node(&self, id: JunctionId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub(crate) const fn graph(&self) -> &DiGraph<RoadJunction, RouteEdge> {
        &self.graph
    }
}
