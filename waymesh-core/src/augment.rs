//! Augmentation of a raw road graph into a routing network.
//!
//! Three rules run over the raw graph: driveability flags are canonicalised
//! and pushed onto junctions, every edge gains a reverse twin, and the dual
//! graph of street sections is derived. All changes are planned against the
//! input and committed in one step, so the result never depends on the order
//! in which edges are visited.

use std::collections::HashSet;

use log::{info, warn};
use petgraph::visit::EdgeRef;

use crate::geometry::{ProjectionChoice, bounds_of_coords};
use crate::network::{FlagValue, RawEdge, RoadGraph, RouteEdge, RoutingNetwork};
use crate::{EdgeInput, JunctionInput};

/// Counters describing one augmentation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentReport {
    /// Junctions in the network.
    pub junctions: usize,
    /// Edges present before symmetrisation.
    pub input_edges: usize,
    /// Reverse edges created.
    pub reverse_edges: usize,
    /// Junctions marked driveable.
    pub driveable_junctions: usize,
    /// Driveability flags that were not a recognised spelling.
    pub invalid_flags: usize,
    /// Street sections in the dual graph.
    pub sections: usize,
    /// Directed connections between sections.
    pub section_connections: usize,
}

/// Result of [`Augmenter::augment`].
#[derive(Debug, Clone)]
pub struct Augmented {
    /// The routing network.
    pub network: RoutingNetwork,
    /// What changed.
    pub report: AugmentReport,
}

/// Turns a [`RoadGraph`] into a [`RoutingNetwork`].
///
/// # Examples
/// ```
/// use waymesh_core::{Augmenter, EdgeInput, EdgeStatus, FlagValue, JunctionInput, RoadGraph};
///
/// let mut roads = RoadGraph::new();
/// roads.add_junction(JunctionInput { id: 1, lat: 45.0, lon: 9.0 })?;
/// roads.add_junction(JunctionInput { id: 2, lat: 45.001, lon: 9.0 })?;
/// roads.add_edge(EdgeInput {
///     source: 1,
///     target: 2,
///     distance: 111.0,
///     traffic_volume: 40.0,
///     street_id: "via-roma".into(),
///     status: EdgeStatus::Active,
///     driveable: Some(FlagValue::Text("yes".into())),
///     name: None,
/// })?;
/// let augmented = Augmenter::default().augment(roads);
/// assert_eq!(augmented.report.reverse_edges, 1);
/// assert!(augmented.network.junction(2).is_some_and(|j| j.driveable));
/// # Ok::<(), waymesh_core::NetworkError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Augmenter {
    projection: ProjectionChoice,
}

impl Augmenter {
    /// Create an augmenter whose network snaps in the given planar frame.
    #[must_use]
    pub const fn new(projection: ProjectionChoice) -> Self {
        Self { projection }
    }

    /// Apply the augmentation rules and freeze the result.
    #[must_use]
    pub fn augment(&self, roads: RoadGraph) -> Augmented {
        let RoadGraph { graph: raw, index } = roads;
        let mut invalid_flags = 0;
        let mut graph = raw.map(
            |_, junction| {
                let mut junction = junction.clone();
                junction.driveable = false;
                junction
            },
            |_, edge| {
                let driveable = canonical_flag(edge, &mut invalid_flags);
                route_edge(edge, driveable)
            },
        );

        let driveable: HashSet<_> = graph
            .edge_references()
            .filter(|edge| edge.weight().driveable)
            .flat_map(|edge| [edge.source(), edge.target()])
            .collect();

        let mut planned = HashSet::new();
        let reverses: Vec<_> = graph
            .edge_references()
            .filter(|edge| edge.source() != edge.target())
            .filter(|edge| {
                !graph
                    .edges_connecting(edge.target(), edge.source())
                    .any(|twin| twin.weight().street_id == edge.weight().street_id)
            })
            .filter(|edge| {
                planned.insert((edge.target(), edge.source(), edge.weight().street_id.clone()))
            })
            .map(|edge| (edge.target(), edge.source(), edge.weight().clone()))
            .collect();

        let input_edges = graph.edge_count();
        for node in &driveable {
            if let Some(junction) = graph.node_weight_mut(*node) {
                junction.driveable = true;
            }
        }
        let reverse_edges = reverses.len();
        for (from, to, edge) in reverses {
            graph.add_edge(from, to, edge);
        }

        let bounds = bounds_of_coords(graph.node_weights().map(|junction| junction.location));
        let network = RoutingNetwork::assemble(graph, index, self.projection.frame_for(bounds));
        let report = AugmentReport {
            junctions: network.junction_count(),
            input_edges,
            reverse_edges,
            driveable_junctions: driveable.len(),
            invalid_flags,
            sections: network.sections().section_count(),
            section_connections: network.sections().connection_count(),
        };
        info!(
            "augmented {} junctions: {} reverse edges, {} driveable junctions, {} sections",
            report.junctions, report.reverse_edges, report.driveable_junctions, report.sections
        );
        Augmented { network, report }
    }
}

fn canonical_flag(edge: &RawEdge, invalid: &mut usize) -> bool {
    match edge.driveable.as_ref().map(FlagValue::to_bool) {
        None => false,
        Some(Some(flag)) => flag,
        Some(None) => {
            warn!(
                "street {}: unrecognised driveable flag {:?}, treating as not driveable",
                edge.street_id, edge.driveable
            );
            *invalid += 1;
            false
        }
    }
}

fn route_edge(edge: &RawEdge, driveable: bool) -> RouteEdge {
    RouteEdge {
        distance: edge.distance,
        traffic_volume: edge.traffic_volume,
        street_id: edge.street_id.clone(),
        status: edge.status,
        driveable,
        name: edge.name.clone(),
    }
}

impl From<&RoutingNetwork> for RoadGraph {
    /// Strip a routing network back to raw form, keeping every edge it holds.
    fn from(network: &RoutingNetwork) -> Self {
        let mut roads = Self::new();
        for junction in network.junctions() {
            let added = roads.add_junction(JunctionInput {
                id: junction.id,
                lat: junction.location.y,
                lon: junction.location.x,
            });
            if let Err(err) = added {
                warn!("dropping junction while unwrapping network: {err}");
            }
        }
        for (source, target, edge) in network.edges() {
            let added = roads.add_edge(EdgeInput {
                source,
                target,
                distance: edge.distance,
                traffic_volume: edge.traffic_volume,
                street_id: edge.street_id.clone(),
                status: edge.status,
                driveable: Some(FlagValue::Bool(edge.driveable)),
                name: edge.name.clone(),
            });
            if let Err(err) = added {
                warn!("dropping edge while unwrapping network: {err}");
            }
        }
        roads
    }
}
