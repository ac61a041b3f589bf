//! Shortest-path search over the routing network.

use std::fmt;
use std::str::FromStr;

use geo::Coord;
use log::debug;
use petgraph::algo::astar;
use petgraph::visit::EdgeFiltered;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::{EdgeStatistics, JunctionId, RouteEdge, RoutingNetwork};

/// Cost model applied to each traversed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Metric {
    /// Edge length in metres.
    #[default]
    Distance,
    /// One per edge.
    Hops,
    /// Equal blend of normalised traffic volume and normalised length.
    Traffic,
}

impl Metric {
    /// Cost of traversing `edge` under this metric.
    #[must_use]
    pub fn edge_cost(self, edge: &RouteEdge, statistics: &EdgeStatistics) -> f64 {
        match self {
            Self::Distance => edge.distance,
            Self::Hops => 1.0,
            Self::Traffic => {
                0.5 * statistics.traffic_volume.normalize(edge.traffic_volume)
                    + 0.5 * statistics.distance.normalize(edge.distance)
            }
        }
    }
}

/// Error returned when a metric name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown metric `{value}`; expected distance, hops or traffic")]
pub struct ParseMetricError {
    /// Rejected input.
    pub value: String,
}

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" | "d" => Ok(Self::Distance),
            "hops" | "h" => Ok(Self::Hops),
            "traffic" | "t" => Ok(Self::Traffic),
            _ => Err(ParseMetricError {
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "distance",
            Self::Hops => "hops",
            Self::Traffic => "traffic",
        })
    }
}

/// A shortest path between two junctions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathHit {
    /// Summed edge cost under the requested metric.
    pub cost: f64,
    /// Junctions visited, source first.
    pub junctions: Vec<JunctionId>,
    /// Junction locations in visiting order (`x = lon`, `y = lat`).
    pub coordinates: Vec<Coord<f64>>,
}

/// Errors raised by a path search backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The backend could not answer the query.
    #[error("path search backend unavailable: {reason}")]
    Unavailable {
        /// Backend-specific explanation.
        reason: String,
    },
}

/// Shortest-path capability over active edges.
pub trait PathSearch {
    /// Cheapest path from `source` to `target` under `metric`, or `None`
    /// when the target is unreachable or either junction is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the backend cannot answer.
    fn shortest_path(
        &self,
        source: JunctionId,
        target: JunctionId,
        metric: Metric,
    ) -> Result<Option<PathHit>, SearchError>;
}

impl PathSearch for RoutingNetwork {
    fn shortest_path(
        &self,
        source: JunctionId,
        target: JunctionId,
        metric: Metric,
    ) -> Result<Option<PathHit>, SearchError> {
        let (Some(start), Some(goal)) = (self.node(source), self.node(target)) else {
            debug!("no path {source} -> {target}: unknown junction");
            return Ok(None);
        };
        let statistics = *self.statistics();
        let active = EdgeFiltered::from_fn(self.graph(), |edge| edge.weight().is_active());
        let found = astar(
            &active,
            start,
            |node| node == goal,
            |edge| metric.edge_cost(edge.weight(), &statistics),
            |_| 0.0,
        );
        let Some((cost, nodes)) = found else {
            debug!("no path {source} -> {target} over active edges");
            return Ok(None);
        };
        let (junctions, coordinates) = nodes
            .into_iter()
            .filter_map(|node| self.graph().node_weight(node))
            .map(|junction| (junction.id, junction.location))
            .unzip();
        Ok(Some(PathHit {
            cost,
            junctions,
            coordinates,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeStatus;
    use crate::test_support::{NetworkFixture, edge};
    use rstest::{fixture, rstest};

    /// A short expensive street and a long cheap one between 1 and 3.
    #[fixture]
    fn fork() -> RoutingNetwork {
        NetworkFixture::new()
            .junction(1, 0.0, 0.0)
            .junction(2, 0.0, 0.001)
            .junction(3, 0.0, 0.002)
            .junction(4, 0.001, 0.001)
            .junction(5, 0.001, 0.0015)
            .edge(edge(1, 2, 100.0).traffic(900.0))
            .edge(edge(2, 3, 100.0).traffic(900.0))
            .edge(edge(1, 4, 110.0))
            .edge(edge(4, 5, 50.0))
            .edge(edge(5, 3, 50.0))
            .network()
    }

    #[rstest]
    #[case("distance", Metric::Distance)]
    #[case("H", Metric::Hops)]
    #[case("traffic", Metric::Traffic)]
    fn metric_parses(#[case] text: &str, #[case] expected: Metric) {
        assert_eq!(text.parse::<Metric>(), Ok(expected));
    }

    #[rstest]
    fn unknown_metric_is_rejected() {
        assert!("scenic".parse::<Metric>().is_err());
    }

    #[rstest]
    fn distance_prefers_shorter_street(fork: RoutingNetwork) {
        let hit = fork
            .shortest_path(1, 3, Metric::Distance)
            .expect("backend available")
            .expect("path exists");
        assert_eq!(hit.junctions, vec![1, 2, 3]);
        assert!((hit.cost - 200.0).abs() < 1e-9);
        assert_eq!(hit.coordinates.len(), 3);
    }

    #[rstest]
    fn hops_count_edges(fork: RoutingNetwork) {
        let hit = fork
            .shortest_path(1, 3, Metric::Hops)
            .expect("backend available")
            .expect("path exists");
        assert!((hit.cost - 2.0).abs() < 1e-9);
    }

    #[rstest]
    fn traffic_avoids_busy_street(fork: RoutingNetwork) {
        let hit = fork
            .shortest_path(1, 3, Metric::Traffic)
            .expect("backend available")
            .expect("path exists");
        assert_eq!(hit.junctions, vec![1, 4, 5, 3]);
    }

    #[rstest]
    fn same_junction_costs_nothing(fork: RoutingNetwork) {
        let hit = fork
            .shortest_path(2, 2, Metric::Distance)
            .expect("backend available")
            .expect("trivial path");
        assert_eq!(hit.junctions, vec![2]);
        assert!(hit.cost.abs() < f64::EPSILON);
    }

    #[rstest]
    fn unknown_junction_has_no_path(fork: RoutingNetwork) {
        assert_eq!(fork.shortest_path(1, 99, Metric::Distance), Ok(None));
    }

    #[rstest]
    fn inactive_edges_are_not_traversed() {
        let network = NetworkFixture::new()
            .junction(1, 0.0, 0.0)
            .junction(2, 0.0, 0.001)
            .edge(edge(1, 2, 10.0).status(EdgeStatus::Inactive))
            .network();
        assert_eq!(network.shortest_path(1, 2, Metric::Distance), Ok(None));
    }
}
