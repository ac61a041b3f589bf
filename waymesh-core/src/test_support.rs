//! Builders and doubles shared by unit and behaviour tests.

use std::collections::HashMap;

use geo::Coord;

use crate::geometry::EARTH_RADIUS_M;
use crate::{
    Augmented, Augmenter, Candidate, EdgeInput, EdgeStatus, FlagValue, JunctionId, JunctionInput,
    Metric, PathHit, PathSearch, RoadGraph, RoutingNetwork, SearchError,
};

/// Metres per degree of longitude on the equator.
pub const METRES_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A point `metres` east of null island.
#[must_use]
pub fn metres_east(metres: f64) -> Coord<f64> {
    Coord {
        x: metres / METRES_PER_DEGREE,
        y: 0.0,
    }
}

/// Edge under construction; see [`edge`].
#[derive(Debug, Clone)]
pub struct EdgeSpec(EdgeInput);

/// An active, non-driveable edge on street `s` with no traffic.
#[must_use]
pub fn edge(source: JunctionId, target: JunctionId, distance: f64) -> EdgeSpec {
    EdgeSpec(EdgeInput {
        source,
        target,
        distance,
        traffic_volume: 0.0,
        street_id: "s".into(),
        status: EdgeStatus::Active,
        driveable: None,
        name: None,
    })
}

impl EdgeSpec {
    /// Set the raw driveability flag.
    #[must_use]
    pub fn driveable(mut self, flag: impl Into<FlagValue>) -> Self {
        self.0.driveable = Some(flag.into());
        self
    }

    /// Set the edge status.
    #[must_use]
    pub fn status(mut self, status: EdgeStatus) -> Self {
        self.0.status = status;
        self
    }

    /// Set the traffic volume.
    #[must_use]
    pub fn traffic(mut self, volume: f64) -> Self {
        self.0.traffic_volume = volume;
        self
    }

    /// Set the street id.
    #[must_use]
    pub fn street(mut self, street_id: &str) -> Self {
        self.0.street_id = street_id.to_owned();
        self
    }

    /// Set the street name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.0.name = Some(name.to_owned());
        self
    }
}

/// Fluent road graph builder that panics on invalid input.
#[derive(Debug, Default)]
pub struct NetworkFixture {
    roads: RoadGraph,
}

impl NetworkFixture {
    /// Start an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a junction at `(lon, lat)`.
    #[must_use]
    pub fn junction(self, id: JunctionId, lon: f64, lat: f64) -> Self {
        self.junction_at(id, Coord { x: lon, y: lat })
    }

    /// Add a junction at `location`.
    #[must_use]
    pub fn junction_at(mut self, id: JunctionId, location: Coord<f64>) -> Self {
        self.roads
            .add_junction(JunctionInput {
                id,
                lat: location.y,
                lon: location.x,
            })
            .unwrap_or_else(|err| panic!("fixture junction {id}: {err}"));
        self
    }

    /// Add a directed edge.
    #[must_use]
    pub fn edge(mut self, spec: EdgeSpec) -> Self {
        self.roads
            .add_edge(spec.0)
            .unwrap_or_else(|err| panic!("fixture edge: {err}"));
        self
    }

    /// The raw graph.
    #[must_use]
    pub fn roads(self) -> RoadGraph {
        self.roads
    }

    /// Augment with default settings.
    #[must_use]
    pub fn augment(self) -> Augmented {
        Augmenter::default().augment(self.roads)
    }

    /// Augment and keep only the network.
    #[must_use]
    pub fn network(self) -> RoutingNetwork {
        self.augment().network
    }
}

/// Path search answering from a fixed table of `(source, target) -> cost`.
#[derive(Debug, Default, Clone)]
pub struct FixedPaths {
    costs: HashMap<(JunctionId, JunctionId), f64>,
}

impl FixedPaths {
    /// Register a path.
    #[must_use]
    pub fn with(mut self, source: JunctionId, target: JunctionId, cost: f64) -> Self {
        self.costs.insert((source, target), cost);
        self
    }
}

impl PathSearch for FixedPaths {
    fn shortest_path(
        &self,
        source: JunctionId,
        target: JunctionId,
        _metric: Metric,
    ) -> Result<Option<PathHit>, SearchError> {
        Ok(self.costs.get(&(source, target)).map(|cost| PathHit {
            cost: *cost,
            junctions: vec![source, target],
            coordinates: Vec::new(),
        }))
    }
}

/// Path search whose backend is always down.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSearch;

impl PathSearch for UnavailableSearch {
    fn shortest_path(
        &self,
        _source: JunctionId,
        _target: JunctionId,
        _metric: Metric,
    ) -> Result<Option<PathHit>, SearchError> {
        Err(SearchError::Unavailable {
            reason: "graph store offline".into(),
        })
    }
}

/// A candidate whose raw distances equal its normalised ones.
#[must_use]
pub fn candidate(
    junction_source: JunctionId,
    junction_target: JunctionId,
    normalized_source: f64,
    normalized_target: f64,
) -> Candidate {
    Candidate {
        junction_source,
        junction_target,
        distance_source: normalized_source,
        distance_target: normalized_target,
        normalized_source,
        normalized_target,
        sum_distance: normalized_source + normalized_target,
    }
}
