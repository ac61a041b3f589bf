//! POI-to-POI routing over a bound network.

use log::info;
use thiserror::Error;

use crate::binding::{BindingSet, PoiBinder};
use crate::candidates::{Candidate, CandidateResolver};
use crate::network::RoutingNetwork;
use crate::poi::{PoiId, PointOfInterest};
use crate::search::Metric;
use crate::selector::{RouteOutcome, SelectError, select_path};

/// Errors returned by [`Router::route`].
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    /// The POI was never passed to the binder.
    #[error("unknown point of interest {id}")]
    UnknownPoi {
        /// Requested POI id.
        id: PoiId,
    },
    /// Path selection failed.
    #[error(transparent)]
    Select(#[from] SelectError),
}

/// Answers route queries between bound POIs.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymesh_core::{
///     Augmenter, BinderConfig, CandidateResolver, EdgeInput, EdgeStatus, JunctionInput, Metric,
///     PoiBinder, PointOfInterest, RoadGraph, RouteOutcome, Router, Tags,
/// };
///
/// let mut roads = RoadGraph::new();
/// roads.add_junction(JunctionInput { id: 1, lat: 0.0, lon: 0.0 })?;
/// roads.add_junction(JunctionInput { id: 2, lat: 0.0, lon: 0.001 })?;
/// roads.add_edge(EdgeInput {
///     source: 1,
///     target: 2,
///     distance: 111.0,
///     traffic_volume: 0.0,
///     street_id: "s".into(),
///     status: EdgeStatus::Active,
///     driveable: Some(true.into()),
///     name: None,
/// })?;
/// let network = Augmenter::default().augment(roads).network;
/// let pois = [
///     PointOfInterest::node(10, Coord { x: 0.0, y: 0.0 }, Tags::new()),
///     PointOfInterest::node(20, Coord { x: 0.001, y: 0.0 }, Tags::new()),
/// ];
/// let router = Router::bind(&network, &pois, PoiBinder::default(), CandidateResolver::default());
/// let outcome = router.route(10, 20, Metric::Hops)?;
/// assert!(matches!(outcome, RouteOutcome::Found(path) if path.junctions == vec![1, 2]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Router<'a> {
    network: &'a RoutingNetwork,
    bindings: BindingSet,
    resolver: CandidateResolver,
}

impl<'a> Router<'a> {
    /// Route over `network` using precomputed `bindings`.
    #[must_use]
    pub const fn new(
        network: &'a RoutingNetwork,
        bindings: BindingSet,
        resolver: CandidateResolver,
    ) -> Self {
        Self {
            network,
            bindings,
            resolver,
        }
    }

    /// Bind `pois` with `binder` and route over the result.
    #[must_use]
    pub fn bind(
        network: &'a RoutingNetwork,
        pois: &[PointOfInterest],
        binder: PoiBinder,
        resolver: CandidateResolver,
    ) -> Self {
        Self::new(network, binder.bind(network, pois), resolver)
    }

    /// Bindings used by this router.
    #[must_use]
    pub const fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// Ranked candidate junction pairs for a query.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownPoi`] when either POI was never bound.
    pub fn candidates(&self, source: PoiId, target: PoiId) -> Result<Vec<Candidate>, RouteError> {
        for id in [source, target] {
            if !self.bindings.contains_poi(id) {
                return Err(RouteError::UnknownPoi { id });
            }
        }
        Ok(self
            .resolver
            .resolve(self.network, &self.bindings, source, target))
    }

    /// Cheapest route from `source` to `target` under `metric`.
    ///
    /// A known POI without usable bindings yields [`RouteOutcome::NoPath`].
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownPoi`] for an unbound POI and
    /// [`RouteError::Select`] when the path search fails.
    pub fn route(
        &self,
        source: PoiId,
        target: PoiId,
        metric: Metric,
    ) -> Result<RouteOutcome, RouteError> {
        let candidates = self.candidates(source, target)?;
        let count = candidates.len();
        let outcome = select_path(self.network, candidates, metric)?;
        info!(
            "route {source} -> {target} by {metric}: {} after {count} candidates",
            match &outcome {
                RouteOutcome::Found(path) => format!("cost {}", path.total_cost),
                RouteOutcome::NoPath => "no path".to_owned(),
            }
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NetworkFixture, edge};
    use crate::Tags;
    use geo::Coord;
    use rstest::rstest;

    #[rstest]
    fn unknown_poi_is_an_error() {
        let network = NetworkFixture::new().network();
        let router = Router::bind(&network, &[], PoiBinder::default(), CandidateResolver::default());
        assert_eq!(
            router.route(1, 2, Metric::Distance),
            Err(RouteError::UnknownPoi { id: 1 })
        );
    }

    #[rstest]
    fn poi_without_bindings_has_no_path() {
        let network = NetworkFixture::new()
            .junction(1, 0.0, 0.0)
            .junction(2, 0.001, 0.0)
            .edge(edge(1, 2, 100.0))
            .network();
        let pois = [
            PointOfInterest::node(10, Coord { x: 0.0, y: 0.0 }, Tags::new()),
            PointOfInterest::node(20, Coord { x: 5.0, y: 5.0 }, Tags::new()),
        ];
        let router = Router::bind(&network, &pois, PoiBinder::default(), CandidateResolver::default());
        assert_eq!(router.route(10, 20, Metric::Distance), Ok(RouteOutcome::NoPath));
    }
}
