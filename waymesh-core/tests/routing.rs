//! End-to-end routing from POI to POI.

use geo::Coord;
use rstest::{fixture, rstest};
use waymesh_core::{
    Augmenter, BindingTier, CandidateResolver, EdgeInput, EdgeStatus, FlagValue, JunctionId,
    JunctionInput, Metric, PoiBinder, PointOfInterest, RoadGraph, RouteOutcome, Router,
    RoutingNetwork, Tags,
};

const METRES_PER_DEGREE: f64 = 6_378_137.0 * std::f64::consts::PI / 180.0;

fn east(metres: f64) -> Coord<f64> {
    Coord {
        x: metres / METRES_PER_DEGREE,
        y: 0.0,
    }
}

fn network(junctions: &[(JunctionId, f64)], edges: &[(JunctionId, JunctionId, bool)]) -> RoutingNetwork {
    let mut roads = RoadGraph::new();
    for (id, metres) in junctions {
        let at = east(*metres);
        roads
            .add_junction(JunctionInput {
                id: *id,
                lat: at.y,
                lon: at.x,
            })
            .expect("unique junction");
    }
    for (source, target, driveable) in edges {
        roads
            .add_edge(EdgeInput {
                source: *source,
                target: *target,
                distance: 100.0,
                traffic_volume: 5.0,
                street_id: format!("{source}-{target}"),
                status: EdgeStatus::Active,
                driveable: Some(FlagValue::from(*driveable)),
                name: None,
            })
            .expect("known endpoints");
    }
    Augmenter::default().augment(roads).network
}

/// Driveable chain 1 - 2 - 3 - 4, one hundred metres per hop.
#[fixture]
fn chain() -> RoutingNetwork {
    network(
        &[(1, 0.0), (2, 100.0), (3, 200.0), (4, 300.0)],
        &[(1, 2, true), (2, 3, true), (3, 4, true)],
    )
}

#[fixture]
fn ends() -> Vec<PointOfInterest> {
    vec![
        PointOfInterest::node(10, east(0.0), Tags::new()),
        PointOfInterest::node(20, east(300.0), Tags::new()),
    ]
}

#[rstest]
#[case(Metric::Distance, 300.0)]
#[case(Metric::Hops, 3.0)]
fn three_hop_path_costs(
    chain: RoutingNetwork,
    ends: Vec<PointOfInterest>,
    #[case] metric: Metric,
    #[case] expected: f64,
) {
    let router = Router::bind(&chain, &ends, PoiBinder::default(), CandidateResolver::default());
    let outcome = router.route(10, 20, metric).expect("backend available");
    let RouteOutcome::Found(path) = outcome else {
        panic!("expected a path under {metric}");
    };
    assert!((path.path_cost - expected).abs() < 1e-9);
    assert_eq!(path.junctions, vec![1, 2, 3, 4]);
    assert_eq!(path.coordinates.len(), 4);
    assert_eq!(path.coordinates.first(), Some(&east(0.0)));
}

#[rstest]
fn reverse_route_uses_symmetrised_edges(chain: RoutingNetwork, ends: Vec<PointOfInterest>) {
    let router = Router::bind(&chain, &ends, PoiBinder::default(), CandidateResolver::default());
    let outcome = router.route(20, 10, Metric::Hops).expect("backend available");
    assert!(matches!(outcome, RouteOutcome::Found(path) if path.junctions == vec![4, 3, 2, 1]));
}

#[rstest]
fn poi_near_footpath_is_repaired_onto_the_road() {
    let network = network(
        &[(1, 0.0), (2, 100.0), (7, 1000.0), (8, 1050.0)],
        &[(1, 2, true), (7, 8, false)],
    );
    let pois = [PointOfInterest::node(30, east(1010.0), Tags::new())];
    let bindings = PoiBinder::default().bind(&network, &pois);
    let tiers: Vec<_> = bindings
        .for_poi(30)
        .unwrap_or_default()
        .iter()
        .map(|b| (b.junction, b.tier))
        .collect();
    assert_eq!(
        tiers,
        vec![
            (7, BindingTier::NonDriveableNearest),
            (2, BindingTier::NearestDriveable)
        ]
    );
}

#[rstest]
fn isolated_poi_has_no_bindings_and_no_path() {
    let network = network(&[(1, 0.0), (2, 100.0)], &[(1, 2, false)]);
    let pois = [
        PointOfInterest::node(10, east(0.0), Tags::new()),
        PointOfInterest::node(40, east(5_000.0), Tags::new()),
    ];
    let router = Router::bind(&network, &pois, PoiBinder::default(), CandidateResolver::default());

    assert_eq!(router.bindings().for_poi(40), Some(&[][..]));
    assert_eq!(router.route(10, 40, Metric::Distance), Ok(RouteOutcome::NoPath));
    assert_eq!(router.route(40, 10, Metric::Traffic), Ok(RouteOutcome::NoPath));
}
