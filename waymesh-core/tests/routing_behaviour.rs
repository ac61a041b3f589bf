//! Behavioural tests for POI-to-POI routing.

use std::cell::RefCell;

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use waymesh_core::{
    Augmenter, BindingSet, BindingTier, CandidateResolver, EdgeInput, EdgeStatus, FlagValue,
    JunctionId, JunctionInput, Metric, PoiBinder, PoiId, PointOfInterest, RoadGraph,
    RouteOutcome, Router, Tags,
};

const METRES_PER_DEGREE: f64 = 6_378_137.0 * std::f64::consts::PI / 180.0;
const MUSEUM: PoiId = 10;
const LIBRARY: PoiId = 20;
const KIOSK: PoiId = 30;

fn east(metres: f64) -> Coord<f64> {
    Coord {
        x: metres / METRES_PER_DEGREE,
        y: 0.0,
    }
}

fn add_street(roads: &mut RoadGraph, junctions: &[(JunctionId, f64)], driveable: bool) {
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
    for pair in junctions.windows(2) {
        let [(source, from), (target, to)] = pair else {
            continue;
        };
        roads
            .add_edge(EdgeInput {
                source: *source,
                target: *target,
                distance: to - from,
                traffic_volume: 0.0,
                street_id: if driveable { "street" } else { "footpath" }.to_owned(),
                status: EdgeStatus::Active,
                driveable: Some(FlagValue::from(driveable)),
                name: None,
            })
            .expect("known endpoints");
    }
}

#[fixture]
fn roads() -> RefCell<RoadGraph> {
    RefCell::new(RoadGraph::new())
}

#[fixture]
fn pois() -> RefCell<Vec<PointOfInterest>> {
    RefCell::new(Vec::new())
}

#[fixture]
fn bindings() -> RefCell<Option<BindingSet>> {
    RefCell::new(None)
}

#[fixture]
fn outcome() -> RefCell<Option<RouteOutcome>> {
    RefCell::new(None)
}

#[given("a driveable street of three hundred metres in three hops")]
fn given_street(#[from(roads)] roads: &RefCell<RoadGraph>) {
    add_street(
        &mut roads.borrow_mut(),
        &[(1, 0.0), (2, 100.0), (3, 200.0), (4, 300.0)],
        true,
    );
}

#[given("a footpath far from the street")]
fn given_footpath(#[from(roads)] roads: &RefCell<RoadGraph>) {
    add_street(&mut roads.borrow_mut(), &[(7, 2_000.0), (8, 2_050.0)], false);
}

#[given("a museum and a library at either end of the street")]
fn given_ends(#[from(pois)] pois: &RefCell<Vec<PointOfInterest>>) {
    pois.borrow_mut().extend([
        PointOfInterest::node(MUSEUM, east(0.0), Tags::from([("tourism".into(), "museum".into())])),
        PointOfInterest::node(LIBRARY, east(300.0), Tags::from([("amenity".into(), "library".into())])),
    ]);
}

#[given("a kiosk beside the footpath")]
fn given_kiosk(#[from(pois)] pois: &RefCell<Vec<PointOfInterest>>) {
    pois.borrow_mut().push(PointOfInterest::node(
        KIOSK,
        east(2_010.0),
        Tags::from([("shop".into(), "kiosk".into())]),
    ));
}

fn route(
    roads: &RefCell<RoadGraph>,
    pois: &RefCell<Vec<PointOfInterest>>,
    outcome: &RefCell<Option<RouteOutcome>>,
    metric: Metric,
) {
    let network = Augmenter::default().augment(roads.take()).network;
    let router = Router::bind(
        &network,
        &pois.borrow(),
        PoiBinder::default(),
        CandidateResolver::default(),
    );
    let found = router.route(MUSEUM, LIBRARY, metric).expect("backend available");
    *outcome.borrow_mut() = Some(found);
}

#[when("I route from the museum to the library by distance")]
fn when_route_by_distance(
    #[from(roads)] roads: &RefCell<RoadGraph>,
    #[from(pois)] pois: &RefCell<Vec<PointOfInterest>>,
    #[from(outcome)] outcome: &RefCell<Option<RouteOutcome>>,
) {
    route(roads, pois, outcome, Metric::Distance);
}

#[when("I route from the museum to the library by hop count")]
fn when_route_by_hops(
    #[from(roads)] roads: &RefCell<RoadGraph>,
    #[from(pois)] pois: &RefCell<Vec<PointOfInterest>>,
    #[from(outcome)] outcome: &RefCell<Option<RouteOutcome>>,
) {
    route(roads, pois, outcome, Metric::Hops);
}

#[when("I bind the points of interest")]
fn when_bind(
    #[from(roads)] roads: &RefCell<RoadGraph>,
    #[from(pois)] pois: &RefCell<Vec<PointOfInterest>>,
    #[from(bindings)] bindings: &RefCell<Option<BindingSet>>,
) {
    let network = Augmenter::default().augment(roads.take()).network;
    *bindings.borrow_mut() = Some(PoiBinder::default().bind(&network, &pois.borrow()));
}

fn found_path_cost(outcome: &RefCell<Option<RouteOutcome>>) -> (f64, usize) {
    match outcome.borrow().as_ref().expect("route requested") {
        RouteOutcome::Found(path) => (path.path_cost, path.junctions.len()),
        RouteOutcome::NoPath => panic!("expected a path"),
    }
}

#[then("the path costs 300")]
fn then_costs_300(#[from(outcome)] outcome: &RefCell<Option<RouteOutcome>>) {
    let (cost, _) = found_path_cost(outcome);
    assert!((cost - 300.0).abs() < 1e-9, "unexpected cost {cost}");
}

#[then("the path costs 3")]
fn then_costs_3(#[from(outcome)] outcome: &RefCell<Option<RouteOutcome>>) {
    let (cost, _) = found_path_cost(outcome);
    assert!((cost - 3.0).abs() < 1e-9, "unexpected cost {cost}");
}

#[then("the path visits 4 junctions")]
fn then_visits_four(#[from(outcome)] outcome: &RefCell<Option<RouteOutcome>>) {
    let (_, visited) = found_path_cost(outcome);
    assert_eq!(visited, 4);
}

#[then("no path is found")]
fn then_no_path(#[from(outcome)] outcome: &RefCell<Option<RouteOutcome>>) {
    assert_eq!(outcome.borrow().as_ref(), Some(&RouteOutcome::NoPath));
}

#[then("the kiosk is bound to the footpath and to the nearest street junction")]
fn then_kiosk_repaired(#[from(bindings)] bindings: &RefCell<Option<BindingSet>>) {
    let bindings = bindings.borrow();
    let tiers: Vec<_> = bindings
        .as_ref()
        .expect("bindings computed")
        .for_poi(KIOSK)
        .expect("kiosk bound")
        .iter()
        .map(|b| (b.junction, b.tier))
        .collect();
    assert_eq!(
        tiers,
        vec![
            (7, BindingTier::NonDriveableNearest),
            (4, BindingTier::NearestDriveable)
        ]
    );
}

#[scenario(path = "tests/features/routing.feature", index = 0)]
fn scenario_distance_route(
    roads: RefCell<RoadGraph>,
    pois: RefCell<Vec<PointOfInterest>>,
    bindings: RefCell<Option<BindingSet>>,
    outcome: RefCell<Option<RouteOutcome>>,
) {
    let _ = (roads, pois, bindings, outcome);
}

#[scenario(path = "tests/features/routing.feature", index = 1)]
fn scenario_hop_route(
    roads: RefCell<RoadGraph>,
    pois: RefCell<Vec<PointOfInterest>>,
    bindings: RefCell<Option<BindingSet>>,
    outcome: RefCell<Option<RouteOutcome>>,
) {
    let _ = (roads, pois, bindings, outcome);
}

#[scenario(path = "tests/features/routing.feature", index = 2)]
fn scenario_repaired_binding(
    roads: RefCell<RoadGraph>,
    pois: RefCell<Vec<PointOfInterest>>,
    bindings: RefCell<Option<BindingSet>>,
    outcome: RefCell<Option<RouteOutcome>>,
) {
    let _ = (roads, pois, bindings, outcome);
}

#[scenario(path = "tests/features/routing.feature", index = 3)]
fn scenario_no_path(
    roads: RefCell<RoadGraph>,
    pois: RefCell<Vec<PointOfInterest>>,
    bindings: RefCell<Option<BindingSet>>,
    outcome: RefCell<Option<RouteOutcome>>,
) {
    let _ = (roads, pois, bindings, outcome);
}
