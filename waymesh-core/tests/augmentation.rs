//! Integration tests for road graph augmentation.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rstest::{fixture, rstest};
use waymesh_core::{
    Augmenter, EdgeInput, EdgeStatus, FlagValue, JunctionId, JunctionInput, RoadGraph,
    RoutingNetwork,
};

fn edge_input(source: JunctionId, target: JunctionId, street: &str, driveable: FlagValue) -> EdgeInput {
    EdgeInput {
        source,
        target,
        distance: 50.0,
        traffic_volume: 10.0,
        street_id: street.to_owned(),
        status: EdgeStatus::Active,
        driveable: Some(driveable),
        name: None,
    }
}

fn grid(edges: &[(JunctionId, JunctionId, bool)]) -> RoadGraph {
    let mut roads = RoadGraph::new();
    let ids: BTreeSet<JunctionId> = edges.iter().flat_map(|(s, t, _)| [*s, *t]).collect();
    for id in ids {
        #[expect(clippy::cast_precision_loss, reason = "junction ids in tests are small")]
        let offset = id as f64 * 0.001;
        roads
            .add_junction(JunctionInput {
                id,
                lat: 45.0 + offset,
                lon: 9.0,
            })
            .expect("unique junction");
    }
    for (source, target, driveable) in edges {
        roads
            .add_edge(edge_input(
                *source,
                *target,
                &format!("street-{}", source.min(target)),
                FlagValue::from(*driveable),
            ))
            .expect("known endpoints");
    }
    roads
}

fn edge_set(network: &RoutingNetwork) -> BTreeSet<(JunctionId, JunctionId, String)> {
    network
        .edges()
        .map(|(from, to, edge)| (from, to, edge.street_id.clone()))
        .collect()
}

#[fixture]
fn mixed() -> RoadGraph {
    let mut roads = grid(&[(1, 2, true), (2, 3, false), (4, 3, false)]);
    roads
        .add_edge(edge_input(3, 2, "street-2", FlagValue::from("no")))
        .expect("known endpoints");
    roads
}

#[rstest]
fn driveability_reaches_a_fixed_point(mixed: RoadGraph) {
    let first = Augmenter::default().augment(mixed);
    let second = Augmenter::default().augment(RoadGraph::from(&first.network));

    assert_eq!(second.report.reverse_edges, 0);
    assert_eq!(
        second.report.driveable_junctions,
        first.report.driveable_junctions
    );
    assert_eq!(edge_set(&second.network), edge_set(&first.network));
    let driveable = |network: &RoutingNetwork| -> Vec<JunctionId> {
        network
            .junctions()
            .filter(|j| j.driveable)
            .map(|j| j.id)
            .collect()
    };
    assert_eq!(driveable(&second.network), driveable(&first.network));
    assert_eq!(driveable(&first.network), vec![1, 2]);
}

#[rstest]
fn existing_reverse_is_kept_once(mixed: RoadGraph) {
    let augmented = Augmenter::default().augment(mixed);
    assert_eq!(augmented.report.input_edges, 4);
    assert_eq!(augmented.report.reverse_edges, 2);
    assert_eq!(augmented.network.edge_count(), 6);
}

#[rstest]
fn sections_follow_street_ids(mixed: RoadGraph) {
    let network = Augmenter::default().augment(mixed).network;
    let sections = network.sections();
    assert_eq!(sections.section_count(), 3);
    assert!(sections.connects("street-1", "street-2", 2));
    assert!(sections.connects("street-2", "street-3", 3));
    assert!(!sections.connects("street-1", "street-3", 2));
}

proptest! {
    #[test]
    fn every_edge_has_a_reverse(
        pairs in proptest::collection::vec((1_u64..8, 1_u64..8, any::<bool>()), 1..24),
    ) {
        let network = Augmenter::default().augment(grid(&pairs)).network;
        let edges = edge_set(&network);
        for (from, to, street) in &edges {
            prop_assert!(edges.contains(&(*to, *from, street.clone())));
        }
    }

    #[test]
    fn a_junction_is_driveable_iff_an_incident_edge_is(
        pairs in proptest::collection::vec((1_u64..8, 1_u64..8, any::<bool>()), 1..24),
    ) {
        let network = Augmenter::default().augment(grid(&pairs)).network;
        for junction in network.junctions() {
            let incident = pairs
                .iter()
                .any(|(s, t, d)| *d && (*s == junction.id || *t == junction.id));
            prop_assert_eq!(junction.driveable, incident);
        }
    }
}
