//! Round trips through the planar frames used by joins and binding.

use geo::{Coord, LineString};
use proptest::prelude::*;
use rstest::rstest;
use waymesh_core::{
    FeatureGeometry, LocalMetric, PlanarFrame, Projection, ProjectionChoice, WebMercator,
};

fn assert_close(left: &FeatureGeometry, right: &FeatureGeometry, epsilon: f64) {
    let coords = |geometry: &FeatureGeometry| -> Vec<Coord<f64>> {
        match geometry {
            FeatureGeometry::Point(point) => vec![point.0],
            FeatureGeometry::Line(line) => line.0.clone(),
        }
    };
    let (left, right) = (coords(left), coords(right));
    assert_eq!(left.len(), right.len());
    for (a, b) in left.iter().zip(&right) {
        assert!(
            (a.x - b.x).abs() < epsilon && (a.y - b.y).abs() < epsilon,
            "{a:?} differs from {b:?}"
        );
    }
}

#[rstest]
#[case(PlanarFrame::Local(LocalMetric::centred_on(Coord { x: 9.19, y: 45.46 })))]
#[case(PlanarFrame::WebMercator(WebMercator))]
fn footway_survives_a_round_trip(#[case] frame: PlanarFrame) {
    let footway = FeatureGeometry::Line(LineString::from(vec![
        (9.1895, 45.4641),
        (9.1901, 45.4643),
        (9.1910, 45.4650),
    ]));
    let planar = frame.project_geometry(&footway);
    assert_close(&frame.unproject_geometry(&planar), &footway, 1e-9);
}

#[rstest]
fn default_frame_is_centred_on_the_data() {
    let bounds = geo::Rect::new(Coord { x: 9.0, y: 45.0 }, Coord { x: 9.2, y: 45.2 });
    let frame = ProjectionChoice::default().frame_for(Some(bounds));
    let centre = frame.project(Coord { x: 9.1, y: 45.1 });
    assert!(centre.x.abs() < 1e-6 && centre.y.abs() < 1e-6);
}

proptest! {
    #[test]
    fn local_metric_round_trips_city_scale_offsets(
        lon in -179.0_f64..179.0,
        lat in -80.0_f64..80.0,
        dx in -0.05_f64..0.05,
        dy in -0.05_f64..0.05,
    ) {
        let frame = LocalMetric::centred_on(Coord { x: lon, y: lat });
        let point = Coord { x: lon + dx, y: lat + dy };
        let back = frame.unproject(frame.project(point));
        prop_assert!((back.x - point.x).abs() < 1e-9);
        prop_assert!((back.y - point.y).abs() < 1e-9);
    }
}
