//! Planar projections and distance helpers.
//!
//! Buffers and proximity tests are evaluated in metres on a plane, never in
//! raw degrees. [`LocalMetric`] is the default plane: an equirectangular
//! projection centred on the data, accurate to well under a metre across a
//! city. [`WebMercator`] is available for callers who need a global plane
//! and accept its scale distortion away from the equator.

use geo::{Coord, Distance, Euclidean, MapCoords, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::FeatureGeometry;

/// WGS84 semi-major axis in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Lower bound for the cosine of the reference latitude.
const MIN_COS_LAT: f64 = 1.0e-6;

/// Forward and inverse mapping between WGS84 and a planar frame.
pub trait Projection {
    /// Map a `(lon, lat)` coordinate onto the plane.
    fn project(&self, coord: Coord<f64>) -> Coord<f64>;

    /// Map a planar coordinate back to `(lon, lat)`.
    fn unproject(&self, coord: Coord<f64>) -> Coord<f64>;

    /// Project every coordinate of a feature geometry.
    fn project_geometry(&self, geometry: &FeatureGeometry) -> FeatureGeometry {
        let forward = |coord| self.project(coord);
        match geometry {
            FeatureGeometry::Point(point) => FeatureGeometry::Point(point.map_coords(forward)),
            FeatureGeometry::Line(line) => FeatureGeometry::Line(line.map_coords(forward)),
        }
    }

    /// Inverse of [`Projection::project_geometry`].
    fn unproject_geometry(&self, geometry: &FeatureGeometry) -> FeatureGeometry {
        let inverse = |coord| self.unproject(coord);
        match geometry {
            FeatureGeometry::Point(point) => FeatureGeometry::Point(point.map_coords(inverse)),
            FeatureGeometry::Line(line) => FeatureGeometry::Line(line.map_coords(inverse)),
        }
    }
}

/// Equirectangular plane in metres centred on a reference coordinate.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymesh_core::{LocalMetric, Projection};
///
/// let plane = LocalMetric::centred_on(Coord { x: 9.19, y: 45.46 });
/// let origin = plane.project(Coord { x: 9.19, y: 45.46 });
/// assert!(origin.x.abs() < 1e-9 && origin.y.abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalMetric {
    origin: Coord<f64>,
    cos_lat: f64,
}

impl LocalMetric {
    /// Centre the plane on `origin` (`x = lon`, `y = lat`).
    #[must_use]
    pub fn centred_on(origin: Coord<f64>) -> Self {
        let cos_lat = origin.y.to_radians().cos().max(MIN_COS_LAT);
        Self { origin, cos_lat }
    }

    /// Centre the plane on the middle of `bounds`.
    #[must_use]
    pub fn for_bounds(bounds: Rect<f64>) -> Self {
        Self::centred_on(bounds.center())
    }

    /// Reference coordinate of the plane.
    #[must_use]
    pub const fn origin(&self) -> Coord<f64> {
        self.origin
    }
}

impl Projection for LocalMetric {
    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: EARTH_RADIUS_M * (coord.x - self.origin.x).to_radians() * self.cos_lat,
            y: EARTH_RADIUS_M * (coord.y - self.origin.y).to_radians(),
        }
    }

    fn unproject(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + (coord.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
            y: self.origin.y + (coord.y / EARTH_RADIUS_M).to_degrees(),
        }
    }
}

/// Spherical Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WebMercator;

impl Projection for WebMercator {
    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        let y = (std::f64::consts::FRAC_PI_4 + coord.y.to_radians() / 2.0)
            .tan()
            .ln();
        Coord {
            x: EARTH_RADIUS_M * coord.x.to_radians(),
            y: EARTH_RADIUS_M * y,
        }
    }

    fn unproject(&self, coord: Coord<f64>) -> Coord<f64> {
        let lat = 2.0 * (coord.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2;
        Coord {
            x: (coord.x / EARTH_RADIUS_M).to_degrees(),
            y: lat.to_degrees(),
        }
    }
}

/// Which planar frame a pass should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ProjectionChoice {
    /// [`LocalMetric`] centred on the data being processed.
    #[default]
    LocalMetric,
    /// [`WebMercator`].
    WebMercator,
}

impl ProjectionChoice {
    /// Resolve the choice into a concrete frame for data covering `bounds`.
    #[must_use]
    pub fn frame_for(self, bounds: Option<Rect<f64>>) -> PlanarFrame {
        match self {
            Self::LocalMetric => PlanarFrame::Local(
                bounds.map_or_else(|| LocalMetric::centred_on(Coord::zero()), LocalMetric::for_bounds),
            ),
            Self::WebMercator => PlanarFrame::WebMercator(WebMercator),
        }
    }
}

/// A resolved planar frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanarFrame {
    /// Local equirectangular plane.
    Local(LocalMetric),
    /// Web Mercator plane.
    WebMercator(WebMercator),
}

impl Projection for PlanarFrame {
    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Local(plane) => plane.project(coord),
            Self::WebMercator(plane) => plane.project(coord),
        }
    }

    fn unproject(&self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Local(plane) => plane.unproject(coord),
            Self::WebMercator(plane) => plane.unproject(coord),
        }
    }
}

/// Grow `acc` so it also covers `bounds`.
pub(crate) fn merge_bounds(acc: Option<Rect<f64>>, bounds: Option<Rect<f64>>) -> Option<Rect<f64>> {
    match (acc, bounds) {
        (Some(left), Some(right)) => Some(Rect::new(
            Coord {
                x: left.min().x.min(right.min().x),
                y: left.min().y.min(right.min().y),
            },
            Coord {
                x: left.max().x.max(right.max().x),
                y: left.max().y.max(right.max().y),
            },
        )),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// Bounds covering every coordinate in `coords`.
pub(crate) fn bounds_of_coords<I>(coords: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = Coord<f64>>,
{
    coords
        .into_iter()
        .fold(None, |acc, coord| merge_bounds(acc, Some(Rect::new(coord, coord))))
}

/// Euclidean distance between two geometries already in a planar frame.
#[must_use]
pub fn planar_distance(a: &FeatureGeometry, b: &FeatureGeometry) -> f64 {
    match (a, b) {
        (FeatureGeometry::Point(p), FeatureGeometry::Point(q)) => Euclidean.distance(p, q),
        (FeatureGeometry::Point(p), FeatureGeometry::Line(line))
        | (FeatureGeometry::Line(line), FeatureGeometry::Point(p)) => Euclidean.distance(p, line),
        (FeatureGeometry::Line(left), FeatureGeometry::Line(right)) => {
            Euclidean.distance(left, right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use proptest::prelude::*;
    use rstest::rstest;

    const ROUND_TRIP_EPSILON: f64 = 1.0e-9;

    #[rstest]
    fn local_metric_scales_longitude_by_latitude() {
        let plane = LocalMetric::centred_on(Coord { x: 0.0, y: 60.0 });
        let east = plane.project(Coord { x: 1.0, y: 60.0 });
        let north = plane.project(Coord { x: 0.0, y: 61.0 });
        // One degree of longitude at 60° is half a degree of latitude.
        assert!((east.x * 2.0 - north.y).abs() < 1.0e-6);
    }

    #[rstest]
    fn web_mercator_maps_origin_to_origin() {
        let projected = WebMercator.project(Coord { x: 0.0, y: 0.0 });
        assert!(projected.x.abs() < ROUND_TRIP_EPSILON);
        assert!(projected.y.abs() < ROUND_TRIP_EPSILON);
    }

    #[rstest]
    fn frame_defaults_to_null_island_without_bounds() {
        let frame = ProjectionChoice::LocalMetric.frame_for(None);
        assert_eq!(
            frame,
            PlanarFrame::Local(LocalMetric::centred_on(Coord::zero()))
        );
    }

    #[rstest]
    fn merge_bounds_covers_both_inputs() {
        let left = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let right = Rect::new(Coord { x: 2.0, y: -1.0 }, Coord { x: 3.0, y: 0.5 });
        let merged = merge_bounds(Some(left), Some(right)).expect("bounds present");
        assert_eq!(merged.min(), Coord { x: 0.0, y: -1.0 });
        assert_eq!(merged.max(), Coord { x: 3.0, y: 1.0 });
    }

    #[rstest]
    fn point_to_line_distance_is_perpendicular() {
        let point = FeatureGeometry::Point(Point::new(0.0, 5.0));
        let line = FeatureGeometry::Line(vec![(-10.0, 0.0), (10.0, 0.0)].into());
        assert!((planar_distance(&point, &line) - 5.0).abs() < ROUND_TRIP_EPSILON);
        assert!((planar_distance(&line, &point) - 5.0).abs() < ROUND_TRIP_EPSILON);
    }

    proptest! {
        #[test]
        fn local_metric_round_trips(
            lon in -179.0_f64..179.0,
            lat in -80.0_f64..80.0,
            dx in -0.05_f64..0.05,
            dy in -0.05_f64..0.05,
        ) {
            let plane = LocalMetric::centred_on(Coord { x: lon, y: lat });
            let coord = Coord { x: lon + dx, y: lat + dy };
            let back = plane.unproject(plane.project(coord));
            prop_assert!((back.x - coord.x).abs() < ROUND_TRIP_EPSILON);
            prop_assert!((back.y - coord.y).abs() < ROUND_TRIP_EPSILON);
        }

        #[test]
        fn web_mercator_round_trips(lon in -179.0_f64..179.0, lat in -80.0_f64..80.0) {
            let coord = Coord { x: lon, y: lat };
            let back = WebMercator.unproject(WebMercator.project(coord));
            prop_assert!((back.x - coord.x).abs() < ROUND_TRIP_EPSILON);
            prop_assert!((back.y - coord.y).abs() < ROUND_TRIP_EPSILON);
        }
    }
}
