//! Geometric map features extracted from OpenStreetMap-style sources.
//!
//! Features are immutable once extracted. Coordinates are WGS84 with
//! `x = longitude` and `y = latitude`.

use std::collections::HashMap;
use std::fmt;

use geo::{BoundingRect, Geometry, LineString, Point, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Free-form key/value tags attached to a feature.
pub type Tags = HashMap<String, String>;

/// Identifier of a feature as it appears in the interchange files.
///
/// Numeric OpenStreetMap ids and prefixed ids such as `way/42` are both
/// stored as text so that ids from different feature families never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct FeatureId(String);

impl FeatureId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Geometry carried by a feature: a point observation or a polyline.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// A single position, e.g. a street node or a crossing mapped as a node.
    Point(Point<f64>),
    /// An ordered polyline, e.g. a footway or a crossing mapped as a way.
    Line(LineString<f64>),
}

impl FeatureGeometry {
    /// Axis-aligned bounds, or `None` for an empty polyline.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        match self {
            Self::Point(point) => Some(point.bounding_rect()),
            Self::Line(line) => line.bounding_rect(),
        }
    }

    /// Convert into a general `geo` geometry.
    #[must_use]
    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Self::Point(point) => Geometry::Point(*point),
            Self::Line(line) => Geometry::LineString(line.clone()),
        }
    }
}

/// Broad family a feature belongs to, derived from its tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum FeatureKind {
    /// Pedestrian way.
    Footway,
    /// Dedicated cycle lane or track.
    Cycleway,
    /// Crossing mapped as a way.
    CrossingWay,
    /// Crossing mapped as a node.
    CrossingNode,
    /// Any other node of the street network.
    StreetNode,
}

/// A map feature with id, geometry and tags.
///
/// # Examples
/// ```
/// use geo::Point;
/// use waymesh_core::{Feature, FeatureGeometry, Tags};
///
/// let feature = Feature::new(
///     "42",
///     FeatureGeometry::Point(Point::new(9.19, 45.46)),
///     Tags::from([("highway".into(), "crossing".into())]),
/// );
/// assert_eq!(feature.tag("highway"), Some("crossing"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifier from the source file.
    pub id: FeatureId,
    /// Geographic geometry.
    pub geometry: FeatureGeometry,
    /// Source tags.
    pub tags: Tags,
}

impl Feature {
    /// Construct a feature.
    #[must_use]
    pub fn new(id: impl Into<FeatureId>, geometry: FeatureGeometry, tags: Tags) -> Self {
        Self {
            id: id.into(),
            geometry,
            tags,
        }
    }

    /// Construct a point feature without tags.
    #[must_use]
    pub fn point(id: impl Into<FeatureId>, lon: f64, lat: f64) -> Self {
        Self::new(id, FeatureGeometry::Point(Point::new(lon, lat)), Tags::new())
    }

    /// Construct a polyline feature without tags from `(lon, lat)` pairs.
    #[must_use]
    pub fn line(id: impl Into<FeatureId>, coords: &[(f64, f64)]) -> Self {
        Self::new(
            id,
            FeatureGeometry::Line(LineString::from(coords.to_vec())),
            Tags::new(),
        )
    }

    /// Look up a tag value.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Whether the tag `key` is present with exactly `value`.
    #[must_use]
    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.tag(key) == Some(value)
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn numeric_and_text_ids_compare_as_text() {
        assert_eq!(FeatureId::from(42_u64), FeatureId::from("42"));
        assert_ne!(FeatureId::from(42_u64), FeatureId::from("way/42"));
    }

    #[rstest]
    fn empty_line_has_no_bounds() {
        let geometry = FeatureGeometry::Line(LineString::new(Vec::new()));
        assert!(geometry.bounds().is_none());
    }

    #[rstest]
    fn tag_lookup_requires_exact_value() {
        let mut feature = Feature::point(1_u64, 0.0, 0.0);
        feature.tags.insert("footway".into(), "crossing".into());
        assert!(feature.has_tag("footway", "crossing"));
        assert!(!feature.has_tag("footway", "sidewalk"));
        assert_eq!(feature.tag("highway"), None);
    }
}
