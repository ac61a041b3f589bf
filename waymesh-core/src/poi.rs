//! Points of interest and their member observations.

use geo::{Centroid, Coord, MultiPoint, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Tags;

/// Identifier of a point of interest.
pub type PoiId = u64;

/// Whether a member is a single node or the way as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum MemberLevel {
    /// A node of the POI.
    Point,
    /// The way-level observation, located at its centroid.
    Aggregate,
}

/// One observed location of a POI.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoiMember {
    /// Node id, or the way id for the aggregate member.
    pub id: u64,
    /// Location (`x = lon`, `y = lat`).
    pub location: Coord<f64>,
    /// Observation level.
    pub level: MemberLevel,
}

/// A point of interest to route between.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymesh_core::{MemberLevel, PointOfInterest, Tags};
///
/// let shop = PointOfInterest::way(
///     9,
///     Tags::new(),
///     [(1, Coord { x: 0.0, y: 0.0 }), (2, Coord { x: 2.0, y: 0.0 })],
/// );
/// let aggregate = shop
///     .members
///     .iter()
///     .find(|m| m.level == MemberLevel::Aggregate)
///     .map(|m| m.location);
/// assert_eq!(aggregate, Some(Coord { x: 1.0, y: 0.0 }));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointOfInterest {
    /// POI id.
    pub id: PoiId,
    /// Source tags.
    pub tags: Tags,
    /// Observed locations.
    pub members: Vec<PoiMember>,
}

impl PointOfInterest {
    /// A POI mapped as a single node; the node is its only member.
    #[must_use]
    pub fn node(id: PoiId, location: Coord<f64>, tags: Tags) -> Self {
        Self {
            id,
            tags,
            members: vec![PoiMember {
                id,
                location,
                level: MemberLevel::Point,
            }],
        }
    }

    /// A POI mapped as a way: one point member per node plus an aggregate
    /// member at the centroid of the nodes.
    pub fn way<I>(id: PoiId, tags: Tags, nodes: I) -> Self
    where
        I: IntoIterator<Item = (u64, Coord<f64>)>,
    {
        let mut members: Vec<PoiMember> = nodes
            .into_iter()
            .map(|(node, location)| PoiMember {
                id: node,
                location,
                level: MemberLevel::Point,
            })
            .collect();
        let centroid = members
            .iter()
            .map(|m| Point::from(m.location))
            .collect::<MultiPoint<f64>>()
            .centroid();
        if let Some(centre) = centroid {
            members.push(PoiMember {
                id,
                location: centre.0,
                level: MemberLevel::Aggregate,
            });
        }
        Self { id, tags, members }
    }

    /// Members observed at node level.
    pub fn point_members(&self) -> impl Iterator<Item = &PoiMember> {
        self.members
            .iter()
            .filter(|m| m.level == MemberLevel::Point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn node_poi_has_single_point_member() {
        let poi = PointOfInterest::node(5, Coord { x: 1.0, y: 2.0 }, Tags::new());
        assert_eq!(poi.members.len(), 1);
        assert_eq!(poi.point_members().count(), 1);
    }

    #[rstest]
    fn way_without_nodes_has_no_members() {
        let poi = PointOfInterest::way(5, Tags::new(), Vec::<(u64, Coord<f64>)>::new());
        assert!(poi.members.is_empty());
    }

    #[rstest]
    fn way_adds_aggregate_member() {
        let poi = PointOfInterest::way(
            5,
            Tags::new(),
            [
                (10, Coord { x: 0.0, y: 0.0 }),
                (11, Coord { x: 0.0, y: 2.0 }),
            ],
        );
        assert_eq!(poi.members.len(), 3);
        assert_eq!(poi.point_members().count(), 2);
    }
}
