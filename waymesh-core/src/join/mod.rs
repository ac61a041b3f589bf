//! Proximity joins between independent feature sets.
//!
//! A join projects both sets into a shared planar frame, indexes the target
//! envelopes in an R\*-tree and records, for every source feature, the target
//! features lying within a fixed radius. Records keep feature ids only, so
//! the geometries themselves never leave the geographic CRS.

mod links;

use std::collections::{BTreeMap, HashSet};

use geo::{Coord, Rect};
use log::{debug, info, warn};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{PlanarFrame, Projection, ProjectionChoice, merge_bounds, planar_distance};
use crate::{Feature, FeatureGeometry, FeatureId, FeatureKind};

pub use links::{Link, LinkEnd, LinkKind, LinkSet};

type TargetEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Geometric predicate evaluated on buffered source geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum JoinPredicate {
    /// The target lies within the radius of the source.
    #[default]
    Intersects,
}

/// Errors returned by [`SpatialJoin::matches`].
#[derive(Debug, Error, PartialEq)]
pub enum JoinError {
    /// The buffer radius was negative or not finite.
    #[error("join radius must be a finite, non-negative number of metres, got {radius}")]
    InvalidRadius {
        /// Offending radius.
        radius: f64,
    },
}

/// A target matched by a join, with its planar distance to the source.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Neighbour {
    /// Identifier of the matched target feature.
    pub id: FeatureId,
    /// Planar distance in metres between source and target.
    pub distance: f64,
}

/// Output of one join: source id to ordered, de-duplicated neighbours.
///
/// Every source feature has an entry, possibly empty.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdjacencyRecord {
    entries: BTreeMap<FeatureId, Vec<Neighbour>>,
}

impl AdjacencyRecord {
    /// Neighbours recorded for `source`, or `None` when `source` was not part
    /// of the join.
    #[must_use]
    pub fn neighbours(&self, source: &FeatureId) -> Option<&[Neighbour]> {
        self.entries.get(source).map(Vec::as_slice)
    }

    /// Neighbour ids recorded for `source`, in target input order.
    #[must_use]
    pub fn neighbour_ids(&self, source: &FeatureId) -> Vec<FeatureId> {
        self.neighbours(source)
            .map(|found| found.iter().map(|n| n.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Iterate over `(source, neighbours)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &[Neighbour])> {
        self.entries.iter().map(|(id, found)| (id, found.as_slice()))
    }

    /// Number of source features recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the join had no source features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of source/target matches.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    fn record(&mut self, source: &FeatureId, found: Vec<Neighbour>) {
        let slot = self.entries.entry(source.clone()).or_default();
        for neighbour in found {
            if !slot.iter().any(|n| n.id == neighbour.id) {
                slot.push(neighbour);
            }
        }
    }
}

/// Proximity join engine.
///
/// # Examples
/// ```
/// use waymesh_core::{Feature, FeatureId, JoinPredicate, SpatialJoin};
///
/// let crossing = [Feature::point(1_u64, 9.19, 45.46)];
/// let footways = [Feature::line(7_u64, &[(9.19, 45.46), (9.191, 45.46)])];
/// let record = SpatialJoin::default()
///     .matches(&crossing, &footways, 10.0, JoinPredicate::Intersects)?;
/// assert_eq!(record.neighbour_ids(&FeatureId::from(1_u64)), vec![FeatureId::from(7_u64)]);
/// # Ok::<(), waymesh_core::JoinError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialJoin {
    projection: ProjectionChoice,
}

impl SpatialJoin {
    /// Create a join engine using the given planar frame.
    #[must_use]
    pub const fn new(projection: ProjectionChoice) -> Self {
        Self { projection }
    }

    /// Record, for every feature in `source`, the features of `target` within
    /// `radius` planar metres.
    ///
    /// Neighbours are listed in target input order. Features whose geometry
    /// is empty are skipped with a warning; an empty source geometry still
    /// yields an empty entry.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::InvalidRadius`] when `radius` is negative or not
    /// finite.
    pub fn matches(
        &self,
        source: &[Feature],
        target: &[Feature],
        radius: f64,
        predicate: JoinPredicate,
    ) -> Result<AdjacencyRecord, JoinError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(JoinError::InvalidRadius { radius });
        }
        let frame = self.frame_for(source, target);
        let projected: Vec<Option<FeatureGeometry>> = target
            .iter()
            .map(|feature| project_non_empty(&frame, feature))
            .collect();
        let tree = RTree::bulk_load(
            projected
                .iter()
                .enumerate()
                .filter_map(|(index, geometry)| {
                    let bounds = geometry.as_ref()?.bounds()?;
                    Some(TargetEnvelope::new(
                        Rectangle::from_corners(corner(bounds.min()), corner(bounds.max())),
                        index,
                    ))
                })
                .collect(),
        );

        let mut record = AdjacencyRecord::default();
        for feature in source {
            let found = project_non_empty(&frame, feature)
                .map(|geometry| {
                    nearby(&tree, &geometry, radius)
                        .into_iter()
                        .filter_map(|index| {
                            let candidate = target.get(index)?;
                            let candidate_geometry = projected.get(index)?.as_ref()?;
                            let distance = planar_distance(&geometry, candidate_geometry);
                            predicate.holds(distance, radius).then(|| Neighbour {
                                id: candidate.id.clone(),
                                distance,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            record.record(&feature.id, found);
        }
        debug!(
            "joined {} source against {} target features within {radius} m: {} matches",
            source.len(),
            target.len(),
            record.match_count()
        );
        Ok(record)
    }

    fn frame_for(&self, source: &[Feature], target: &[Feature]) -> PlanarFrame {
        let bounds = source
            .iter()
            .chain(target)
            .fold(None, |acc, feature| merge_bounds(acc, feature.geometry.bounds()));
        self.projection.frame_for(bounds)
    }
}

impl JoinPredicate {
    fn holds(self, distance: f64, radius: f64) -> bool {
        match self {
            Self::Intersects => distance <= radius,
        }
    }
}

fn corner(coord: Coord<f64>) -> [f64; 2] {
    [coord.x, coord.y]
}

fn project_non_empty(frame: &PlanarFrame, feature: &Feature) -> Option<FeatureGeometry> {
    if feature.geometry.bounds().is_none() {
        warn!("skipping feature {} with empty geometry", feature.id);
        return None;
    }
    Some(frame.project_geometry(&feature.geometry))
}

/// Target indices whose envelope meets the source envelope grown by `radius`,
/// sorted into input order and de-duplicated.
fn nearby(tree: &RTree<TargetEnvelope>, geometry: &FeatureGeometry, radius: f64) -> Vec<usize> {
    let Some(bounds) = geometry.bounds() else {
        return Vec::new();
    };
    let grown = grow(bounds, radius);
    let envelope = AABB::from_corners(corner(grown.min()), corner(grown.max()));
    let mut seen = HashSet::new();
    let mut hits: Vec<usize> = tree
        .locate_in_envelope_intersecting(&envelope)
        .map(|entry| entry.data)
        .filter(|index| seen.insert(*index))
        .collect();
    hits.sort_unstable();
    hits
}

fn grow(bounds: Rect<f64>, radius: f64) -> Rect<f64> {
    let delta = Coord {
        x: radius,
        y: radius,
    };
    Rect::new(bounds.min() - delta, bounds.max() + delta)
}

/// Fixed join between two feature families, with its radius and the property
/// name it writes on the source features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum JoinPass {
    /// Crossing nodes to the footways within 10 m.
    CrossingNodesToFootways,
    /// Cycleways to the street nodes within 2 m.
    CyclewaysToStreetNodes,
    /// Footways to the street nodes within 2 m.
    FootwaysToStreetNodes,
    /// Crossing ways to the street nodes within 2 m.
    CrossingWaysToStreetNodes,
    /// Footways to the cycleways they touch.
    FootwaysTouchingLanes,
}

impl JoinPass {
    /// Every pass, in the order the pipeline runs them.
    pub const ALL: [Self; 5] = [
        Self::CrossingNodesToFootways,
        Self::CyclewaysToStreetNodes,
        Self::FootwaysToStreetNodes,
        Self::CrossingWaysToStreetNodes,
        Self::FootwaysTouchingLanes,
    ];

    /// Buffer radius in planar metres.
    #[must_use]
    pub const fn radius(self) -> f64 {
        match self {
            Self::CrossingNodesToFootways => 10.0,
            Self::CyclewaysToStreetNodes
            | Self::FootwaysToStreetNodes
            | Self::CrossingWaysToStreetNodes => 2.0,
            Self::FootwaysTouchingLanes => 0.0,
        }
    }

    /// Property added to each source feature.
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::CrossingNodesToFootways => "closest_footways",
            Self::CyclewaysToStreetNodes => "bike_cross",
            Self::FootwaysToStreetNodes => "foot_cross",
            Self::CrossingWaysToStreetNodes => "junction_crosses",
            Self::FootwaysTouchingLanes => "touched_lanes",
        }
    }

    /// Family of the features that receive the property.
    #[must_use]
    pub const fn source_kind(self) -> FeatureKind {
        match self {
            Self::CrossingNodesToFootways => FeatureKind::CrossingNode,
            Self::CyclewaysToStreetNodes => FeatureKind::Cycleway,
            Self::FootwaysToStreetNodes | Self::FootwaysTouchingLanes => FeatureKind::Footway,
            Self::CrossingWaysToStreetNodes => FeatureKind::CrossingWay,
        }
    }

    /// Family of the features being searched.
    #[must_use]
    pub const fn target_kind(self) -> FeatureKind {
        match self {
            Self::CrossingNodesToFootways => FeatureKind::Footway,
            Self::FootwaysTouchingLanes => FeatureKind::Cycleway,
            Self::CyclewaysToStreetNodes
            | Self::FootwaysToStreetNodes
            | Self::CrossingWaysToStreetNodes => FeatureKind::StreetNode,
        }
    }

    /// Run this pass with its designated radius.
    ///
    /// # Errors
    ///
    /// Propagates [`JoinError`] from [`SpatialJoin::matches`].
    pub fn run(
        self,
        join: &SpatialJoin,
        source: &[Feature],
        target: &[Feature],
    ) -> Result<AdjacencyRecord, JoinError> {
        let record = join.matches(source, target, self.radius(), JoinPredicate::Intersects)?;
        info!(
            "{}: {} of {} features matched",
            self.property(),
            record.iter().filter(|(_, found)| !found.is_empty()).count(),
            record.len()
        );
        Ok(record)
    }
}
