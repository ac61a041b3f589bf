//! Binding points of interest to road junctions.
//!
//! Every member observation of a POI is snapped to the network through a
//! tiered fallback:
//!
//! 1. the nearest driveable junction strictly within the radius;
//! 2. otherwise the nearest non-driveable junction strictly within the radius.
//!
//! A POI whose node-level members end up without any driveable binding is
//! then repaired: each node-level member is bound to the nearest driveable
//! junction anywhere in the network. Finally the way-level (aggregate)
//! bindings are discarded; they only take part in the tiered search.

use std::collections::BTreeMap;

use log::{debug, info, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::{JunctionClass, JunctionId, RoutingNetwork};
use crate::poi::{MemberLevel, PoiId, PoiMember, PointOfInterest};

/// Default snapping radius in planar metres.
pub const DEFAULT_BINDING_RADIUS: f64 = 120.0;

/// How a binding was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BindingTier {
    /// Nearest driveable junction within the radius.
    DriveableNearest,
    /// Nearest non-driveable junction within the radius.
    NonDriveableNearest,
    /// Nearest driveable junction anywhere, added by the repair pass.
    NearestDriveable,
}

impl BindingTier {
    /// Whether the bound junction is driveable.
    #[must_use]
    pub const fn is_driveable(self) -> bool {
        matches!(self, Self::DriveableNearest | Self::NearestDriveable)
    }
}

/// A POI member snapped to a junction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Binding {
    /// Bound POI.
    pub poi: PoiId,
    /// Member that was snapped.
    pub member: u64,
    /// Level of that member.
    pub level: MemberLevel,
    /// Junction it was snapped to.
    pub junction: JunctionId,
    /// Planar distance in metres.
    pub distance: f64,
    /// How the junction was chosen.
    pub tier: BindingTier,
}

/// Bindings grouped by POI.
///
/// POIs that were bound but received no binding are still recorded, so
/// callers can tell an unbindable POI from an unknown one.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BindingSet {
    by_poi: BTreeMap<PoiId, Vec<Binding>>,
}

impl BindingSet {
    /// Bindings of `poi`, or `None` when the POI was never bound.
    #[must_use]
    pub fn for_poi(&self, poi: PoiId) -> Option<&[Binding]> {
        self.by_poi.get(&poi).map(Vec::as_slice)
    }

    /// Whether `poi` went through the binder.
    #[must_use]
    pub fn contains_poi(&self, poi: PoiId) -> bool {
        self.by_poi.contains_key(&poi)
    }

    /// Every binding, grouped by ascending POI id.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.by_poi.values().flatten()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_poi.values().map(Vec::len).sum()
    }

    /// Whether there are no bindings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of POIs recorded.
    #[must_use]
    pub fn poi_count(&self) -> usize {
        self.by_poi.len()
    }

    fn insert(&mut self, poi: PoiId, bindings: Vec<Binding>) {
        self.by_poi.entry(poi).or_default().extend(bindings);
    }
}

/// Tunables for [`PoiBinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinderConfig {
    /// Search radius in planar metres; junctions at exactly this distance
    /// are out of range.
    pub radius: f64,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BINDING_RADIUS,
        }
    }
}

/// Snaps POIs to junctions of a [`RoutingNetwork`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PoiBinder {
    config: BinderConfig,
}

impl PoiBinder {
    /// Create a binder with the given configuration.
    #[must_use]
    pub const fn new(config: BinderConfig) -> Self {
        Self { config }
    }

    /// Bind every POI in `pois`.
    #[must_use]
    pub fn bind(&self, network: &RoutingNetwork, pois: &[PointOfInterest]) -> BindingSet {
        let mut set = BindingSet::default();
        let mut repaired = 0_usize;
        let can_repair = network.has_driveable_junctions();
        if !can_repair && !pois.is_empty() {
            warn!("network has no driveable junctions; skipping repair");
        }
        for poi in pois {
            let mut bindings: Vec<Binding> = poi
                .members
                .iter()
                .filter_map(|member| self.nearest_within_radius(network, poi.id, member))
                .collect();

            let has_driveable = bindings
                .iter()
                .any(|b| b.level == MemberLevel::Point && b.tier.is_driveable());
            if !has_driveable && can_repair {
                let before = bindings.len();
                bindings.extend(
                    poi.point_members()
                        .filter_map(|member| repair(network, poi.id, member)),
                );
                if bindings.len() > before {
                    repaired += 1;
                }
            }

            bindings.retain(|b| b.level == MemberLevel::Point);
            if bindings.is_empty() {
                debug!("poi {} has no binding", poi.id);
            }
            set.insert(poi.id, bindings);
        }
        info!(
            "bound {} pois with {} bindings ({repaired} repaired)",
            set.poi_count(),
            set.len()
        );
        set
    }

    fn nearest_within_radius(
        &self,
        network: &RoutingNetwork,
        poi: PoiId,
        member: &PoiMember,
    ) -> Option<Binding> {
        let radius = Some(self.config.radius);
        if !member.location.x.is_finite() || !member.location.y.is_finite() {
            debug!("poi {poi} member {} has no finite location", member.id);
            return None;
        }
        let (junction, distance, tier) = network
            .nearest_junction(member.location, JunctionClass::Driveable, radius)
            .map(|(j, d)| (j, d, BindingTier::DriveableNearest))
            .or_else(|| {
                network
                    .nearest_junction(member.location, JunctionClass::NonDriveable, radius)
                    .map(|(j, d)| (j, d, BindingTier::NonDriveableNearest))
            })?;
        Some(Binding {
            poi,
            member: member.id,
            level: member.level,
            junction,
            distance,
            tier,
        })
    }
}

fn repair(network: &RoutingNetwork, poi: PoiId, member: &PoiMember) -> Option<Binding> {
    let (junction, distance) =
        network.nearest_junction(member.location, JunctionClass::Driveable, None)?;
    Some(Binding {
        poi,
        member: member.id,
        level: member.level,
        junction,
        distance,
        tier: BindingTier::NearestDriveable,
    })
}
