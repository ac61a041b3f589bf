//! Core engine for the Waymesh multi-modal transport graph.
//!
//! The crate covers four stages:
//!
//! - [`SpatialJoin`] relates footways, cycleways and crossings to street
//!   junctions and records the links as a [`LinkSet`].
//! - [`Augmenter`] turns a raw [`RoadGraph`] into a symmetric
//!   [`RoutingNetwork`] with canonical driveability flags and a dual graph of
//!   road sections.
//! - [`PoiBinder`] snaps points of interest to nearby junctions.
//! - [`Router`] resolves candidate junction pairs for two POIs and lets a
//!   [`PathSelector`] pick the cheapest path under a [`Metric`].
//!
//! All coordinates are WGS84 with `x = lon` and `y = lat`. Distances are
//! measured in metres after projecting into a [`PlanarFrame`].

#![forbid(unsafe_code)]

mod augment;
mod binding;
mod candidates;
mod feature;
pub mod geometry;
mod join;
mod network;
mod poi;
mod router;
mod search;
mod selector;
#[cfg(feature = "serde")]
mod store;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

pub use augment::{AugmentReport, Augmented, Augmenter};
pub use binding::{
    BinderConfig, Binding, BindingSet, BindingTier, DEFAULT_BINDING_RADIUS, PoiBinder,
};
pub use candidates::{
    Candidate, CandidateResolver, DEFAULT_CANDIDATE_THRESHOLD, ResolverConfig, normalize,
};
pub use feature::{Feature, FeatureGeometry, FeatureId, FeatureKind, Tags};
pub use geometry::{
    LocalMetric, PlanarFrame, Projection, ProjectionChoice, WebMercator, planar_distance,
};
pub use join::{
    AdjacencyRecord, JoinError, JoinPass, JoinPredicate, Link, LinkEnd, LinkKind, LinkSet,
    Neighbour, SpatialJoin,
};
pub use network::{
    EdgeInput, EdgeStatistics, EdgeStatus, FlagValue, JunctionClass, JunctionId, JunctionInput,
    NetworkError, RawEdge, RoadGraph, RoadJunction, RoadSection, RoadSectionGraph, RouteEdge,
    RoutingNetwork, SharedJunction, Spread,
};
pub use poi::{MemberLevel, PoiId, PoiMember, PointOfInterest};
pub use router::{RouteError, Router};
pub use search::{Metric, ParseMetricError, PathHit, PathSearch, SearchError};
pub use selector::{PathSelector, RouteOutcome, SelectError, SelectedPath, SelectorState, select_path};
#[cfg(feature = "serde")]
pub use store::{SnapshotError, SnapshotWriteError, load_network_snapshot, write_network_snapshot};
