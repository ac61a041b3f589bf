//! Facade crate for the waymesh multi-modal street network engine.
//!
//! This crate re-exports the core routing types and exposes the file loaders
//! and snapshot store behind feature flags.

#![forbid(unsafe_code)]

pub use waymesh_core::{
    AdjacencyRecord, Augmented, Augmenter, BinderConfig, Binding, BindingSet, BindingTier,
    Candidate, CandidateResolver, Feature, FeatureGeometry, FeatureId, FeatureKind, JoinError,
    JoinPass, JoinPredicate, Link, LinkKind, LinkSet, Metric, PathSearch, PathSelector, PoiBinder,
    PoiId, PointOfInterest, ResolverConfig, RoadGraph, RoadSectionGraph, RouteError,
    RouteOutcome, Router, RoutingNetwork, SearchError, SelectError, SelectedPath, SpatialJoin,
};

#[cfg(feature = "serde")]
pub use waymesh_core::{SnapshotError, SnapshotWriteError, load_network_snapshot, write_network_snapshot};

#[cfg(feature = "data")]
pub use waymesh_data::{
    FeatureFamilies, read_features, read_network, read_pois, run_passes, write_annotated,
    write_sections,
};
