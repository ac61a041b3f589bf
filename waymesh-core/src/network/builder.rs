//! Raw road graph as loaded from a network file, before augmentation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use geo::Coord;
use petgraph::graph::{DiGraph, NodeIndex};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EdgeStatus, JunctionId, RoadJunction};

/// Errors raised while assembling a road graph.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    /// A junction id was added twice.
    #[error("junction {id} is already present")]
    DuplicateJunction {
        /// Repeated junction id.
        id: JunctionId,
    },
    /// An edge referenced a junction that does not exist.
    #[error("edge {from} -> {to} references unknown junction {missing}")]
    UnknownJunction {
        /// Edge origin.
        from: JunctionId,
        /// Edge destination.
        to: JunctionId,
        /// The endpoint that could not be found.
        missing: JunctionId,
    },
    /// A junction location was not a finite coordinate.
    #[error("junction {id} has an invalid location")]
    InvalidLocation {
        /// Offending junction.
        id: JunctionId,
    },
    /// An edge length or traffic volume was negative or not finite.
    #[error("edge {from} -> {to} has invalid {field} {value}")]
    InvalidMeasure {
        /// Edge origin.
        from: JunctionId,
        /// Edge destination.
        to: JunctionId,
        /// Which attribute failed validation.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// An edge status string was not recognised.
    #[error("unknown edge status `{value}`")]
    UnknownStatus {
        /// Rejected status text.
        value: String,
    },
}

impl FromStr for EdgeStatus {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("active") {
            Ok(Self::Active)
        } else if s.eq_ignore_ascii_case("inactive") {
            Ok(Self::Inactive)
        } else {
            Err(NetworkError::UnknownStatus {
                value: s.to_owned(),
            })
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        })
    }
}

/// Driveability flag as found in source data.
///
/// Sources disagree on how they spell booleans, so the flag is kept raw until
/// the augmenter canonicalises it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum FlagValue {
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Number(f64),
    /// JSON string.
    Text(String),
}

impl FlagValue {
    /// Canonical boolean for this flag, or `None` when the value is not a
    /// recognised spelling.
    ///
    /// # Examples
    /// ```
    /// use waymesh_core::FlagValue;
    ///
    /// assert_eq!(FlagValue::Text("yes".into()).to_bool(), Some(true));
    /// assert_eq!(FlagValue::Number(0.0).to_bool(), Some(false));
    /// assert_eq!(FlagValue::Text("maybe".into()).to_bool(), None);
    /// ```
    #[must_use]
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Number(value) if *value == 1.0 => Some(true),
            Self::Number(value) if *value == 0.0 => Some(false),
            Self::Number(_) => None,
            Self::Text(text) => {
                let text = text.trim();
                if ["true", "yes", "1"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
                    Some(true)
                } else if ["false", "no", "0"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Junction row of a network file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JunctionInput {
    /// Junction id.
    pub id: JunctionId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Edge row of a network file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeInput {
    /// Origin junction.
    pub source: JunctionId,
    /// Destination junction.
    pub target: JunctionId,
    /// Length in metres.
    pub distance: f64,
    /// Annual average daily traffic.
    #[cfg_attr(feature = "serde", serde(default))]
    pub traffic_volume: f64,
    /// Street the edge belongs to.
    pub street_id: String,
    /// Whether the edge may be traversed.
    pub status: EdgeStatus,
    /// Raw driveability flag; absent means not driveable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub driveable: Option<FlagValue>,
    /// Street name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

/// Directed edge of a [`RoadGraph`] whose driveability is still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEdge {
    /// Length in metres.
    pub distance: f64,
    /// Annual average daily traffic.
    pub traffic_volume: f64,
    /// Street the edge belongs to.
    pub street_id: String,
    /// Whether the edge may be traversed.
    pub status: EdgeStatus,
    /// Raw driveability flag.
    pub driveable: Option<FlagValue>,
    /// Street name.
    pub name: Option<String>,
}

/// Road graph under construction.
///
/// Junctions start non-driveable; the [`crate::Augmenter`] derives their
/// driveability from the incident edges.
///
/// # Examples
/// ```
/// use waymesh_core::{EdgeInput, EdgeStatus, JunctionInput, RoadGraph};
///
/// let mut graph = RoadGraph::new();
/// graph.add_junction(JunctionInput { id: 1, lat: 45.0, lon: 9.0 })?;
/// graph.add_junction(JunctionInput { id: 2, lat: 45.001, lon: 9.0 })?;
/// graph.add_edge(EdgeInput {
///     source: 1,
///     target: 2,
///     distance: 111.0,
///     traffic_volume: 0.0,
///     street_id: "s1".into(),
///     status: EdgeStatus::Active,
///     driveable: None,
///     name: None,
/// })?;
/// assert_eq!(graph.edge_count(), 1);
/// # Ok::<(), waymesh_core::NetworkError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    pub(crate) graph: DiGraph<RoadJunction, RawEdge>,
    pub(crate) index: HashMap<JunctionId, NodeIndex>,
}

impl RoadGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a junction.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateJunction`] for a repeated id and
    /// [`NetworkError::InvalidLocation`] for non-finite coordinates.
    pub fn add_junction(&mut self, input: JunctionInput) -> Result<(), NetworkError> {
        if !(input.lat.is_finite() && input.lon.is_finite()) {
            return Err(NetworkError::InvalidLocation { id: input.id });
        }
        if self.index.contains_key(&input.id) {
            return Err(NetworkError::DuplicateJunction { id: input.id });
        }
        let node = self.graph.add_node(RoadJunction {
            id: input.id,
            location: Coord {
                x: input.lon,
                y: input.lat,
            },
            driveable: false,
        });
        self.index.insert(input.id, node);
        Ok(())
    }

    /// Add a directed edge between two known junctions.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownJunction`] for a dangling endpoint and
    /// [`NetworkError::InvalidMeasure`] for a negative or non-finite distance
    /// or traffic volume.
    pub fn add_edge(&mut self, input: EdgeInput) -> Result<(), NetworkError> {
        let (from, to) = (input.source, input.target);
        for (field, value) in [
            ("distance", input.distance),
            ("traffic_volume", input.traffic_volume),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(NetworkError::InvalidMeasure {
                    from,
                    to,
                    field,
                    value,
                });
            }
        }
        let lookup = |missing: JunctionId| {
            self.index
                .get(&missing)
                .copied()
                .ok_or(NetworkError::UnknownJunction { from, to, missing })
        };
        let a = lookup(from)?;
        let b = lookup(to)?;
        self.graph.add_edge(
            a,
            b,
            RawEdge {
                distance: input.distance,
                traffic_volume: input.traffic_volume,
                street_id: input.street_id,
                status: input.status,
                driveable: input.driveable,
                name: input.name,
            },
        );
        Ok(())
    }

    /// Number of junctions.
    #[must_use]
    pub fn junction_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
