//! Choosing the cheapest path among route candidates.
//!
//! [`PathSelector`] walks the candidate list one query at a time, so callers
//! can observe progress through [`SelectorState`]. The winner minimises
//! `normalized_source + path_cost + normalized_target`; on an exact tie the
//! earlier candidate is kept.

use geo::Coord;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidates::Candidate;
use crate::network::JunctionId;
use crate::search::{Metric, PathSearch, SearchError};

/// Progress of a [`PathSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// No candidates loaded yet.
    Idle,
    /// Candidates loaded, none queried.
    CandidatesLoaded {
        /// Number of candidates.
        count: usize,
    },
    /// The candidate at this position has just been queried.
    Querying(usize),
    /// Every candidate was queried and a path was chosen.
    Selected,
    /// Every candidate was queried and none had a path.
    NoPathFound,
}

impl SelectorState {
    /// Whether the selector has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Selected | Self::NoPathFound)
    }
}

/// The chosen candidate and its path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectedPath {
    /// Winning candidate.
    pub candidate: Candidate,
    /// Path cost under the requested metric.
    pub path_cost: f64,
    /// `normalized_source + path_cost + normalized_target`.
    pub total_cost: f64,
    /// Junctions visited, source first.
    pub junctions: Vec<JunctionId>,
    /// Junction locations in visiting order (`x = lon`, `y = lat`).
    pub coordinates: Vec<Coord<f64>>,
}

/// Answer to a route query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "status", rename_all = "snake_case")
)]
pub enum RouteOutcome {
    /// A path was found.
    Found(SelectedPath),
    /// No candidate had a path.
    NoPath,
}

/// Errors raised while selecting a path.
#[derive(Debug, Error, PartialEq)]
pub enum SelectError {
    /// The path search backend failed; the query is abandoned.
    #[error("path search failed for {junction_source} -> {junction_target}")]
    Backend {
        /// Source junction of the failing query.
        junction_source: JunctionId,
        /// Target junction of the failing query.
        junction_target: JunctionId,
        /// Backend error.
        #[source]
        source: SearchError,
    },
    /// An operation was attempted in a state that does not allow it.
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        /// State at the time of the call.
        state: SelectorState,
        /// Rejected operation.
        action: &'static str,
    },
}

/// Step-wise path selection over a candidate list.
pub struct PathSelector<'a, S: PathSearch + ?Sized> {
    search: &'a S,
    metric: Metric,
    candidates: Vec<Candidate>,
    state: SelectorState,
    best: Option<SelectedPath>,
}

impl<'a, S: PathSearch + ?Sized> PathSelector<'a, S> {
    /// Create an idle selector querying `search` under `metric`.
    pub const fn new(search: &'a S, metric: Metric) -> Self {
        Self {
            search,
            metric,
            candidates: Vec::new(),
            state: SelectorState::Idle,
            best: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SelectorState {
        self.state
    }

    /// Load the candidates to evaluate, in priority order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::InvalidTransition`] unless the selector is idle.
    pub fn load(&mut self, candidates: Vec<Candidate>) -> Result<(), SelectError> {
        if self.state != SelectorState::Idle {
            return Err(self.invalid("load candidates"));
        }
        self.state = SelectorState::CandidatesLoaded {
            count: candidates.len(),
        };
        self.candidates = candidates;
        Ok(())
    }

    /// Query the next candidate, or finish once all have been queried.
    ///
    /// Stepping a finished selector leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::InvalidTransition`] before [`Self::load`] and
    /// [`SelectError::Backend`] when the path search fails.
    pub fn step(&mut self) -> Result<SelectorState, SelectError> {
        let next = match self.state {
            SelectorState::Idle => return Err(self.invalid("step")),
            SelectorState::Selected | SelectorState::NoPathFound => return Ok(self.state),
            SelectorState::CandidatesLoaded { .. } => 0,
            SelectorState::Querying(done) => done + 1,
        };
        self.state = match self.candidates.get(next) {
            Some(candidate) => {
                let candidate = candidate.clone();
                self.query(candidate)?;
                SelectorState::Querying(next)
            }
            None if self.best.is_some() => SelectorState::Selected,
            None => SelectorState::NoPathFound,
        };
        Ok(self.state)
    }

    /// Step until finished and return the outcome.
    ///
    /// # Errors
    ///
    /// See [`Self::step`].
    pub fn run(mut self) -> Result<RouteOutcome, SelectError> {
        while !self.step()?.is_terminal() {}
        Ok(self
            .best
            .map_or(RouteOutcome::NoPath, RouteOutcome::Found))
    }

    fn query(&mut self, candidate: Candidate) -> Result<(), SelectError> {
        let (from, to) = (candidate.junction_source, candidate.junction_target);
        let hit = self
            .search
            .shortest_path(from, to, self.metric)
            .map_err(|source| SelectError::Backend {
                junction_source: from,
                junction_target: to,
                source,
            })?;
        let Some(hit) = hit else {
            debug!("candidate {from} -> {to}: no path");
            return Ok(());
        };
        let total_cost = candidate.normalized_source + hit.cost + candidate.normalized_target;
        debug!("candidate {from} -> {to}: total cost {total_cost}");
        if self.best.as_ref().is_none_or(|best| total_cost < best.total_cost) {
            self.best = Some(SelectedPath {
                candidate,
                path_cost: hit.cost,
                total_cost,
                junctions: hit.junctions,
                coordinates: hit.coordinates,
            });
        }
        Ok(())
    }

    const fn invalid(&self, action: &'static str) -> SelectError {
        SelectError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}

/// Evaluate `candidates` in order and return the cheapest route.
///
/// # Errors
///
/// Returns [`SelectError::Backend`] when the path search fails.
pub fn select_path<S: PathSearch + ?Sized>(
    search: &S,
    candidates: Vec<Candidate>,
    metric: Metric,
) -> Result<RouteOutcome, SelectError> {
    let mut selector = PathSelector::new(search, metric);
    selector.load(candidates)?;
    selector.run()
}
