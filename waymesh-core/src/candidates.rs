//! Candidate junction pairs for a POI-to-POI route.

use std::collections::{BTreeMap, HashSet};

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::binding::{Binding, BindingSet};
use crate::network::{JunctionId, RoutingNetwork};
use crate::poi::PoiId;

/// Default cut-off for the summed normalised snapping distance.
pub const DEFAULT_CANDIDATE_THRESHOLD: f64 = 0.1;

/// A pair of junctions to search a path between.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    /// Junction bound to the source POI.
    pub junction_source: JunctionId,
    /// Junction bound to the target POI.
    pub junction_target: JunctionId,
    /// Snapping distance on the source side, in metres.
    pub distance_source: f64,
    /// Snapping distance on the target side, in metres.
    pub distance_target: f64,
    /// `distance_source` min-max normalised over all raw candidates.
    pub normalized_source: f64,
    /// `distance_target` min-max normalised over all raw candidates.
    pub normalized_target: f64,
    /// `normalized_source + normalized_target`.
    pub sum_distance: f64,
}

/// Tunables for [`CandidateResolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolverConfig {
    /// Candidates with `sum_distance` at or above this value are dropped.
    pub threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CANDIDATE_THRESHOLD,
        }
    }
}

/// Min-max normalise `values` into `[0, 1]`.
///
/// When every value is equal the result is all zeros.
///
/// # Examples
/// ```
/// use waymesh_core::normalize;
///
/// let scaled = normalize(&[1.0, 5.0, 10.0]);
/// assert_eq!(scaled, vec![0.0, 4.0 / 9.0, 1.0]);
/// assert_eq!(normalize(&[3.0, 3.0]), vec![0.0, 0.0]);
/// ```
#[must_use]
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = max - min;
    values
        .iter()
        .map(|v| if width > 0.0 { (v - min) / width } else { 0.0 })
        .collect()
}

/// Builds the ranked candidate list for a route query.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateResolver {
    config: ResolverConfig,
}

impl CandidateResolver {
    /// Create a resolver with the given configuration.
    #[must_use]
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Candidates between the bindings of `source` and `target`.
    ///
    /// A POI without bindings yields no candidates.
    #[must_use]
    pub fn resolve(
        &self,
        network: &RoutingNetwork,
        bindings: &BindingSet,
        source: PoiId,
        target: PoiId,
    ) -> Vec<Candidate> {
        self.resolve_bindings(
            network,
            bindings.for_poi(source).unwrap_or_default(),
            bindings.for_poi(target).unwrap_or_default(),
        )
    }

    /// Candidates between two explicit binding lists.
    ///
    /// Source bindings need an active edge leaving their junction and target
    /// bindings an active edge arriving at theirs. The result is sorted by
    /// ascending `sum_distance`, then junction ids.
    #[must_use]
    pub fn resolve_bindings(
        &self,
        network: &RoutingNetwork,
        source: &[Binding],
        target: &[Binding],
    ) -> Vec<Candidate> {
        let sources: Vec<_> = source
            .iter()
            .filter(|b| network.has_outgoing_active(b.junction))
            .collect();
        let targets: Vec<_> = target
            .iter()
            .filter(|b| network.has_incoming_active(b.junction))
            .collect();

        let mut seen = HashSet::new();
        let raw: Vec<(JunctionId, JunctionId, f64, f64)> = sources
            .iter()
            .flat_map(|s| {
                targets
                    .iter()
                    .map(move |t| (s.junction, t.junction, s.distance, t.distance))
            })
            .filter(|(js, jt, ds, dt)| seen.insert((*js, *jt, ds.to_bits(), dt.to_bits())))
            .collect();

        let norm_source = normalize(&raw.iter().map(|c| c.2).collect::<Vec<_>>());
        let norm_target = normalize(&raw.iter().map(|c| c.3).collect::<Vec<_>>());

        let mut best: BTreeMap<(JunctionId, JunctionId), Candidate> = BTreeMap::new();
        for ((junction_source, junction_target, distance_source, distance_target), (ns, nt)) in
            raw.into_iter().zip(norm_source.into_iter().zip(norm_target))
        {
            let candidate = Candidate {
                junction_source,
                junction_target,
                distance_source,
                distance_target,
                normalized_source: ns,
                normalized_target: nt,
                sum_distance: ns + nt,
            };
            best.entry((junction_source, junction_target))
                .and_modify(|kept| {
                    if candidate.sum_distance < kept.sum_distance {
                        *kept = candidate.clone();
                    }
                })
                .or_insert_with(|| candidate.clone());
        }

        let mut ranked: Vec<Candidate> = best
            .into_values()
            .filter(|c| c.sum_distance < self.config.threshold)
            .collect();
        ranked.sort_by(|a, b| {
            a.sum_distance
                .total_cmp(&b.sum_distance)
                .then(a.junction_source.cmp(&b.junction_source))
                .then(a.junction_target.cmp(&b.junction_target))
        });
        debug!(
            "{} source and {} target bindings gave {} candidates",
            sources.len(),
            targets.len(),
            ranked.len()
        );
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingTier;
    use crate::poi::MemberLevel;
    use crate::test_support::{NetworkFixture, edge};
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    fn binding(junction: JunctionId, distance: f64) -> Binding {
        Binding {
            poi: 0,
            member: 0,
            level: MemberLevel::Point,
            junction,
            distance,
            tier: BindingTier::DriveableNearest,
        }
    }

    /// Two-way chain 1 - 2 - 3 - 4.
    #[fixture]
    fn chain() -> RoutingNetwork {
        NetworkFixture::new()
            .junction(1, 0.0, 0.0)
            .junction(2, 0.0, 0.001)
            .junction(3, 0.0, 0.002)
            .junction(4, 0.0, 0.003)
            .edge(edge(1, 2, 10.0))
            .edge(edge(2, 3, 10.0))
            .edge(edge(3, 4, 10.0))
            .network()
    }

    #[rstest]
    fn normalisation_of_one_five_ten() {
        let scaled = normalize(&[1.0, 5.0, 10.0]);
        assert_eq!(scaled.first().copied(), Some(0.0));
        assert!(scaled.get(1).is_some_and(|v| (v - 4.0 / 9.0).abs() < 1e-12));
        assert_eq!(scaled.get(2).copied(), Some(1.0));
    }

    #[rstest]
    fn normalisation_of_empty_input_is_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[rstest]
    fn degenerate_candidates_all_pass(chain: RoutingNetwork) {
        let found = CandidateResolver::default().resolve_bindings(
            &chain,
            &[binding(1, 5.0), binding(2, 5.0)],
            &[binding(3, 7.0)],
        );
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.sum_distance == 0.0));
        assert_eq!(found.first().map(|c| c.junction_source), Some(1));
    }

    #[rstest]
    fn threshold_drops_distant_pairs(chain: RoutingNetwork) {
        let found = CandidateResolver::default().resolve_bindings(
            &chain,
            &[binding(1, 1.0), binding(2, 100.0)],
            &[binding(3, 1.0)],
        );
        let pairs: Vec<_> = found
            .iter()
            .map(|c| (c.junction_source, c.junction_target))
            .collect();
        assert_eq!(pairs, vec![(1, 3)]);
    }

    #[rstest]
    fn exact_duplicates_do_not_skew_normalisation(chain: RoutingNetwork) {
        let resolver = CandidateResolver::new(ResolverConfig { threshold: 2.0 });
        let once = resolver.resolve_bindings(
            &chain,
            &[binding(1, 1.0), binding(2, 3.0)],
            &[binding(3, 1.0)],
        );
        let twice = resolver.resolve_bindings(
            &chain,
            &[binding(1, 1.0), binding(1, 1.0), binding(2, 3.0)],
            &[binding(3, 1.0)],
        );
        assert_eq!(once, twice);
    }

    #[rstest]
    fn grouping_keeps_minimum_per_pair(chain: RoutingNetwork) {
        let resolver = CandidateResolver::new(ResolverConfig { threshold: 2.0 });
        let found = resolver.resolve_bindings(
            &chain,
            &[binding(1, 2.0), binding(1, 1.0), binding(2, 5.0)],
            &[binding(3, 1.0)],
        );
        let for_one: Vec<_> = found.iter().filter(|c| c.junction_source == 1).collect();
        assert_eq!(for_one.len(), 1);
        assert!(for_one.first().is_some_and(|c| c.sum_distance == 0.0));
    }

    #[rstest]
    fn junctions_without_active_edges_are_ignored() {
        let network = NetworkFixture::new()
            .junction(1, 0.0, 0.0)
            .junction(2, 0.0, 0.001)
            .junction(9, 0.0, 0.002)
            .edge(edge(1, 2, 10.0))
            .network();
        let found = CandidateResolver::default().resolve_bindings(
            &network,
            &[binding(9, 1.0), binding(1, 1.0)],
            &[binding(9, 1.0), binding(2, 1.0)],
        );
        assert_eq!(found.len(), 1);
        assert_eq!(
            found.first().map(|c| (c.junction_source, c.junction_target)),
            Some((1, 2))
        );
    }

    #[rstest]
    fn unknown_poi_yields_nothing(chain: RoutingNetwork) {
        let found = CandidateResolver::default().resolve(&chain, &BindingSet::default(), 1, 2);
        assert!(found.is_empty());
    }

    proptest! {
        #[test]
        fn normalised_values_stay_in_unit_interval(
            values in proptest::collection::vec(0.0_f64..10_000.0, 1..32),
        ) {
            let scaled = normalize(&values);
            prop_assert_eq!(scaled.len(), values.len());
            prop_assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));
            prop_assert!(scaled.iter().any(|v| *v == 0.0));
        }
    }
}
