//! Accept/reject conflict resolution (§4.5): a handful of states can end up labelled as
//! both accepting and rejecting once register-hit merges fold multiple original APTA
//! leaves together. Each [`ConflictResolutionStrategy`] decides, per conflicted state,
//! which single label survives before the SMT encoder ever sees the automaton.

use drta_core::config::ConflictResolutionStrategy;
use drta_core::trace::TimedTrace;

use crate::drta::Drta;
use crate::min3rta::{Min3Rta, NodeId};

/// The empirical multiplier used by [`ConflictResolutionStrategy::ByTimePattern`]: a
/// state resolves to accepting only if the mean second-event timestamp of the positive
/// traces reaching it exceeds this multiple of the mean for the negative traces.
const TIME_PATTERN_RATIO: f64 = 1.5;

fn reaching<'a, 'b>(
    rta: &'b Min3Rta,
    traces: &'a [TimedTrace],
    target: NodeId,
) -> impl Iterator<Item = &'a TimedTrace> + use<'a, 'b> {
    traces.iter().filter(move |t| rta.trace_reaches(t, target))
}

fn mean_second_timestamp<'a>(traces: impl Iterator<Item = &'a TimedTrace>) -> Option<f64> {
    let values: Vec<f64> = traces.filter(|t| t.len() >= 2).map(|t| t.0[1].time).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn resolve_by_time_pattern(rta: &Min3Rta, state: NodeId) -> bool {
    let mu_pos = mean_second_timestamp(reaching(rta, rta.positive_samples(), state));
    let mu_neg = mean_second_timestamp(reaching(rta, rta.negative_samples(), state));
    match (mu_pos, mu_neg) {
        (Some(p), Some(n)) if n > 0.0 => p > TIME_PATTERN_RATIO * n,
        (Some(p), Some(n)) if n == 0.0 => p > 0.0,
        (Some(_), Some(_)) => unreachable!("mean timestamps are always finite non-negative"),
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => resolve_by_majority(rta, state),
    }
}

fn resolve_by_majority(rta: &Min3Rta, state: NodeId) -> bool {
    let positives = reaching(rta, rta.positive_samples(), state).count();
    let negatives = reaching(rta, rta.negative_samples(), state).count();
    positives >= negatives
}

/// Decides, for a single conflicted state, whether it should end up accepting (`true`)
/// or rejecting (`false`).
fn resolve_one(rta: &Min3Rta, state: NodeId, strategy: ConflictResolutionStrategy) -> bool {
    match strategy {
        ConflictResolutionStrategy::ByTimePattern => resolve_by_time_pattern(rta, state),
        ConflictResolutionStrategy::ByMajority => resolve_by_majority(rta, state),
        ConflictResolutionStrategy::StrictRejectOnConflict => false,
    }
}

/// Resolves every conflicted state in `drta` in place, leaving `accepting` and
/// `rejecting` disjoint. Returns the states that were resolved, for logging/reporting.
pub fn resolve_conflicts(
    drta: &mut Drta,
    rta: &Min3Rta,
    strategy: ConflictResolutionStrategy,
) -> Vec<(NodeId, bool)> {
    let conflicted = drta.conflicted_states();
    let mut resolutions = Vec::with_capacity(conflicted.len());
    for state in conflicted {
        let accept = resolve_one(rta, state, strategy);
        if accept {
            drta.rejecting.remove(&state);
        } else {
            drta.accepting.remove(&state);
        }
        resolutions.push((state, accept));
    }
    resolutions
}

#[cfg(test)]
mod tests {
    use super::*;
    use drta_core::trace::Sample;

    fn trace(events: &[(&'static str, f64)]) -> TimedTrace {
        TimedTrace::from_iter(events.iter().copied())
    }

    #[test]
    fn strict_reject_always_rejects() {
        // Force a conflict by hand: build a DRTA with a single state accepting and
        // rejecting, independent of sample content.
        let sample = Sample::new(vec![trace(&[("a", 1.0)])], vec![trace(&[("a", 3.0)])]);
        let rta = Min3Rta::build_from_samples(&sample, 1000, true);
        let mut drta = Drta::from_min3rta(&rta);
        let state = *drta.states.first().unwrap();
        drta.accepting.insert(state);
        drta.rejecting.insert(state);
        let resolutions =
            resolve_conflicts(&mut drta, &rta, ConflictResolutionStrategy::StrictRejectOnConflict);
        assert!(resolutions.iter().all(|(_, accept)| !accept));
        assert!(drta.accepting.is_disjoint(&drta.rejecting));
    }

    #[test]
    fn majority_breaks_ties_towards_more_traces() {
        let sample = Sample::new(
            vec![
                trace(&[("a", 1.0), ("b", 1.0)]),
                trace(&[("a", 1.0), ("b", 2.0)]),
            ],
            vec![trace(&[("a", 1.0), ("b", 3.0)])],
        );
        let rta = Min3Rta::build_from_samples(&sample, 1000, true);
        let mut drta = Drta::from_min3rta(&rta);
        resolve_conflicts(&mut drta, &rta, ConflictResolutionStrategy::ByMajority);
        assert!(drta.accepting.is_disjoint(&drta.rejecting));
    }
}
