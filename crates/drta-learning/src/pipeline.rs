//! Top-level orchestration tying the timed-APTA/Min-3RTA/DRTA/conflict/SMT/region-
//! optimiser/verifier stages together behind a single entry point, driven by a
//! [`LearnerConfig`].

use std::collections::BTreeSet;
use std::time::Instant;

use drta_core::config::LearnerConfig;
use drta_core::error::LearnerError;
use drta_core::trace::Sample;
use tracing::info;

use crate::conflict::resolve_conflicts;
use crate::drta::Drta;
use crate::min3rta::Min3Rta;
use crate::regions_opt::{optimise, RegionPartition};
use crate::smt::{search_minimal_colouring, ColourAssignment};
use crate::verify::{check_totality, Disagreement, LearnedAutomaton};

/// Everything produced by a successful learning run, kept around so the CLI driver can
/// report state/transition counts, export the automaton, and run verification
/// separately without re-running the whole pipeline.
pub struct LearningOutcome {
    pub min3rta_state_count: usize,
    pub colours: usize,
    pub automaton: LearnedAutomaton,
    pub smt_elapsed: std::time::Duration,
    pub conflicts_resolved: Vec<(usize, bool)>,
}

impl LearningOutcome {
    pub fn transition_count(&self) -> usize {
        self.automaton
            .partition
            .transitions
            .values()
            .map(|v| v.len())
            .sum()
    }

    pub fn verify(&self, sample: &Sample) -> Vec<Disagreement> {
        self.automaton.verify(sample)
    }
}

/// Runs the full pipeline on `sample` under `config` (§4's end-to-end description).
pub fn learn(sample: &Sample, config: &LearnerConfig) -> Result<LearningOutcome, LearnerError> {
    if sample.is_empty() {
        return Err(LearnerError::MalformedInput {
            token: "<sample>".to_string(),
            reason: "sample set contains no traces".to_string(),
        });
    }

    let rta = Min3Rta::build_from_samples(
        sample,
        config.replace_or_register_depth_limit,
        config.allow_transitions_into_root,
    );
    rta.verify_canonicity()?;
    info!(states = rta.len(), "built Min-3RTA");

    let mut drta = Drta::from_min3rta(&rta);
    let conflicts_resolved = resolve_conflicts(&mut drta, &rta, config.conflict_strategy);
    if !conflicts_resolved.is_empty() {
        info!(count = conflicts_resolved.len(), "resolved accept/reject conflicts");
    }

    let start = Instant::now();
    let assignment = search_minimal_colouring(&drta, config.k_max)?;
    let smt_elapsed = start.elapsed();
    info!(colours = assignment.colours, elapsed = ?smt_elapsed, "SMT search complete");

    let partition = optimise(&assignment);
    check_totality(&partition).map_err(LearnerError::InternalInvariantViolation)?;

    let automaton = build_automaton(&drta, &assignment, partition);

    Ok(LearningOutcome {
        min3rta_state_count: rta.len(),
        colours: assignment.colours,
        automaton,
        smt_elapsed,
        conflicts_resolved,
    })
}

fn build_automaton(
    drta: &Drta,
    assignment: &ColourAssignment,
    partition: RegionPartition,
) -> LearnedAutomaton {
    let colour_of = |state: usize| assignment.colour_of.get(&state).copied().unwrap_or(0);

    let initial = colour_of(drta.initial);
    let accepting = assignment.accepting_colours.clone();
    let used_colours: BTreeSet<usize> = assignment.colour_of.values().copied().collect();
    let rejecting: BTreeSet<usize> = used_colours.difference(&accepting).copied().collect();

    LearnedAutomaton {
        initial,
        accepting,
        rejecting,
        partition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drta_core::trace::TimedTrace;

    fn trace(events: &[(&'static str, f64)]) -> TimedTrace {
        TimedTrace::from_iter(events.iter().copied())
    }

    #[test]
    fn end_to_end_on_single_symbol_sample() {
        let sample = Sample::new(
            vec![trace(&[("a", 0.2)]), trace(&[("a", 0.5)])],
            vec![trace(&[("a", 3.0)]), trace(&[("a", 3.2)])],
        );
        let config = LearnerConfig::default();
        let outcome = learn(&sample, &config).expect("learnable sample");
        let disagreements = outcome.verify(&sample);
        assert!(disagreements.is_empty(), "{disagreements:?}");
    }

    #[test]
    fn empty_sample_is_rejected() {
        let sample = Sample::new(vec![], vec![]);
        let config = LearnerConfig::default();
        assert!(learn(&sample, &config).is_err());
    }
}
