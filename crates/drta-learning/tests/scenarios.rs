//! Full-pipeline integration tests (§8): the concrete scenarios and universal
//! properties exercised end to end through [`drta_learning::learn`], as opposed to the
//! per-module unit tests colocated with each stage.

use std::time::Duration;

use drta_core::config::{ConflictResolutionStrategy, LearnerConfig};
use drta_core::trace::{Sample, TimedTrace};
use drta_learning::pipeline::learn;
use drta_learning::regions_opt::optimise;
use drta_learning::smt::search_minimal_colouring;
use drta_learning::verify::check_totality;

fn trace(events: &[(&'static str, f64)]) -> TimedTrace {
    TimedTrace::from_iter(events.iter().copied())
}

fn config() -> LearnerConfig {
    LearnerConfig::default()
}

/// Scenario 1: a single symbol separated purely by timestamp.
#[test]
fn scenario_single_symbol_accept_reject_by_time() {
    let sample = Sample::new(
        vec![trace(&[("a", 0.1)]), trace(&[("a", 0.4)])],
        vec![trace(&[("a", 4.0)]), trace(&[("a", 4.5)])],
    );
    let outcome = learn(&sample, &config()).expect("learnable sample");
    assert!(outcome.verify(&sample).is_empty());
    assert!(outcome.automaton.accepts(&trace(&[("a", 0.25)])));
    assert!(!outcome.automaton.accepts(&trace(&[("a", 4.2)])));
}

/// Scenario 2: two interleaved symbols where order, not just timing, matters.
#[test]
fn scenario_two_symbol_interleaving() {
    let sample = Sample::new(
        vec![
            trace(&[("a", 0.5), ("b", 1.5)]),
            trace(&[("a", 0.3), ("b", 1.8)]),
        ],
        vec![
            trace(&[("b", 0.5), ("a", 1.5)]),
            trace(&[("a", 0.5), ("a", 1.5)]),
        ],
    );
    let outcome = learn(&sample, &config()).expect("learnable sample");
    assert!(outcome.verify(&sample).is_empty());
}

/// Scenario 3: a register-hit that should fold adjacent regions together rather than
/// leaving the partition fragmented (§4.3.1 region-merging smoke test).
#[test]
fn scenario_region_merge_smoke_test() {
    let sample = Sample::new(
        vec![
            trace(&[("a", 1.0)]),
            trace(&[("a", 2.0)]),
            trace(&[("a", 1.0), ("a", 1.0)]),
            trace(&[("a", 2.0), ("a", 1.0)]),
        ],
        vec![trace(&[("a", 1.0), ("a", 2.0)]), trace(&[("a", 2.0), ("a", 2.0)])],
    );
    let outcome = learn(&sample, &config()).expect("learnable sample");
    assert!(outcome.verify(&sample).is_empty());
    // Both lengths of first-step timing reach the same continuation behaviour, so the
    // optimiser should not need more colours than traces to separate them.
    assert!(outcome.colours <= 4);
}

/// Scenario 4: a protected point -- an exact-time region with a distinct target --
/// must survive the region-partition optimiser rather than being swallowed by a
/// neighbouring open interval.
#[test]
fn scenario_protected_point_survives_optimisation() {
    let sample = Sample::new(
        vec![trace(&[("a", 2.0)])],
        vec![trace(&[("a", 1.0)]), trace(&[("a", 3.0)])],
    );
    let outcome = learn(&sample, &config()).expect("learnable sample");
    assert!(outcome.verify(&sample).is_empty());
    assert!(outcome.automaton.accepts(&trace(&[("a", 2.0)])));
    assert!(!outcome.automaton.accepts(&trace(&[("a", 1.0)])));
    assert!(!outcome.automaton.accepts(&trace(&[("a", 3.0)])));
}

/// Scenario 5: the same trace appears in both the positive and negative sample,
/// forcing §4.5's conflict resolution to pick a single label for the state it reaches.
#[test]
fn scenario_accept_reject_conflict_is_resolved() {
    let sample = Sample::new(
        vec![trace(&[("a", 1.0)]), trace(&[("a", 1.0)]), trace(&[("a", 1.0)])],
        vec![trace(&[("a", 1.0)])],
    );
    let config = LearnerConfig {
        conflict_strategy: ConflictResolutionStrategy::ByMajority,
        ..config()
    };
    let outcome = learn(&sample, &config).expect("conflicted sample is still learnable");
    assert!(!outcome.conflicts_resolved.is_empty());
    // Majority strategy: three positive reachings outvote one negative, so the
    // conflicted state must end up accepting.
    assert!(outcome.automaton.accepts(&trace(&[("a", 1.0)])));
}

/// Scenario 6: a sample with no positive traces at all -- everything must end up
/// rejecting, and a single colour suffices.
#[test]
fn scenario_no_positive_samples() {
    let sample = Sample::new(vec![], vec![trace(&[("a", 1.0)]), trace(&[("b", 2.0)])]);
    let outcome = learn(&sample, &config()).expect("reject-only sample is learnable");
    assert!(outcome.verify(&sample).is_empty());
    assert!(outcome.automaton.accepting.is_empty());
    assert!(!outcome.automaton.accepts(&trace(&[("a", 1.0)])));
}

/// Universal property: the learned automaton's region partition is deterministic by
/// construction -- every `(state, symbol)` pair maps to disjoint regions.
#[test]
fn universal_determinism_of_final_drta() {
    let sample = Sample::new(
        vec![trace(&[("a", 0.5)]), trace(&[("b", 0.5)])],
        vec![trace(&[("a", 5.0)]), trace(&[("b", 5.0)])],
    );
    let outcome = learn(&sample, &config()).expect("learnable sample");
    for transitions in outcome.automaton.partition.transitions.values() {
        for i in 0..transitions.len() {
            for j in (i + 1)..transitions.len() {
                assert!(!transitions[i].region.overlaps(&transitions[j].region));
            }
        }
    }
}

/// Universal property: after optimisation, every `(state, symbol)` pair seen in the
/// partition covers the whole non-negative time line with no gaps.
#[test]
fn universal_totality_of_final_drta() {
    let sample = Sample::new(
        vec![trace(&[("a", 0.5)])],
        vec![trace(&[("a", 5.0)]), trace(&[("a", 5.5)])],
    );
    let outcome = learn(&sample, &config()).expect("learnable sample");
    check_totality(&outcome.automaton.partition).expect("optimised partition must be total");
}

/// Universal property: whenever the sample contains at least one positive trace, the
/// initial state's colour must be marked accepting (§4.6 constraint 4).
#[test]
fn universal_positive_initial_acceptance() {
    let sample = Sample::new(vec![trace(&[("a", 0.2)])], vec![trace(&[("a", 9.0)])]);
    let outcome = learn(&sample, &config()).expect("learnable sample");
    assert!(outcome.automaton.accepting.contains(&outcome.automaton.initial));
}

/// Universal property: the learned automaton must reproduce the labels of every trace
/// it was trained on.
#[test]
fn universal_sample_consistency() {
    let sample = Sample::new(
        vec![
            trace(&[("a", 0.1), ("b", 1.2)]),
            trace(&[("a", 0.3), ("b", 1.4)]),
        ],
        vec![
            trace(&[("a", 3.0), ("b", 4.0)]),
            trace(&[("b", 3.0), ("a", 4.0)]),
        ],
    );
    let outcome = learn(&sample, &config()).expect("learnable sample");
    assert!(outcome.verify(&sample).is_empty());
}

/// Checks that a pathologically small colour budget is reported as infeasible rather
/// than silently producing an inconsistent automaton.
#[test]
fn infeasible_k_max_is_reported_as_an_error() {
    let sample = Sample::new(
        vec![trace(&[("a", 0.1)]), trace(&[("b", 0.1)])],
        vec![trace(&[("a", 9.0)]), trace(&[("b", 9.0)])],
    );
    let config = LearnerConfig {
        k_max: 1,
        ..config()
    };
    let result = learn(&sample, &config);
    assert!(result.is_err());
}

/// A second, independent path to the totality/determinism properties that exercises
/// the SMT search and region optimiser directly rather than through `learn`, so a
/// regression in `pipeline::build_automaton` alone would not mask a break in either
/// stage.
#[test]
fn smt_and_region_optimiser_agree_on_a_small_drta() {
    let sample = Sample::new(
        vec![trace(&[("a", 0.5)]), trace(&[("a", 0.6)])],
        vec![trace(&[("a", 5.0)])],
    );
    let rta = drta_learning::min3rta::Min3Rta::build_from_samples(&sample, 1000, true);
    let drta = drta_learning::drta::Drta::from_min3rta(&rta);
    let assignment = search_minimal_colouring(&drta, 10).expect("small sample is learnable");
    let partition = optimise(&assignment);
    check_totality(&partition).expect("region optimiser output must be total");
}

/// A learner config with an explicit timeout should still be accepted -- the field is
/// advisory at this point and should not itself cause learning to fail.
#[test]
fn config_with_timeout_set_is_still_learnable() {
    let sample = Sample::new(vec![trace(&[("a", 1.0)])], vec![trace(&[("a", 9.0)])]);
    let config = LearnerConfig {
        timeout: Some(Duration::from_secs(30)),
        ..config()
    };
    assert!(learn(&sample, &config).is_ok());
}
