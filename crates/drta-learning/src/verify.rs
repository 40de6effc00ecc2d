//! Verification (§4.8): replays every labelled trace through a finished, optimised
//! automaton and reports any disagreement with its label. This is what backs the
//! `"All samples verified! Generated DRTA is completely correct."` / disagreement
//! reporting surfaced by the CLI driver.

use std::collections::BTreeSet;

use drta_core::region::Region;
use drta_core::symbol::Symbol;
use drta_core::trace::{Label, Sample, TimedTrace};

use crate::regions_opt::RegionPartition;

#[derive(Debug, Clone, PartialEq)]
pub struct Disagreement {
    pub trace: TimedTrace,
    pub expected: Label,
    pub reason: String,
}

pub struct LearnedAutomaton {
    pub initial: usize,
    pub accepting: BTreeSet<usize>,
    pub rejecting: BTreeSet<usize>,
    pub partition: RegionPartition,
}

impl LearnedAutomaton {
    fn step(&self, state: usize, symbol: &Symbol, time: f64) -> Option<usize> {
        self.partition
            .transitions
            .get(&(state, symbol.clone()))
            .and_then(|transitions| {
                transitions
                    .iter()
                    .find(|t| t.region.contains(time))
                    .map(|t| t.target)
            })
    }

    fn run(&self, trace: &TimedTrace) -> Result<usize, (usize, Symbol, f64)> {
        let mut state = self.initial;
        for event in &trace.0 {
            match self.step(state, &event.symbol, event.time) {
                Some(next) => state = next,
                None => return Err((state, event.symbol.clone(), event.time)),
            }
        }
        Ok(state)
    }

    pub fn accepts(&self, trace: &TimedTrace) -> bool {
        matches!(self.run(trace), Ok(state) if self.accepting.contains(&state))
    }

    /// Replays every trace in `sample`, returning every mismatch found. An empty result
    /// means the automaton agrees with the sample on every trace.
    pub fn verify(&self, sample: &Sample) -> Vec<Disagreement> {
        let mut disagreements = Vec::new();
        for (trace, label) in sample.labelled_traces() {
            match self.run(trace) {
                Ok(state) => {
                    let matches = match label {
                        Label::Accept => self.accepting.contains(&state),
                        Label::Reject => self.rejecting.contains(&state),
                    };
                    if !matches {
                        disagreements.push(Disagreement {
                            trace: trace.clone(),
                            expected: label,
                            reason: format!("landed in state {state}, which does not carry the expected label"),
                        });
                    }
                }
                Err((state, symbol, time)) => {
                    disagreements.push(Disagreement {
                        trace: trace.clone(),
                        expected: label,
                        reason: format!(
                            "no transition from state {state} on symbol '{symbol}' at time {time}"
                        ),
                    });
                }
            }
        }
        disagreements
    }
}

/// A region that never appears in any trace but was split off during optimisation
/// (§4.7's gap-filling) is harmless; this just double-checks that, for every
/// `(state, symbol)` pair seen in the partition, the regions are disjoint and total --
/// the invariant the region optimiser is supposed to guarantee.
pub fn check_totality(partition: &RegionPartition) -> Result<(), String> {
    for ((state, symbol), transitions) in &partition.transitions {
        let mut regions: Vec<Region> = transitions.iter().map(|t| t.region).collect();
        regions.sort_by_key(|r| r.lo());
        for window in regions.windows(2) {
            if window[0].overlaps(&window[1]) {
                return Err(format!(
                    "state {state} symbol '{symbol}': regions {:?} and {:?} overlap",
                    window[0], window[1]
                ));
            }
            if !window[0].adjacent(&window[1]) {
                return Err(format!(
                    "state {state} symbol '{symbol}': gap between {:?} and {:?}",
                    window[0], window[1]
                ));
            }
        }
    }
    Ok(())
}
