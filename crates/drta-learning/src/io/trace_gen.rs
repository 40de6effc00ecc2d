//! Synthetic trace generation (§4.10): a random walk over a [`ReferenceAutomaton`]
//! producing labelled timed traces, used to generate benchmark inputs without depending
//! on hand-curated sample files.

use drta_core::trace::{Event, Sample, TimedTrace};
use rand::Rng;

use super::json_automaton::ReferenceAutomaton;

pub struct GeneratorConfig {
    pub trace_count: usize,
    pub max_length: usize,
    pub max_time_step: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            trace_count: 100,
            max_length: 10,
            max_time_step: 5.0,
        }
    }
}

/// Walks `reference` from its initial state, at each step picking uniformly among the
/// outgoing transitions available at the current simulated clock value and advancing
/// the clock by the region's own span (or a bounded random step, for unbounded
/// regions), until `max_length` is reached or a dead end is hit.
fn random_walk(
    reference: &ReferenceAutomaton,
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> TimedTrace {
    let mut state = reference.initial;
    let mut events = Vec::new();
    let mut clock = 0.0_f64;

    for _ in 0..config.max_length {
        let candidates: Vec<(&drta_core::symbol::Symbol, drta_core::region::Region, usize)> =
            reference
                .transitions
                .iter()
                .filter(|((from, _), _)| *from == state)
                .flat_map(|((_, symbol), targets)| {
                    targets.iter().map(move |(region, to)| (symbol, *region, *to))
                })
                .collect();
        if candidates.is_empty() {
            break;
        }
        let (symbol, region, next) = &candidates[rng.gen_range(0..candidates.len())];

        let elapsed = sample_time_in_region(region, config.max_time_step, rng);
        clock += elapsed;
        events.push(Event::new(symbol.as_str(), clock));
        state = *next;
    }

    TimedTrace::new(events)
}

fn sample_time_in_region(
    region: &drta_core::region::Region,
    max_step: f64,
    rng: &mut impl Rng,
) -> f64 {
    use drta_core::region::Bound;
    if let Some(p) = region.as_point() {
        return p as f64;
    }
    let lo = region.lo() as f64;
    match region.hi() {
        Bound::Finite(hi) => rng.gen_range(lo..(hi as f64)),
        Bound::Infinite => lo + rng.gen_range(0.0..max_step),
    }
}

/// Generates a labelled sample by walking `reference` repeatedly and labelling each
/// trace by whether it ends in an accepting state.
pub fn generate_sample(
    reference: &ReferenceAutomaton,
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Sample {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for _ in 0..config.trace_count {
        let trace = random_walk(reference, config, rng);
        if trace.is_empty() {
            continue;
        }
        let ends_accepting = reference
            .accepting
            .contains(&reach(reference, &trace).unwrap_or(reference.initial));
        if ends_accepting {
            positive.push(trace);
        } else {
            negative.push(trace);
        }
    }
    Sample::new(positive, negative)
}

fn reach(reference: &ReferenceAutomaton, trace: &TimedTrace) -> Option<usize> {
    let mut state = reference.initial;
    let mut clock = 0.0;
    for event in &trace.0 {
        let elapsed = event.time - clock;
        clock = event.time;
        let targets = reference
            .transitions
            .get(&(state, event.symbol.clone()))?;
        let hit = targets.iter().find(|(region, _)| region.contains(elapsed))?;
        state = hit.1;
    }
    Some(state)
}
