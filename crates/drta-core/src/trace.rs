use std::collections::BTreeSet;

use crate::symbol::Symbol;

/// A single `(symbol, timestamp)` event within a timed trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub symbol: Symbol,
    pub time: f64,
}

impl Event {
    pub fn new(symbol: impl Into<Symbol>, time: f64) -> Self {
        Self {
            symbol: symbol.into(),
            time,
        }
    }
}

/// Total order over events used to sort traces lexicographically before insertion into
/// Min-3RTA (see §4.3: trace insertion order is observable and must be made
/// deterministic). Symbols compare first, then times; `f64` has no total order in
/// general but sample timestamps are always finite non-negative reals in this domain.
fn event_key(e: &Event) -> (&Symbol, f64) {
    (&e.symbol, e.time)
}

/// A finite, labelled timed trace `((σ₁,t₁),…,(σₙ,tₙ))`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimedTrace(pub Vec<Event>);

impl TimedTrace {
    pub fn new(events: Vec<Event>) -> Self {
        Self(events)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn max_time(&self) -> f64 {
        self.0.iter().map(|e| e.time).fold(0.0, f64::max)
    }

    /// Lexicographic comparison used to produce the deterministic insertion order
    /// required by the Min-3RTA build procedure.
    pub fn lex_cmp(&self, other: &TimedTrace) -> std::cmp::Ordering {
        self.0
            .iter()
            .map(event_key)
            .partial_cmp(other.0.iter().map(event_key))
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl FromIterator<(&'static str, f64)> for TimedTrace {
    fn from_iter<T: IntoIterator<Item = (&'static str, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(s, t)| Event::new(s, t)).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Accept,
    Reject,
}

impl Label {
    pub fn is_accept(self) -> bool {
        matches!(self, Label::Accept)
    }
}

/// The full, labelled input to the learner: a set of accepted and a set of rejected
/// timed traces.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub positive: Vec<TimedTrace>,
    pub negative: Vec<TimedTrace>,
}

impl Sample {
    pub fn new(positive: Vec<TimedTrace>, negative: Vec<TimedTrace>) -> Self {
        Self { positive, negative }
    }

    /// All traces paired with their label, in the order positives-then-negatives. Callers
    /// that need the deterministic build order should sort this with [`TimedTrace::lex_cmp`].
    pub fn labelled_traces(&self) -> impl Iterator<Item = (&TimedTrace, Label)> {
        self.positive
            .iter()
            .map(|t| (t, Label::Accept))
            .chain(self.negative.iter().map(|t| (t, Label::Reject)))
    }

    pub fn max_time(&self) -> f64 {
        self.labelled_traces()
            .map(|(t, _)| t.max_time())
            .fold(0.0, f64::max)
    }

    pub fn symbols(&self) -> BTreeSet<Symbol> {
        self.labelled_traces()
            .flat_map(|(t, _)| t.0.iter().map(|e| e.symbol.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_cmp_orders_by_symbol_then_time() {
        let a: TimedTrace = [("a", 1.0)].into_iter().collect();
        let b: TimedTrace = [("a", 2.0)].into_iter().collect();
        let c: TimedTrace = [("b", 0.0)].into_iter().collect();
        assert_eq!(a.lex_cmp(&b), std::cmp::Ordering::Less);
        assert_eq!(b.lex_cmp(&c), std::cmp::Ordering::Less);
    }

    #[test]
    fn sample_max_time_and_symbols() {
        let sample = Sample::new(
            vec![[("a", 0.2)].into_iter().collect(), [("a", 1.3)].into_iter().collect()],
            vec![],
        );
        assert_eq!(sample.max_time(), 1.3);
        assert_eq!(sample.symbols().len(), 1);
    }
}
