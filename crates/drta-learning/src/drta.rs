//! DRTA multigraph construction from a minimised [`crate::min3rta::Min3Rta`] (§4.4).
//!
//! The canonical nodes surviving minimisation become the automaton's states; duplicate
//! `(source, target, symbol, region)` edges collapsed during minimisation are
//! deduplicated again here defensively, since the SMT encoder (§4.6) assumes a simple
//! edge set rather than a multiset.

use std::collections::{BTreeSet, HashMap};

use drta_core::region::Region;
use drta_core::symbol::Symbol;

use crate::min3rta::{Min3Rta, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub symbol: Symbol,
    pub region: Region,
}

/// The draft DRTA handed to the SMT/region-optimiser stages: a deduplicated edge
/// relation plus the accepting/rejecting state sets (§4.4's `Acc`/`Rej`).
#[derive(Debug)]
pub struct Drta {
    pub states: Vec<NodeId>,
    pub initial: NodeId,
    pub edges: Vec<Edge>,
    pub accepting: BTreeSet<NodeId>,
    pub rejecting: BTreeSet<NodeId>,
}

impl Drta {
    pub fn from_min3rta(rta: &Min3Rta) -> Self {
        let states: Vec<NodeId> = rta.canonical_nodes().collect();
        let initial = rta.canonical(rta.root);

        let mut accepting = BTreeSet::new();
        let mut rejecting = BTreeSet::new();
        let mut seen_edges: HashMap<(NodeId, NodeId, Symbol, Region), ()> = HashMap::new();
        let mut edges = Vec::new();

        for &state in &states {
            let node = rta.node(state);
            if node.accepting {
                accepting.insert(state);
            }
            if node.rejecting {
                rejecting.insert(state);
            }
            for (symbol, region, target) in &node.transitions {
                let to = rta.canonical(*target);
                let key = (state, to, symbol.clone(), *region);
                if seen_edges.insert(key, ()).is_none() {
                    edges.push(Edge {
                        from: state,
                        to,
                        symbol: symbol.clone(),
                        region: *region,
                    });
                }
            }
        }

        Self {
            states,
            initial,
            edges,
            accepting,
            rejecting,
        }
    }

    pub fn symbols(&self) -> BTreeSet<Symbol> {
        self.edges.iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn edges_from(&self, state: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == state)
    }

    /// States that carry both an accepting and a rejecting label: the conflicts that
    /// §4.5 must resolve before the SMT encoding stage runs.
    pub fn conflicted_states(&self) -> Vec<NodeId> {
        self.accepting
            .intersection(&self.rejecting)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drta_core::trace::{Sample, TimedTrace};

    fn trace(events: &[(&'static str, f64)]) -> TimedTrace {
        TimedTrace::from_iter(events.iter().copied())
    }

    #[test]
    fn edges_are_deduplicated() {
        let sample = Sample::new(
            vec![trace(&[("a", 1.0)]), trace(&[("a", 1.0), ("b", 1.0)])],
            vec![trace(&[("a", 3.0)])],
        );
        let rta = crate::min3rta::Min3Rta::build_from_samples(&sample, 1000, true);
        let drta = Drta::from_min3rta(&rta);
        let mut seen = BTreeSet::new();
        for edge in &drta.edges {
            let key = (edge.from, edge.to, edge.symbol.as_str().to_owned());
            assert!(seen.insert(key), "duplicate edge {edge:?}");
        }
    }

    #[test]
    fn no_conflicts_on_disjoint_samples() {
        let sample = Sample::new(vec![trace(&[("a", 1.0)])], vec![trace(&[("a", 3.0)])]);
        let rta = crate::min3rta::Min3Rta::build_from_samples(&sample, 1000, true);
        let drta = Drta::from_min3rta(&rta);
        assert!(drta.conflicted_states().is_empty());
    }
}
