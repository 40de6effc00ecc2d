//! The incremental Min-3RTA minimiser (§4.3): builds a canonical prefix-DAG directly
//! from the labelled sample set using a timed variant of the classic
//! replace-or-register incremental DFA construction. This is the component that
//! actually produces the structure fed into DRTA construction (§4.4) -- unlike
//! [`crate::apta::TimedApta`], which is a literal, un-minimised prefix tree kept around
//! mostly for diagnostics.

use std::collections::HashSet;

use drta_core::error::LearnerError;
use drta_core::region::Region;
use drta_core::symbol::Symbol;
use drta_core::trace::{Label, Sample, TimedTrace};
use tracing::warn;

pub type NodeId = usize;

#[derive(Debug, Default, Clone)]
pub struct Node {
    pub accepting: bool,
    pub rejecting: bool,
    pub transitions: Vec<(Symbol, Region, NodeId)>,
    children: Vec<NodeId>,
}

impl Node {
    fn last_child(&self) -> Option<NodeId> {
        self.children.last().copied()
    }

    fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn symbols(&self) -> HashSet<&Symbol> {
        self.transitions.iter().map(|(s, _, _)| s).collect()
    }
}

/// Maps a raw timestamp onto a region during Min-3RTA insertion (§4.3). This is
/// intentionally distinct from the canonical region alphabet of §4.1: Min-3RTA only ever
/// produces the handful of regions actually witnessed by the traces it has seen, and
/// relies on the SMT/region-optimiser stages downstream to turn that into a total
/// partition.
fn time_to_region(t: f64, global_max: f64) -> Region {
    let is_integer = t.fract() == 0.0;
    let is_max = (t - global_max).abs() < 1e-9;
    let floor = t.floor() as u64;
    match (is_integer, is_max) {
        (true, true) => Region::unbounded_closed(floor),
        (true, false) => Region::point(floor),
        (false, true) => Region::unbounded_open(floor),
        (false, false) => Region::open(floor, floor + 1),
    }
}

/// Two regions used purely to pick the *most specific* existing transition that matches
/// a timestamp while walking the longest existing prefix of a new trace (§4.3, step 1).
fn more_specific(a: &Region, b: &Region) -> bool {
    match (a.width(), b.width()) {
        (None, None) => false,
        (None, Some(_)) => false,
        (Some(_), None) => true,
        (Some(wa), Some(wb)) => wa < wb || (wa == wb && a.is_point() && !b.is_point()),
    }
}

#[derive(Debug)]
pub struct Min3Rta {
    nodes: Vec<Node>,
    register: Vec<NodeId>,
    pub root: NodeId,
    positive_samples: Vec<TimedTrace>,
    negative_samples: Vec<TimedTrace>,
    depth_limit: usize,
    allow_transitions_into_root: bool,
}

impl Min3Rta {
    fn new(depth_limit: usize, allow_transitions_into_root: bool) -> Self {
        Self {
            nodes: vec![Node::default()],
            register: vec![0],
            root: 0,
            positive_samples: Vec::new(),
            negative_samples: Vec::new(),
            depth_limit,
            allow_transitions_into_root,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn positive_samples(&self) -> &[TimedTrace] {
        &self.positive_samples
    }

    pub fn negative_samples(&self) -> &[TimedTrace] {
        &self.negative_samples
    }

    /// Every node reachable via `canonical` from the full node arena -- i.e. the
    /// surviving, canonical prefix-DAG after minimisation.
    pub fn canonical_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(|id| self.canonical(id))
            .collect::<HashSet<_>>()
            .into_iter()
    }

    pub fn canonical(&self, id: NodeId) -> NodeId {
        let mut current = id;
        for _ in 0..self.nodes.len() + 1 {
            let next = self.register[current];
            if next == current {
                return current;
            }
            current = next;
        }
        current
    }

    fn create_node(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        self.register.push(self.nodes.len() - 1);
        self.nodes.len() - 1
    }

    fn add_transition(&mut self, from: NodeId, symbol: Symbol, region: Region, to: NodeId) {
        self.nodes[from].transitions.push((symbol, region, to));
        if !self.nodes[from].children.contains(&to) {
            self.nodes[from].children.push(to);
        }
    }

    /// Finds the most specific existing `(symbol, region)` transition from `from` whose
    /// region contains `time`, per §4.3 step 1.
    fn best_matching_child(&self, from: NodeId, symbol: &Symbol, time: f64) -> Option<NodeId> {
        let mut best: Option<(Region, NodeId)> = None;
        for (sym, region, target) in &self.nodes[from].transitions {
            if sym == symbol && region.contains(time) {
                best = match best {
                    None => Some((*region, *target)),
                    Some((best_region, _)) if more_specific(region, &best_region) => {
                        Some((*region, *target))
                    }
                    other => other,
                };
            }
        }
        best.map(|(_, target)| target)
    }

    /// Two nodes are equivalent iff they carry the same label, the same outgoing symbol
    /// set, and for every symbol the exact same set of `(canonical target, region)`
    /// pairs (§4.3 "Equivalence").
    fn equivalent(&self, a: NodeId, b: NodeId) -> bool {
        let (na, nb) = (&self.nodes[a], &self.nodes[b]);
        if na.accepting != nb.accepting || na.rejecting != nb.rejecting {
            return false;
        }
        if na.symbols() != nb.symbols() {
            return false;
        }
        for symbol in na.symbols() {
            let edges_of = |n: &Node| -> HashSet<(NodeId, Region)> {
                n.transitions
                    .iter()
                    .filter(|(s, _, _)| s == symbol)
                    .map(|(_, r, t)| (self.canonical(*t), *r))
                    .collect()
            };
            if edges_of(na) != edges_of(nb) {
                return false;
            }
        }
        true
    }

    fn replace_last_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        for (_, _, target) in self.nodes[parent].transitions.iter_mut() {
            if *target == old {
                *target = new;
            }
        }
        if let Some(slot) = self.nodes[parent]
            .children
            .iter_mut()
            .rev()
            .find(|c| **c == old)
        {
            *slot = new;
        }
    }

    /// Redirects every `(symbol, region, target)` transition of `source` onto `target`,
    /// merging adjacent/overlapping regions that already lead to the same canonical
    /// target (§4.3.1). Returns `Err` (without mutating `target`) if `source` and
    /// `target` disagree on their accept/reject label -- this should be unreachable
    /// given [`Min3Rta::equivalent`] already checks labels, but is kept as the explicit
    /// safety net the spec calls for.
    fn merge_node_transitions(&mut self, source: NodeId, target: NodeId) -> Result<(), ()> {
        if self.nodes[source].accepting != self.nodes[target].accepting
            || self.nodes[source].rejecting != self.nodes[target].rejecting
        {
            return Err(());
        }
        let incoming: Vec<(Symbol, Region, NodeId)> = self.nodes[source].transitions.clone();
        for (symbol, region, raw_target) in incoming {
            let real_target = self.canonical(raw_target);
            let existing = self.nodes[target]
                .transitions
                .iter()
                .position(|(s, r, t)| *s == symbol && self.canonical(*t) == real_target && r.merge(&region).is_some());
            match existing {
                Some(idx) => {
                    let (_, old_region, _) = self.nodes[target].transitions[idx];
                    let merged = old_region.merge(&region).expect("checked above");
                    self.nodes[target].transitions[idx].1 = merged;
                }
                None => {
                    self.nodes[target]
                        .transitions
                        .push((symbol, region, real_target));
                    if !self.nodes[target].children.contains(&real_target) {
                        self.nodes[target].children.push(real_target);
                    }
                }
            }
        }
        Ok(())
    }

    /// §4.3 `replace_or_register`. `visited` guards against cycles within a single
    /// top-level call; `depth` is a hard recursion cap. Both guards log and return
    /// rather than propagate an error, matching the "local recovery" policy of §7 for
    /// [`LearnerError::RecursionGuardTriggered`].
    fn replace_or_register(&mut self, state: NodeId, visited: &mut HashSet<NodeId>, depth: usize) {
        if depth > self.depth_limit {
            warn!(state, depth, "replace-or-register recursion guard triggered");
            return;
        }
        if !visited.insert(state) {
            warn!(state, "replace-or-register cycle detected");
            return;
        }

        if let Some(child) = self.nodes[state].last_child() {
            if self.nodes[child].has_children() {
                self.replace_or_register(child, visited, depth + 1);
            }

            let registered = self
                .canonical_register_candidates()
                .into_iter()
                .find(|&candidate| {
                    candidate != child
                        && (self.allow_transitions_into_root || candidate != self.root)
                        && self.equivalent(child, candidate)
                });

            match registered {
                Some(canonical) => {
                    self.replace_last_child(state, child, canonical);
                    match self.merge_node_transitions(child, canonical) {
                        Ok(()) => {
                            self.register[child] = canonical;
                        }
                        Err(()) => {
                            warn!(
                                child,
                                canonical,
                                "reverting register-hit merge: accept/reject label mismatch"
                            );
                            self.replace_last_child(state, canonical, child);
                        }
                    }
                }
                None => {
                    self.register[child] = child;
                }
            }
        }

        visited.remove(&state);
    }

    /// All nodes that are currently registered as their own canonical representative
    /// (the search space for `replace_or_register`'s equivalence lookup).
    fn canonical_register_candidates(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| self.register[id] == id)
            .collect()
    }

    /// §4.3 `add`: walks the longest existing prefix, minimises the node it lands on if
    /// that node already has children, then appends a fresh suffix.
    fn add(&mut self, trace: &TimedTrace, label: Label, global_max: f64) {
        let mut current = self.root;
        let mut consumed = 0;
        for event in &trace.0 {
            match self.best_matching_child(current, &event.symbol, event.time) {
                Some(next) => {
                    current = next;
                    consumed += 1;
                }
                None => break,
            }
        }

        if self.nodes[current].has_children() {
            self.replace_or_register(current, &mut HashSet::new(), 0);
        }

        for event in &trace.0[consumed..] {
            let region = time_to_region(event.time, global_max);
            let next = self.create_node();
            self.add_transition(current, event.symbol.clone(), region, next);
            current = next;
        }

        match label {
            Label::Accept => self.nodes[current].accepting = true,
            Label::Reject => self.nodes[current].rejecting = true,
        }
    }

    /// §4.3 "Build-from-samples": sorts all labelled traces lexicographically (making
    /// insertion order, which is observable, deterministic), inserts them one by one,
    /// then runs a final `replace_or_register` pass from the root.
    ///
    /// `allow_transitions_into_root` gates whether a non-root node may ever be merged
    /// onto the root during register-hit (§9): with it disabled, a node is never
    /// folded into the root even if otherwise equivalent, which keeps the root from
    /// unexpectedly acquiring incoming edges from deep in the prefix DAG.
    pub fn build_from_samples(
        sample: &Sample,
        depth_limit: usize,
        allow_transitions_into_root: bool,
    ) -> Self {
        let mut rta = Self::new(depth_limit, allow_transitions_into_root);
        rta.positive_samples = sample.positive.clone();
        rta.negative_samples = sample.negative.clone();

        let global_max = sample.max_time();
        let mut traces: Vec<(&TimedTrace, Label)> = sample.labelled_traces().collect();
        traces.sort_by(|(a, _), (b, _)| a.lex_cmp(b));

        for (trace, label) in traces {
            rta.add(trace, label, global_max);
        }
        rta.replace_or_register(rta.root, &mut HashSet::new(), 0);
        rta
    }

    /// Whether `trace` drives the automaton (ignoring accept/reject labels) into
    /// `target`, resolving merged nodes along the way. Used by §4.5 conflict resolution
    /// to find which original traces reach a conflicted node.
    pub fn trace_reaches(&self, trace: &TimedTrace, target: NodeId) -> bool {
        let mut current = self.root;
        for event in &trace.0 {
            let next = self.nodes[current].transitions.iter().find_map(|(s, r, t)| {
                (s == &event.symbol && r.contains(event.time)).then_some(*t)
            });
            match next {
                Some(n) => current = self.canonical(n),
                None => return false,
            }
        }
        current == target
    }

    pub fn verify_canonicity(&self) -> Result<(), LearnerError> {
        let canon: Vec<NodeId> = self.canonical_register_candidates();
        for i in 0..canon.len() {
            for j in (i + 1)..canon.len() {
                if self.equivalent(canon[i], canon[j]) {
                    return Err(LearnerError::InternalInvariantViolation(format!(
                        "canonical nodes {} and {} are equivalent after build",
                        canon[i], canon[j]
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(events: &[(&'static str, f64)]) -> TimedTrace {
        TimedTrace::from_iter(events.iter().copied())
    }

    #[test]
    fn time_to_region_mapping_cases() {
        // integer, not max
        assert_eq!(time_to_region(1.0, 5.0), Region::point(1));
        // integer, is max
        assert_eq!(time_to_region(5.0, 5.0), Region::unbounded_closed(5));
        // fractional, not max
        assert_eq!(time_to_region(1.5, 5.0), Region::open(1, 2));
        // fractional, is max
        assert_eq!(time_to_region(5.5, 5.5), Region::unbounded_open(5));
    }

    #[test]
    fn single_symbol_accept_reject_scenario() {
        let sample = Sample::new(
            vec![trace(&[("a", 0.2)]), trace(&[("a", 1.3)])],
            vec![],
        );
        let rta = Min3Rta::build_from_samples(&sample, 1000, true);
        assert!(rta.verify_canonicity().is_ok());
        // Both traces reach accepting nodes.
        for t in &sample.positive {
            let mut current = rta.root;
            for event in &t.0 {
                let next = rta.nodes[current]
                    .transitions
                    .iter()
                    .find(|(s, r, _)| s == &event.symbol && r.contains(event.time))
                    .map(|(_, _, t)| rta.canonical(*t))
                    .unwrap();
                current = next;
            }
            assert!(rta.nodes[current].accepting);
        }
    }

    #[test]
    fn canonicity_holds_on_larger_sample() {
        let sample = Sample::new(
            vec![
                trace(&[("a", 1.0)]),
                trace(&[("a", 1.0), ("b", 2.0), ("b", 1.0)]),
                trace(&[("b", 2.0), ("b", 1.0)]),
            ],
            vec![
                trace(&[("a", 1.0), ("b", 1.0), ("a", 1.0)]),
                trace(&[("b", 2.0)]),
                trace(&[("b", 1.0), ("b", 1.0)]),
            ],
        );
        let rta = Min3Rta::build_from_samples(&sample, 1000, true);
        assert!(rta.verify_canonicity().is_ok());
    }

    #[test]
    fn trace_reaches_tracks_merged_nodes() {
        let sample = Sample::new(vec![trace(&[("a", 1.0)])], vec![trace(&[("a", 3.0)])]);
        let rta = Min3Rta::build_from_samples(&sample, 1000, true);
        let accepting_node = (0..rta.len())
            .map(|id| rta.canonical(id))
            .find(|&id| rta.nodes[id].accepting)
            .unwrap();
        assert!(rta.trace_reaches(&trace(&[("a", 1.0)]), accepting_node));
    }
}
