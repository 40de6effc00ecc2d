//! Region-partition optimiser (§4.7): turns the candidate `(colour, symbol, region) ->
//! colour` transitions selected by the SMT search into a *total*, pairwise-disjoint
//! cover of `[0, \u{221e})` for every `(colour, symbol)` pair, so the resulting automaton
//! is complete and deterministic on every timestamp, not just the ones witnessed by the
//! sample.
//!
//! The approach is a left-to-right sweep over the integer breakpoints the candidate
//! regions already agree on (they only ever have integer endpoints, see
//! [`drta_core::region::Region`]): split the line into elementary point/open-interval
//! pieces at those breakpoints, assign each piece the target of whichever candidate
//! region covers it (falling back to the nearest covered neighbour for genuine gaps),
//! then merge back together any adjacent pieces that ended up with the same target.

use std::collections::{BTreeMap, BTreeSet};

use drta_core::region::{Bound, Region};
use drta_core::symbol::Symbol;

use crate::smt::ColourAssignment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisedTransition {
    pub region: Region,
    pub target: usize,
}

/// The fully-optimised transition function: for every `(colour, symbol)` pair a list of
/// disjoint regions, sorted by lower bound, covering all of `[0, \u{221e})`.
#[derive(Debug)]
pub struct RegionPartition {
    pub transitions: BTreeMap<(usize, Symbol), Vec<OptimisedTransition>>,
}

fn elementary_pieces(breakpoints: &[u64]) -> Vec<Region> {
    let mut pieces = Vec::with_capacity(breakpoints.len() * 2);
    for (i, &p) in breakpoints.iter().enumerate() {
        pieces.push(Region::point(p));
        match breakpoints.get(i + 1) {
            Some(&next) if next > p => pieces.push(Region::open(p, next)),
            Some(_) => {}
            None => pieces.push(Region::unbounded_open(p)),
        }
    }
    pieces
}

/// A single point strictly inside `region` (or the point itself, for a point region)
/// usable to test which candidate region a given elementary piece falls into.
fn representative(region: &Region) -> f64 {
    if let Some(p) = region.as_point() {
        return p as f64;
    }
    match region.hi() {
        Bound::Finite(hi) => (region.lo() as f64 + hi as f64) / 2.0,
        Bound::Infinite => region.lo() as f64 + 0.5,
    }
}

fn optimise_one(regions: Vec<(Region, usize)>) -> Vec<OptimisedTransition> {
    if regions.len() == 1 {
        let (region, target) = regions[0];
        return vec![OptimisedTransition { region, target }];
    }

    let mut breakpoints: BTreeSet<u64> = BTreeSet::new();
    breakpoints.insert(0);
    for (region, _) in &regions {
        breakpoints.insert(region.lo());
        if let Bound::Finite(hi) = region.hi() {
            breakpoints.insert(hi);
        }
    }
    let breakpoints: Vec<u64> = breakpoints.into_iter().collect();

    let fallback_target = regions
        .iter()
        .min_by_key(|(r, _)| r.lo())
        .map(|(_, t)| *t)
        .expect("non-empty by construction");

    let mut assigned: Vec<(Region, usize)> = Vec::new();
    for piece in elementary_pieces(&breakpoints) {
        let t = representative(&piece);
        let target = regions
            .iter()
            .find(|(r, _)| r.contains(t))
            .map(|(_, target)| *target)
            .or_else(|| assigned.last().map(|(_, target)| *target))
            .unwrap_or(fallback_target);
        assigned.push((piece, target));
    }

    let mut merged: Vec<(Region, usize)> = Vec::new();
    for (region, target) in assigned {
        if let Some((last_region, last_target)) = merged.last().copied() {
            if last_target == target {
                if let Some(combined) = last_region.merge(&region) {
                    *merged.last_mut().unwrap() = (combined, target);
                    continue;
                }
            }
        }
        merged.push((region, target));
    }

    merged
        .into_iter()
        .map(|(region, target)| OptimisedTransition { region, target })
        .collect()
}

pub fn optimise(assignment: &ColourAssignment) -> RegionPartition {
    let mut grouped: BTreeMap<(usize, Symbol), Vec<(Region, usize)>> = BTreeMap::new();
    for ((colour, symbol, region), target) in &assignment.transition {
        grouped
            .entry((*colour, symbol.clone()))
            .or_default()
            .push((*region, *target));
    }

    let mut transitions = BTreeMap::new();
    for (key, regions) in grouped {
        transitions.insert(key, optimise_one(regions));
    }
    RegionPartition { transitions }
}
