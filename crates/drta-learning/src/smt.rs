//! SMT-based colour search (§4.6): given the draft [`Drta`] and a candidate colour
//! count `k`, searches for a function assigning every state a colour in `0..k` such
//! that the coloured quotient remains deterministic and respects the accept/reject
//! labels. The search is purely propositional -- there is no need for any background
//! theory beyond uninterpreted booleans -- so it runs directly against [`z3`]'s boolean
//! core via a plain [`Solver`].

use std::collections::{BTreeMap, BTreeSet};

use drta_core::error::LearnerError;
use drta_core::region::Region;
use drta_core::symbol::Symbol;
use tracing::{debug, info};
use z3::ast::{Ast, Bool};
use z3::{Config, Context, SatResult, Solver};

use crate::drta::Drta;
use crate::min3rta::NodeId;

/// A satisfying colouring: every original state maps onto a colour in `0..colours`,
/// every `(colour, symbol, region)` triple induced by the original edges maps onto a
/// single target colour (§4.6's determinism requirement), and every colour is marked
/// accepting or not via `z_c`.
#[derive(Debug, Clone)]
pub struct ColourAssignment {
    pub colours: usize,
    pub colour_of: BTreeMap<NodeId, usize>,
    pub accepting_colours: BTreeSet<usize>,
    pub transition: BTreeMap<(usize, Symbol, Region), usize>,
}

fn var_name(prefix: &str, parts: &[String]) -> String {
    format!("{prefix}_{}", parts.join("_"))
}

/// All `(colour, symbol, region)` triples induced by the original DRTA's edges: the
/// domain over which `y` variables range.
fn region_keys(drta: &Drta, k: usize) -> BTreeSet<(usize, String, Region)> {
    drta.edges
        .iter()
        .flat_map(|e| (0..k).map(move |c1| (c1, e.symbol.as_str().to_owned(), e.region)))
        .collect()
}

/// Attempts to colour `drta` with exactly `k` colours. Returns `None` on UNSAT.
fn try_colour(drta: &Drta, k: usize) -> Option<ColourAssignment> {
    let cfg = Config::new();
    let ctx = Context::new(&cfg);
    let solver = Solver::new(&ctx);

    let states = &drta.states;
    let colours: Vec<usize> = (0..k).collect();
    let has_positive = !drta.accepting.is_empty();

    let x = |n: NodeId, c: usize| -> Bool<'_> {
        Bool::new_const(&ctx, var_name("x", &[n.to_string(), c.to_string()]))
    };
    let z = |c: usize| -> Bool<'_> { Bool::new_const(&ctx, var_name("z", &[c.to_string()])) };
    let used = |c: usize| -> Bool<'_> { Bool::new_const(&ctx, var_name("used", &[c.to_string()])) };
    let y = |c1: usize, sym: &str, region: &Region, c2: usize| -> Bool<'_> {
        Bool::new_const(
            &ctx,
            var_name("y", &[c1.to_string(), sym.to_owned(), region.to_string(), c2.to_string()]),
        )
    };

    // (1) initial colour pinning.
    solver.assert(&x(drta.initial, 0));

    // (2) one-hot colour per state.
    for &n in states {
        let lits: Vec<Bool> = colours.iter().map(|&c| x(n, c)).collect();
        let refs: Vec<&Bool> = lits.iter().collect();
        solver.assert(&Bool::or(&ctx, &refs));
        for i in 0..k {
            for j in (i + 1)..k {
                solver.assert(&Bool::and(&ctx, &[&x(n, i), &x(n, j)]).not());
            }
        }
    }

    // (3) accept/reject consistency.
    for &n in states {
        for &c in &colours {
            if drta.accepting.contains(&n) {
                solver.assert(&x(n, c).implies(&z(c)));
            }
            if drta.rejecting.contains(&n) {
                solver.assert(&x(n, c).implies(&z(c).not()));
            }
        }
    }

    // (4) positive-sample root-accept.
    if has_positive {
        solver.assert(&z(0));
    }

    let keys = region_keys(drta, k);

    // (5) edge realisation.
    for edge in &drta.edges {
        for &c1 in &colours {
            for &c2 in &colours {
                solver.assert(
                    &Bool::and(&ctx, &[&x(edge.from, c1), &y(c1, edge.symbol.as_str(), &edge.region, c2)])
                        .implies(&x(edge.to, c2)),
                );
            }
        }
    }

    // (6) determinism: two transitions out of the same colour on the same symbol, whose
    // regions may intersect, cannot disagree on target colour.
    let mut by_colour_symbol: BTreeMap<(usize, String), Vec<Region>> = BTreeMap::new();
    for (c1, sym, region) in &keys {
        by_colour_symbol.entry((*c1, sym.clone())).or_default().push(*region);
    }
    for ((c1, sym), regions) in &by_colour_symbol {
        for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                if regions[i] != regions[j] && !regions[i].overlaps(&regions[j]) {
                    continue;
                }
                for a in 0..k {
                    for b in 0..k {
                        if a == b {
                            continue;
                        }
                        solver.assert(
                            &Bool::and(&ctx, &[&y(*c1, sym, &regions[i], a), &y(*c1, sym, &regions[j], b)])
                                .not(),
                        );
                    }
                }
            }
        }
    }

    // (7) existence per symbol/region.
    for (c1, sym, region) in &keys {
        let lits: Vec<Bool> = colours.iter().map(|&c2| y(*c1, sym, region, c2)).collect();
        let refs: Vec<&Bool> = lits.iter().collect();
        solver.assert(&Bool::or(&ctx, &refs));
    }

    // (8) edge coverage.
    for edge in &drta.edges {
        let mut lits = Vec::new();
        for &c1 in &colours {
            for &c2 in &colours {
                lits.push(Bool::and(
                    &ctx,
                    &[&x(edge.from, c1), &y(c1, edge.symbol.as_str(), &edge.region, c2), &x(edge.to, c2)],
                ));
            }
        }
        let refs: Vec<&Bool> = lits.iter().collect();
        solver.assert(&Bool::or(&ctx, &refs));
    }

    // (9) per-state symbol/region coverage, and usage bookkeeping.
    for &c in &colours {
        let lits: Vec<Bool> = states.iter().map(|&n| x(n, c)).collect();
        let refs: Vec<&Bool> = lits.iter().collect();
        solver.assert(&used(c)._eq(&Bool::or(&ctx, &refs)));
    }
    for (c1, sym, region) in &keys {
        let lits: Vec<Bool> = colours.iter().map(|&c2| y(*c1, sym, region, c2)).collect();
        let refs: Vec<&Bool> = lits.iter().collect();
        solver.assert(&used(*c1).implies(&Bool::or(&ctx, &refs)));
    }

    match solver.check() {
        SatResult::Sat => {
            let model = solver.get_model()?;
            let mut colour_of = BTreeMap::new();
            for &n in states {
                for &c in &colours {
                    if model.eval(&x(n, c), true).and_then(|v| v.as_bool()) == Some(true) {
                        colour_of.insert(n, c);
                        break;
                    }
                }
            }
            let mut accepting_colours = BTreeSet::new();
            for &c in &colours {
                if model.eval(&z(c), true).and_then(|v| v.as_bool()) == Some(true) {
                    accepting_colours.insert(c);
                }
            }
            let mut transition = BTreeMap::new();
            for (c1, sym, region) in &keys {
                let symbol = Symbol::new(sym.as_str());
                for c2 in 0..k {
                    if model.eval(&y(*c1, sym, region, c2), true).and_then(|v| v.as_bool()) == Some(true) {
                        transition.insert((*c1, symbol.clone(), *region), c2);
                        break;
                    }
                }
            }
            Some(ColourAssignment {
                colours: k,
                colour_of,
                accepting_colours,
                transition,
            })
        }
        SatResult::Unsat | SatResult::Unknown => None,
    }
}

/// Searches increasing colour counts starting at 2 (a single colour can never separate
/// an accepting state from a rejecting one) up to `k_max`, returning the first
/// satisfying assignment found.
pub fn search_minimal_colouring(
    drta: &Drta,
    k_max: usize,
) -> Result<ColourAssignment, LearnerError> {
    for k in 2..=k_max {
        debug!(k, "attempting colouring");
        if let Some(assignment) = try_colour(drta, k) {
            info!(k, "found satisfying colouring");
            return Ok(assignment);
        }
    }
    Err(LearnerError::InfeasibleLearning { k_max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drta::Drta;
    use crate::min3rta::Min3Rta;
    use drta_core::trace::{Sample, TimedTrace};

    fn trace(events: &[(&'static str, f64)]) -> TimedTrace {
        TimedTrace::from_iter(events.iter().copied())
    }

    #[test]
    fn single_symbol_sample_is_colourable() {
        let sample = Sample::new(vec![trace(&[("a", 0.2)])], vec![trace(&[("a", 3.0)])]);
        let rta = Min3Rta::build_from_samples(&sample, 1000, true);
        let drta = Drta::from_min3rta(&rta);
        let assignment = search_minimal_colouring(&drta, 10).expect("small sample is learnable");
        assert!(assignment.colours <= drta.states.len().max(1));
        assert!(assignment.accepting_colours.contains(&assignment.colour_of[&drta.initial]) || !drta.accepting.contains(&drta.initial));
    }
}
