//! CSV edge export (§4.11): one row per optimised transition, for spreadsheet
//! inspection or feeding into external graph tooling.

use drta_core::error::LearnerError;
use serde::Serialize;

use crate::verify::LearnedAutomaton;

#[derive(Debug, Serialize)]
struct EdgeRow {
    from: usize,
    to: usize,
    symbol: String,
    region: String,
    accepting: bool,
    rejecting: bool,
}

pub fn write_edges<W: std::io::Write>(
    automaton: &LearnedAutomaton,
    writer: W,
) -> Result<(), LearnerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for ((from, symbol), transitions) in &automaton.partition.transitions {
        for t in transitions {
            csv_writer.serialize(EdgeRow {
                from: *from,
                to: t.target,
                symbol: symbol.as_str().to_owned(),
                region: t.region.to_string(),
                accepting: automaton.accepting.contains(&t.target),
                rejecting: automaton.rejecting.contains(&t.target),
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drta_core::region::Region;
    use drta_core::symbol::Symbol;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn writes_one_row_per_transition() {
        let mut transitions = BTreeMap::new();
        transitions.insert(
            (0, Symbol::new("a")),
            vec![crate::regions_opt::OptimisedTransition {
                region: Region::unbounded_open(0),
                target: 1,
            }],
        );
        let automaton = LearnedAutomaton {
            initial: 0,
            accepting: [1].into_iter().collect::<BTreeSet<_>>(),
            rejecting: BTreeSet::new(),
            partition: crate::regions_opt::RegionPartition { transitions },
        };
        let mut buf = Vec::new();
        write_edges(&automaton, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2); // header + one row
    }
}
