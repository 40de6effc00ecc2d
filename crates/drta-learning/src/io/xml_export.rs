//! A minimal UPPAAL-style XML export (§4.11): enough to load a learned automaton into a
//! timed-automata visualiser, not a full UPPAAL system description. Regions become a
//! single clock guard on `x`, reset to `0` on every transition so each step re-measures
//! the time since the previous event, matching how the learner itself interprets
//! per-event timestamps.

use crate::verify::LearnedAutomaton;

fn guard_for(region: &drta_core::region::Region) -> String {
    use drta_core::region::Bound;
    let lo = if region.lo_closed() {
        format!("x &gt;= {}", region.lo())
    } else {
        format!("x &gt; {}", region.lo())
    };
    match region.hi() {
        Bound::Infinite => lo,
        Bound::Finite(hi) => {
            let hi_cmp = if region.hi_closed() {
                format!("x &lt;= {hi}")
            } else {
                format!("x &lt; {hi}")
            };
            format!("{lo} &amp;&amp; {hi_cmp}")
        }
    }
}

pub fn export_xml(name: &str, automaton: &LearnedAutomaton) -> String {
    let mut locations = std::collections::BTreeSet::new();
    locations.insert(automaton.initial);
    for (from, targets) in &automaton.partition.transitions {
        locations.insert(from.0);
        for t in targets {
            locations.insert(t.target);
        }
    }

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str(&format!("<nta name=\"{name}\">\n"));
    xml.push_str("  <template>\n    <clock>x</clock>\n");
    for loc in &locations {
        let kind = if automaton.accepting.contains(loc) {
            " accepting=\"true\""
        } else if automaton.rejecting.contains(loc) {
            " accepting=\"false\" rejecting=\"true\""
        } else {
            ""
        };
        xml.push_str(&format!("    <location id=\"id{loc}\"{kind}/>\n"));
    }
    xml.push_str(&format!("    <init ref=\"id{}\"/>\n", automaton.initial));
    for ((from, symbol), targets) in &automaton.partition.transitions {
        for t in targets {
            xml.push_str(&format!(
                "    <transition>\n      <source ref=\"id{from}\"/>\n      <target ref=\"id{}\"/>\n      <label kind=\"synchronisation\">{}</label>\n      <label kind=\"guard\">{}</label>\n      <label kind=\"assignment\">x = 0</label>\n    </transition>\n",
                t.target,
                symbol.as_str(),
                guard_for(&t.region),
            ));
        }
    }
    xml.push_str("  </template>\n</nta>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use drta_core::region::Region;
    use drta_core::symbol::Symbol;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn produces_well_formed_tags() {
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
        let xml = export_xml("example", &automaton);
        assert!(xml.contains("<nta name=\"example\">"));
        assert!(xml.contains("<init ref=\"id0\"/>"));
        assert!(xml.contains("id1"));
    }
}
