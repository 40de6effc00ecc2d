//! The JSON automaton interchange format (§4.9/§4.11): used both to load a reference
//! automaton for synthetic trace generation ([`crate::io::trace_gen`]) and to export a
//! learned automaton for external inspection.

use std::collections::BTreeMap;

use drta_core::error::LearnerError;
use drta_core::region::{parse_region, Region};
use drta_core::symbol::Symbol;
use serde::{Deserialize, Serialize};

use crate::verify::LearnedAutomaton;

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonTransition {
    pub from: usize,
    pub to: usize,
    pub symbol: String,
    pub region: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonAutomaton {
    pub name: String,
    pub s: Vec<usize>,
    pub sigma: Vec<String>,
    pub init: usize,
    pub accept: Vec<usize>,
    #[serde(default)]
    pub reject: Vec<usize>,
    pub tran: Vec<JsonTransition>,
}

/// A reference automaton used as the source of truth for synthetic trace generation: a
/// plain adjacency map keyed by `(state, symbol)`.
pub struct ReferenceAutomaton {
    pub initial: usize,
    pub states: Vec<usize>,
    pub accepting: Vec<usize>,
    pub transitions: BTreeMap<(usize, Symbol), Vec<(Region, usize)>>,
}

pub fn parse_reference_automaton(json: &str) -> Result<ReferenceAutomaton, LearnerError> {
    let raw: JsonAutomaton = serde_json::from_str(json)?;
    let mut transitions: BTreeMap<(usize, Symbol), Vec<(Region, usize)>> = BTreeMap::new();
    for t in &raw.tran {
        let region = parse_region(&t.region).ok_or_else(|| LearnerError::MalformedInput {
            token: t.region.clone(),
            reason: "not a valid region string".to_string(),
        })?;
        transitions
            .entry((t.from, Symbol::new(t.symbol.as_str())))
            .or_default()
            .push((region, t.to));
    }
    Ok(ReferenceAutomaton {
        initial: raw.init,
        states: raw.s,
        accepting: raw.accept,
        transitions,
    })
}

pub fn export_learned_automaton(name: &str, automaton: &LearnedAutomaton) -> JsonAutomaton {
    let mut states: Vec<usize> = automaton
        .partition
        .transitions
        .keys()
        .map(|(s, _)| *s)
        .chain(automaton.accepting.iter().copied())
        .chain(automaton.rejecting.iter().copied())
        .chain(std::iter::once(automaton.initial))
        .collect();
    states.sort_unstable();
    states.dedup();

    let sigma: Vec<String> = automaton
        .partition
        .transitions
        .keys()
        .map(|(_, sym)| sym.as_str().to_owned())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let tran = automaton
        .partition
        .transitions
        .iter()
        .flat_map(|((from, symbol), targets)| {
            targets.iter().map(move |t| JsonTransition {
                from: *from,
                to: t.target,
                symbol: symbol.as_str().to_owned(),
                region: t.region.to_string(),
            })
        })
        .collect();

    JsonAutomaton {
        name: name.to_string(),
        s: states,
        sigma,
        init: automaton.initial,
        accept: automaton.accepting.iter().copied().collect(),
        reject: automaton.rejecting.iter().copied().collect(),
        tran,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_a_minimal_automaton() {
        let json = serde_json::json!({
            "name": "example",
            "s": [0, 1],
            "sigma": ["a"],
            "init": 0,
            "accept": [1],
            "reject": [],
            "tran": [
                {"from": 0, "to": 1, "symbol": "a", "region": "(0, ∞)"}
            ],
        })
        .to_string();
        let reference = parse_reference_automaton(&json).unwrap();
        assert_eq!(reference.initial, 0);
        assert_eq!(reference.accepting, vec![1]);
        assert_eq!(reference.transitions.len(), 1);
    }

    #[test]
    fn rejects_malformed_region() {
        let json = serde_json::json!({
            "name": "example",
            "s": [0],
            "sigma": ["a"],
            "init": 0,
            "accept": [],
            "reject": [],
            "tran": [{"from": 0, "to": 0, "symbol": "a", "region": "garbage"}],
        })
        .to_string();
        assert!(parse_reference_automaton(&json).is_err());
    }
}
