//! Renders a learned DRTA to Graphviz DOT source, and (if a `dot` binary is on `PATH`)
//! to PNG via subprocess. Optional: the learning pipeline never depends on this crate.

use std::io::{Read, Write};

use drta_learning::verify::LearnedAutomaton;
use thiserror::Error;

pub struct GraphvizSource(String);

impl GraphvizSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to spawn or communicate with `dot`: {0}")]
    Io(#[from] std::io::Error),
    #[error("`dot` exited with non-zero status: {0}")]
    NonZeroExit(std::process::ExitStatus),
}

/// Builds the DOT source for `automaton`: one node per state (double circle for
/// accepting, filled for rejecting), one edge per optimised transition labelled
/// `symbol, region`.
pub fn to_dot(name: &str, automaton: &LearnedAutomaton) -> GraphvizSource {
    let mut states = std::collections::BTreeSet::new();
    states.insert(automaton.initial);
    for ((from, _), targets) in &automaton.partition.transitions {
        states.insert(*from);
        for t in targets {
            states.insert(t.target);
        }
    }

    let mut dot = String::new();
    dot.push_str(&format!("digraph {name} {{\n  rankdir=LR;\n"));
    for state in &states {
        let shape = if automaton.accepting.contains(state) {
            "doublecircle"
        } else if automaton.rejecting.contains(state) {
            "box"
        } else {
            "circle"
        };
        dot.push_str(&format!("  s{state} [shape={shape}, label=\"{state}\"];\n"));
    }
    dot.push_str(&format!("  __init [shape=point]; __init -> s{};\n", automaton.initial));
    for ((from, symbol), targets) in &automaton.partition.transitions {
        for t in targets {
            dot.push_str(&format!(
                "  s{from} -> s{} [label=\"{} {}\"];\n",
                t.target,
                symbol.as_str(),
                t.region
            ));
        }
    }
    dot.push_str("}\n");
    GraphvizSource(dot)
}

/// Pipes `source` through `dot -Tpng` and returns the resulting image bytes.
pub fn render_png(source: &GraphvizSource) -> Result<Vec<u8>, RenderError> {
    let mut child = std::process::Command::new("dot")
        .arg("-Tpng")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.0.as_bytes())?;
    }

    let mut output = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_end(&mut output)?;
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(RenderError::NonZeroExit(status));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drta_learning::regions_opt::{OptimisedTransition, RegionPartition};
    use std::collections::BTreeMap;

    fn tiny_automaton() -> LearnedAutomaton {
        let mut transitions = BTreeMap::new();
        transitions.insert(
            (0, drta_core::symbol::Symbol::new("a")),
            vec![OptimisedTransition {
                region: drta_core::region::Region::unbounded_open(0),
                target: 1,
            }],
        );
        LearnedAutomaton {
            initial: 0,
            accepting: [1].into_iter().collect(),
            rejecting: std::collections::BTreeSet::new(),
            partition: RegionPartition { transitions },
        }
    }

    #[test]
    fn dot_contains_every_state_and_edge() {
        let automaton = tiny_automaton();
        let dot = to_dot("example", &automaton);
        assert!(dot.as_str().contains("s0"));
        assert!(dot.as_str().contains("s1"));
        assert!(dot.as_str().contains("doublecircle"));
    }
}
