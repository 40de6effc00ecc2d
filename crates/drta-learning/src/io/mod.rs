//! Ambient input/output surface (§4.9-§4.11): sample loaders, the JSON automaton
//! interchange format, CSV/XML exporters and the synthetic trace generator. None of
//! this participates in the learning algorithm itself; it is the plumbing the CLI
//! driver needs to be usable as a standalone tool.

pub mod csv_export;
pub mod json_automaton;
pub mod sample_text;
pub mod trace_gen;
pub mod xml_export;
