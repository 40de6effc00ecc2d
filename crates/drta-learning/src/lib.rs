//! Learns a minimal deterministic real-time automaton (DRTA) from a labelled set of
//! timed traces: builds a timed-APTA and its Min-3RTA minimisation, resolves any
//! accept/reject conflicts left by the minimisation, searches for the smallest
//! consistent colouring via SMT, and turns that colouring into a total region
//! partition. See [`pipeline::learn`] for the single entry point tying all of this
//! together.

pub mod alphabet;
pub mod apta;
pub mod conflict;
pub mod drta;
pub mod io;
pub mod min3rta;
pub mod pipeline;
pub mod regions_opt;
pub mod smt;
pub mod verify;

pub use pipeline::{learn, LearningOutcome};
