//! synaptic - weighted atom graph with periodic decay and excitation
//!
//! Facade over the workspace crates:
//! - [`core`]: identifiers, value enums, errors
//! - [`graph`]: the node store and its passes
//! - [`metronome`]: the periodic driver

pub use synaptic_core as core;
pub use synaptic_graph as graph;
pub use synaptic_metronome as metronome;

pub use synaptic_core::{ActivationLevel, AtomId, EdgeKind, Error, Result};
pub use synaptic_graph::{AtomGraph, GraphSnapshot, NewAtom};
pub use synaptic_metronome::{Metronome, MetronomeConfig};
