//! synaptic-metronome - periodic driver for an atom graph
//!
//! Architecture:
//! - Tick: decay → excitation (queued query or spontaneous) → logic rules → counters
//! - Introspection: periodic stats and strongest/at-risk atoms in the log
//! - Optimization: periodic pruning of weak edges and idle atoms
//!
//! All three run on one scheduler task; the graph sits behind one mutex.

pub mod config;
pub mod counters;
pub mod demo;
pub mod metronome;
pub mod rules;

pub use config::MetronomeConfig;
pub use counters::RollingCounters;
pub use metronome::{CycleReport, Engine, IntrospectionReport, Metronome};
pub use rules::{LogicRules, RuleReport};
