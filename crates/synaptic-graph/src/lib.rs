//! synaptic-graph - weighted atom graph with decay and excitation
//!
//! Pieces:
//! - `store`: the [`AtomGraph`] node store (symmetric adjacency, clusters, stats)
//! - `decay`: per-atom decay with tag/recency/level/temporal/connectivity modifiers,
//!   removal of light unprotected atoms, one-way promotion
//! - `excitation`: query-driven or spontaneous boosting behind [`TagMatcher`]
//! - `recall`: spreading-activation retrieval
//! - `snapshot`: JSON export/import with structural validation
//!
//! Every pass takes `now` explicitly; nothing in this crate reads the clock.

pub mod atom;
pub mod decay;
pub mod excitation;
pub mod recall;
pub mod snapshot;
pub mod store;
pub mod weights;

pub use atom::{Atom, Edge, Lifecycle, NewAtom, DEFAULT_DECAY_RATE};
pub use decay::{
    consolidation_need, forget_probability, is_protected, DecayConfig, DecayPass, DecayReport,
    RateBreakdown,
};
pub use excitation::{
    ExcitationConfig, ExcitationMode, ExcitationPass, ExcitationReport, KeywordMatcher, TagMatcher,
};
pub use recall::{recall, RecallConfig, Recalled};
pub use snapshot::{AtomSnapshot, EdgeSnapshot, GraphSnapshot, SNAPSHOT_VERSION};
pub use store::{AtomGraph, GraphStats, OptimizeReport};
pub use weights::{TagWeight, WeightTable, ALTRUISTIC_TAGS, CRITICAL_TAGS, NEGATIVE_TAGS};
