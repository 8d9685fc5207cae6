//! Decay pass - shrink every atom's weight, then remove or promote
//!
//! The effective rate of an atom is its lifecycle decay rate multiplied by
//! five independent modifiers, applied in order:
//!
//! 1. tag: the smallest decay modifier among the atom's known tags
//! 2. recency: idle > 30d ×2.0, > 7d ×1.5, > 1d ×1.2, < 2.4h ×0.5;
//!    then activations > 10 ×0.8, > 5 ×0.9
//! 3. activation level: Dormant 1.0 … Peak 0.2
//! 4. temporal bonus: idle ≤ 1h ×0.3, ≤ 6h ×0.6, ≤ 24h ×0.8
//! 5. connectivity: ≥ 5 edges ×0.6, ≥ 3 edges ×0.8
//!
//! `weight -= weight × rate`, floored at zero.
//!
//! Promotion consolidates: every edge of a newly promoted atom is multiplied
//! by [`CONSOLIDATION_EDGE_BOOST`], capped at 1.0.

use crate::atom::Atom;
use crate::store::AtomGraph;
use crate::weights::{WeightTable, CRITICAL_TAGS};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use synaptic_core::{ActivationLevel, AtomId};
use tracing::{debug, info, warn};

/// Edge multiplier applied to an atom's connections when it is promoted.
pub const CONSOLIDATION_EDGE_BOOST: f64 = 1.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Atoms lighter than this are removed unless protected.
    pub min_weight: f64,
    /// Minimum weight for promotion.
    pub promotion_threshold: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            min_weight: 0.01,
            promotion_threshold: 0.5,
        }
    }
}

/// Every factor that went into one atom's effective rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBreakdown {
    /// Lifecycle decay rate before modifiers.
    pub base: f64,
    pub tag: f64,
    pub recency: f64,
    pub activation_level: f64,
    pub temporal: f64,
    pub connectivity: f64,
    /// Product of all of the above, clamped to [0, 1].
    pub effective: f64,
}

/// Outcome of one decay pass. Weights are unitless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayReport {
    pub examined: usize,
    /// Atoms whose weight actually went down.
    pub decayed: usize,
    pub removed: Vec<AtomId>,
    pub promoted: Vec<AtomId>,
    /// Edges strengthened by consolidation of the promoted atoms.
    pub edges_strengthened: usize,
    /// Tags seen on atoms but absent from the weight table.
    pub unknown_tags: BTreeSet<String>,
    pub total_weight_lost: f64,
}

pub struct DecayPass {
    config: DecayConfig,
    table: WeightTable,
}

impl DecayPass {
    pub fn new(config: DecayConfig, table: WeightTable) -> Self {
        Self { config, table }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    pub fn run(&self, graph: &mut AtomGraph, now: DateTime<Utc>) -> DecayReport {
        let mut report = DecayReport::default();
        let mut doomed = Vec::new();

        for id in graph.ids() {
            let Some(atom) = graph.atom_mut(&id) else {
                continue;
            };
            report.examined += 1;

            for tag in atom.tags() {
                if !self.table.contains(tag) {
                    report.unknown_tags.insert(tag.clone());
                }
            }

            let rate = self.effective_rate(atom, now);
            let before = atom.weight();
            atom.set_weight(before - before * rate.effective);
            let after = atom.weight();
            if after < before {
                report.decayed += 1;
                report.total_weight_lost += before - after;
            }

            if self.is_removable(atom, now) {
                doomed.push(id);
            } else if self.is_promotable(atom) && atom.promote(now) {
                debug!(
                    "Promoted {} (weight {:.3}, rate now {:.4})",
                    id,
                    atom.weight(),
                    atom.decay_rate()
                );
                report.promoted.push(id);
            }
        }

        for id in &doomed {
            graph.remove_atom(id);
        }
        report.removed = doomed;
        for id in &report.promoted {
            report.edges_strengthened += graph.strengthen_edges(id, CONSOLIDATION_EDGE_BOOST);
        }
        graph.refresh();

        for tag in &report.unknown_tags {
            warn!("Unknown tag '{}' treated as neutral during decay", tag);
        }
        if !report.removed.is_empty() || !report.promoted.is_empty() {
            info!(
                "Decay: {} examined, {} removed, {} promoted",
                report.examined,
                report.removed.len(),
                report.promoted.len()
            );
        }
        report
    }

    /// Compute the effective decay rate of `atom` at `now` without mutating it.
    pub fn effective_rate(&self, atom: &Atom, now: DateTime<Utc>) -> RateBreakdown {
        let base = atom.decay_rate();
        let idle = atom.idle(now);

        let tag = self
            .table
            .min_decay_modifier(atom.tags().iter().map(String::as_str))
            .unwrap_or(1.0);

        let mut recency = if idle > Duration::days(30) {
            2.0
        } else if idle > Duration::days(7) {
            1.5
        } else if idle > Duration::days(1) {
            1.2
        } else if idle < Duration::seconds(8_640) {
            0.5
        } else {
            1.0
        };
        if atom.activations() > 10 {
            recency *= 0.8;
        } else if atom.activations() > 5 {
            recency *= 0.9;
        }

        let activation_level = atom
            .activation_level()
            .map(ActivationLevel::decay_factor)
            .unwrap_or(1.0);

        let temporal = if idle <= Duration::hours(1) {
            0.3
        } else if idle <= Duration::hours(6) {
            0.6
        } else if idle <= Duration::hours(24) {
            0.8
        } else {
            1.0
        };

        let connectivity = match atom.edge_count() {
            n if n >= 5 => 0.6,
            n if n >= 3 => 0.8,
            _ => 1.0,
        };

        let effective =
            (base * tag * recency * activation_level * temporal * connectivity).clamp(0.0, 1.0);

        RateBreakdown {
            base,
            tag,
            recency,
            activation_level,
            temporal,
            connectivity,
            effective,
        }
    }

    /// Below the weight floor and not shielded by any protection.
    pub fn is_removable(&self, atom: &Atom, now: DateTime<Utc>) -> bool {
        atom.weight() < self.config.min_weight && !is_protected(atom, now)
    }

    pub fn is_promotable(&self, atom: &Atom) -> bool {
        !atom.is_promoted()
            && atom.is_promotion_candidate()
            && atom.weight() >= self.config.promotion_threshold
    }
}

/// Peak level, a critical tag, ≥ 5 edges, or promotion within the last 24h.
pub fn is_protected(atom: &Atom, now: DateTime<Utc>) -> bool {
    atom.activation_level() == Some(ActivationLevel::Peak)
        || atom.has_any_tag(&CRITICAL_TAGS)
        || atom.edge_count() >= 5
        || atom
            .lifecycle()
            .promoted_at()
            .is_some_and(|at| now - at <= Duration::hours(24))
}

/// Ebbinghaus-style forgetting probability in [0, 1].
///
/// `(1 − e^(−idle_hours / 24)) × (1 − protection)` where protection blends
/// weight, consolidation, usage and connectivity.
pub fn forget_probability(atom: &Atom, now: DateTime<Utc>) -> f64 {
    let idle_hours = atom.idle(now).num_seconds() as f64 / 3600.0;
    let base_decay = (-idle_hours / 24.0).exp();

    let consolidation = if atom.is_promoted() { 0.8 } else { 0.3 };
    let protection = 0.3 * atom.weight().min(1.0)
        + 0.3 * consolidation
        + 0.2 * (atom.activations() as f64 / 10.0).min(1.0)
        + 0.2 * (atom.edge_count() as f64 / 5.0).min(1.0);

    ((1.0 - base_decay) * (1.0 - protection)).clamp(0.0, 1.0)
}

/// How strongly an atom calls for consolidation, in [0, 1].
pub fn consolidation_need(atom: &Atom, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - atom.created_at()).num_seconds().max(0) as f64 / 3600.0;
    0.3 * atom.weight().min(1.0)
        + 0.3 * (atom.activations() as f64 / 5.0).min(1.0)
        + 0.2 * (atom.edge_count() as f64 / 10.0).min(1.0)
        + 0.2 * age_hours.min(1.0)
}
