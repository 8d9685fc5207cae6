//! Associative recall - spreading activation from query-matched seeds
//!
//! Seeds are atoms whose tags overlap the tags derived from the query. Each
//! hop passes `activation × edge_strength × propagation` to the neighbours;
//! anything at or below `threshold` stops spreading. Results are ranked by
//! relevance and every returned atom counts as activated.

use crate::excitation::TagMatcher;
use crate::store::AtomGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use synaptic_core::AtomId;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    pub max_hops: usize,
    /// Fraction of activation carried across one edge of strength 1.0.
    pub propagation: f64,
    /// Activation must exceed this to be kept.
    pub threshold: f64,
    pub max_results: usize,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            max_hops: 2,
            propagation: 0.7,
            threshold: 0.2,
            max_results: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recalled {
    pub id: AtomId,
    /// 1.0 for seeds, lower for atoms reached through edges.
    pub activation: f64,
    /// 0.4·tag overlap + 0.25·weight + 0.2·recency + 0.15·usage, in [0, 1].
    pub relevance: f64,
    /// Matched the query directly rather than through an edge.
    pub direct: bool,
}

pub fn recall(
    graph: &mut AtomGraph,
    matcher: &dyn TagMatcher,
    query: &str,
    config: &RecallConfig,
    now: DateTime<Utc>,
) -> Vec<Recalled> {
    let derived = matcher.derive_tags(query);
    if derived.is_empty() {
        return Vec::new();
    }

    let overlap_ratio = |id: &str| -> f64 {
        graph
            .get(id)
            .map(|a| a.tags().iter().filter(|t| derived.contains(*t)).count())
            .map_or(0.0, |k| k as f64 / derived.len() as f64)
    };

    let mut activation: BTreeMap<AtomId, f64> = graph
        .atoms()
        .filter(|a| a.tags().iter().any(|t| derived.contains(t)))
        .map(|a| (a.id().clone(), 1.0))
        .collect();

    let mut frontier: Vec<AtomId> = activation.keys().cloned().collect();
    for _ in 0..config.max_hops {
        let mut next = Vec::new();
        for id in &frontier {
            let (Some(atom), Some(&level)) = (graph.get(id), activation.get(id)) else {
                continue;
            };
            for (neighbour, edge) in atom.edges() {
                let passed = level * edge.strength * config.propagation;
                if passed <= config.threshold {
                    continue;
                }
                let slot = activation.entry(neighbour.clone()).or_insert(0.0);
                if passed > *slot {
                    *slot = passed;
                    next.push(neighbour.clone());
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    let mut results: Vec<Recalled> = activation
        .into_iter()
        .filter_map(|(id, level)| {
            let atom = graph.get(&id)?;
            let ratio = overlap_ratio(id.as_str());
            let idle_hours = atom.idle(now).num_seconds() as f64 / 3600.0;
            let relevance = 0.4 * ratio
                + 0.25 * atom.weight().min(1.0)
                + 0.2 * (-idle_hours / 24.0).exp()
                + 0.15 * (atom.activations() as f64 / 10.0).min(1.0);
            Some(Recalled {
                id,
                activation: level,
                relevance,
                direct: ratio > 0.0,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| b.activation.total_cmp(&a.activation))
            .then_with(|| a.id.cmp(&b.id))
    });
    results.truncate(config.max_results);

    for hit in &results {
        graph.activate(&hit.id, now);
    }
    debug!("Recall for {:?}: {} atoms", derived, results.len());
    results
}
