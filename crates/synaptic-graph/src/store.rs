//! AtomGraph - the node store
//!
//! Owns every atom. Callers reach atoms only through lookup-by-id or
//! iteration; adjacency is kept symmetric and removal cascades to every
//! back-reference. Aggregate statistics are recomputed after each mutation.

use crate::atom::{Atom, Edge, NewAtom};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use synaptic_core::{AtomId, EdgeKind, Error, Result};
use tracing::{debug, info};

/// Edges weaker than this are pruned by [`AtomGraph::optimize`].
pub const OPTIMIZE_EDGE_FLOOR: f64 = 0.1;
/// Edge-less atoms lighter than this (and rarely activated) are pruned by `optimize`.
pub const OPTIMIZE_WEIGHT_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub atoms: usize,
    /// Undirected edge count (sum of degrees / 2).
    pub edges: usize,
    pub mean_weight: f64,
    /// Unpromoted atoms meeting the usage/connectivity promotion predicate.
    pub promotable: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizeReport {
    /// Undirected edges removed.
    pub edges_removed: usize,
    pub atoms_removed: Vec<AtomId>,
}

impl OptimizeReport {
    pub fn is_noop(&self) -> bool {
        self.edges_removed == 0 && self.atoms_removed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AtomGraph {
    atoms: BTreeMap<AtomId, Atom>,
    clusters: BTreeMap<String, BTreeSet<AtomId>>,
    stats: GraphStats,
}

impl AtomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new atom. Rejects an id that is already present and a
    /// weight that is NaN or infinite.
    pub fn add_atom(&mut self, new: NewAtom, now: DateTime<Utc>) -> Result<AtomId> {
        if self.atoms.contains_key(&new.id) {
            return Err(Error::DuplicateAtom(new.id.to_string()));
        }
        if !new.weight.is_finite() {
            return Err(Error::non_finite(new.id.as_str()));
        }
        let id = new.id.clone();
        debug!("Adding atom {} ({} tags)", id, new.tags.len());
        self.atoms.insert(id.clone(), Atom::create(new, now));
        self.refresh();
        Ok(id)
    }

    /// Insert or replace. A replaced atom loses its edges and cluster
    /// memberships exactly as if it had been removed first.
    /// Returns `Ok(true)` when an existing atom was replaced. A non-finite
    /// weight is rejected and leaves the graph untouched.
    pub fn upsert_atom(&mut self, new: NewAtom, now: DateTime<Utc>) -> Result<bool> {
        if !new.weight.is_finite() {
            return Err(Error::non_finite(new.id.as_str()));
        }
        let replaced = self.detach(&new.id).is_some();
        if replaced {
            info!("Replacing atom {}", new.id);
        }
        self.atoms.insert(new.id.clone(), Atom::create(new, now));
        self.refresh();
        Ok(replaced)
    }

    /// Remove an atom and every reference to it. Returns `false` if absent.
    pub fn remove_atom(&mut self, id: &str) -> bool {
        let found = self.detach(id).is_some();
        if found {
            self.refresh();
        }
        found
    }

    fn detach(&mut self, id: &str) -> Option<Atom> {
        let atom = self.atoms.remove(id)?;
        for other in self.atoms.values_mut() {
            other.edges.remove(id);
        }
        for members in self.clusters.values_mut() {
            members.remove(id);
        }
        Some(atom)
    }

    pub fn get(&self, id: &str) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.atoms.contains_key(id)
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.values()
    }

    pub fn ids(&self) -> Vec<AtomId> {
        self.atoms.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }

    /// Record an explicit activation: bumps the counter and access time.
    pub fn activate(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.atoms.get_mut(id) {
            Some(atom) => {
                atom.activate(now);
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Add `amount` to an atom's weight and count it as an activation.
    /// Returns `false` if the atom is missing or the new weight would not be finite.
    pub fn reinforce(&mut self, id: &str, amount: f64, now: DateTime<Utc>) -> bool {
        match self.atoms.get_mut(id) {
            Some(atom) => {
                let weight = atom.weight() + amount;
                if !weight.is_finite() {
                    return false;
                }
                atom.set_weight(weight);
                atom.activate(now);
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Create (or overwrite) a symmetric edge. Strength is clamped to [0, 1].
    /// Returns `false` if either endpoint is missing, the endpoints are the
    /// same atom, or the strength is not finite.
    pub fn connect(
        &mut self,
        a: &str,
        b: &str,
        strength: f64,
        kind: EdgeKind,
        now: DateTime<Utc>,
    ) -> bool {
        if a == b || !strength.is_finite() || !self.contains(a) || !self.contains(b) {
            return false;
        }
        let edge = Edge {
            strength: strength.clamp(0.0, 1.0),
            kind,
            created_at: now,
        };
        let (id_a, id_b) = (AtomId::from(a), AtomId::from(b));
        if let Some(atom) = self.atoms.get_mut(a) {
            atom.edges.insert(id_b, edge);
        }
        if let Some(atom) = self.atoms.get_mut(b) {
            atom.edges.insert(id_a, edge);
        }
        self.refresh();
        true
    }

    /// Remove the edge between two atoms in both directions.
    pub fn disconnect(&mut self, a: &str, b: &str) -> bool {
        let removed_a = self.atoms.get_mut(a).and_then(|atom| atom.edges.remove(b)).is_some();
        let removed_b = self.atoms.get_mut(b).and_then(|atom| atom.edges.remove(a)).is_some();
        if removed_a || removed_b {
            self.refresh();
        }
        removed_a || removed_b
    }

    /// Multiply every edge strength on `id` by `factor` (capped at 1.0),
    /// mirrored on the neighbours. Returns the number of edges touched.
    pub fn strengthen_edges(&mut self, id: &str, factor: f64) -> usize {
        let Some(atom) = self.atoms.get_mut(id) else {
            return 0;
        };
        let mut updated = Vec::new();
        for (other, edge) in atom.edges.iter_mut() {
            edge.strength = (edge.strength * factor).clamp(0.0, 1.0);
            updated.push((other.clone(), edge.strength));
        }
        for (other, strength) in &updated {
            if let Some(edge) = self.atoms.get_mut(other).and_then(|n| n.edges.get_mut(id)) {
                edge.strength = *strength;
            }
        }
        updated.len()
    }

    /// Similarity in [0, 1]: 0.5·tag Jaccard + 0.3·weight closeness
    /// + 0.2·exp(−|Δcreated| / 24h). `None` if either atom is missing.
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let (x, y) = (self.atoms.get(a)?, self.atoms.get(b)?);

        let tags_x: BTreeSet<&str> = x.tags().iter().map(String::as_str).collect();
        let tags_y: BTreeSet<&str> = y.tags().iter().map(String::as_str).collect();
        let union = tags_x.union(&tags_y).count();
        let jaccard = if tags_x.is_empty() || tags_y.is_empty() || union == 0 {
            0.0
        } else {
            tags_x.intersection(&tags_y).count() as f64 / union as f64
        };

        let heavier = x.weight().max(y.weight());
        let closeness = if heavier <= f64::EPSILON {
            1.0
        } else {
            1.0 - (x.weight() - y.weight()).abs() / heavier
        };

        let apart_secs = (x.created_at() - y.created_at()).num_seconds().abs() as f64;
        let recency = (-apart_secs / 86_400.0).exp();

        Some(0.5 * jaccard + 0.3 * closeness + 0.2 * recency)
    }

    /// Link `id` to every other atom whose similarity exceeds `threshold`.
    /// Existing edges are left alone. Returns the number of edges created.
    pub fn auto_associate(&mut self, id: &str, threshold: f64, now: DateTime<Utc>) -> usize {
        let Some(atom) = self.atoms.get(id) else {
            return 0;
        };
        let candidates: Vec<(AtomId, f64)> = self
            .atoms
            .keys()
            .filter(|other| other.as_str() != id && !atom.edges.contains_key(*other))
            .filter_map(|other| {
                self.similarity(id, other)
                    .filter(|s| *s > threshold)
                    .map(|s| (other.clone(), s))
            })
            .collect();

        for (other, strength) in &candidates {
            self.connect(id, other, *strength, EdgeKind::Semantic, now);
        }
        if !candidates.is_empty() {
            debug!("Auto-associated {} with {} atoms", id, candidates.len());
        }
        candidates.len()
    }

    /// The `n` atoms with the highest overall strength, strongest first.
    pub fn top_n(&self, n: usize) -> Vec<&Atom> {
        let mut ranked: Vec<&Atom> = self.atoms.values().collect();
        ranked.sort_by(|a, b| {
            b.overall_strength()
                .total_cmp(&a.overall_strength())
                .then_with(|| a.id().cmp(b.id()))
        });
        ranked.truncate(n);
        ranked
    }

    /// The `n` heaviest atoms, heaviest first.
    pub fn heaviest(&self, n: usize) -> Vec<AtomId> {
        let mut ranked: Vec<&Atom> = self.atoms.values().collect();
        ranked.sort_by(|a, b| b.weight().total_cmp(&a.weight()).then_with(|| a.id().cmp(b.id())));
        ranked.into_iter().take(n).map(|a| a.id().clone()).collect()
    }

    /// Prune weak edges, then prune isolated, light, rarely used atoms.
    /// Running it twice in a row changes nothing the second time.
    pub fn optimize(&mut self) -> OptimizeReport {
        let weak: Vec<(AtomId, AtomId)> = self
            .atoms
            .iter()
            .flat_map(|(id, atom)| {
                atom.edges
                    .iter()
                    .filter(move |(other, edge)| {
                        id < *other && edge.strength < OPTIMIZE_EDGE_FLOOR
                    })
                    .map(move |(other, _)| (id.clone(), other.clone()))
            })
            .collect();

        for (a, b) in &weak {
            if let Some(atom) = self.atoms.get_mut(a) {
                atom.edges.remove(b);
            }
            if let Some(atom) = self.atoms.get_mut(b) {
                atom.edges.remove(a);
            }
        }

        let idle: Vec<AtomId> = self
            .atoms
            .values()
            .filter(|a| {
                a.edge_count() == 0 && a.weight() < OPTIMIZE_WEIGHT_FLOOR && a.activations() < 2
            })
            .map(|a| a.id().clone())
            .collect();

        for id in &idle {
            self.detach(id);
        }
        self.refresh();

        let report = OptimizeReport {
            edges_removed: weak.len(),
            atoms_removed: idle,
        };
        if !report.is_noop() {
            info!(
                "Optimized graph: -{} edges, -{} atoms",
                report.edges_removed,
                report.atoms_removed.len()
            );
        }
        report
    }

    /// Add an existing atom to a named cluster. Returns `false` if the atom is missing.
    pub fn add_to_cluster(&mut self, cluster: &str, id: &str) -> bool {
        let Some(atom) = self.atoms.get(id) else {
            return false;
        };
        self.clusters
            .entry(cluster.to_string())
            .or_default()
            .insert(atom.id().clone());
        true
    }

    pub fn cluster(&self, name: &str) -> Option<&BTreeSet<AtomId>> {
        self.clusters.get(name)
    }

    pub fn clusters(&self) -> &BTreeMap<String, BTreeSet<AtomId>> {
        &self.clusters
    }

    /// Ids of atoms carrying at least one of `tags`.
    pub fn ids_with_any_tag(&self, tags: &[&str]) -> Vec<AtomId> {
        self.atoms
            .values()
            .filter(|a| a.has_any_tag(tags))
            .map(|a| a.id().clone())
            .collect()
    }

    /// Multiply an atom's weight by `factor` (floored at zero).
    /// Returns `false` if the atom is missing or the product would not be finite.
    pub fn scale_weight(&mut self, id: &str, factor: f64) -> bool {
        match self.atoms.get_mut(id) {
            Some(atom) => {
                let weight = atom.weight() * factor;
                if !weight.is_finite() {
                    return false;
                }
                atom.set_weight(weight);
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Multiply an atom's decay rate by `factor` (clamped to [0, 1]).
    pub fn scale_decay_rate(&mut self, id: &str, factor: f64) -> bool {
        match self.atoms.get_mut(id) {
            Some(atom) => {
                atom.scale_decay_rate(factor);
                true
            }
            None => false,
        }
    }

    /// Fails on the first atom whose weight is NaN or infinite.
    pub fn check_integrity(&self) -> Result<()> {
        match self.atoms.values().find(|a| !a.weight().is_finite()) {
            Some(atom) => Err(Error::non_finite(atom.id().as_str())),
            None => Ok(()),
        }
    }

    /// Remove every atom whose weight is NaN or infinite, with the usual
    /// cascade. Returns the removed ids.
    pub fn purge_non_finite(&mut self) -> Vec<AtomId> {
        let bad: Vec<AtomId> = self
            .atoms
            .values()
            .filter(|a| !a.weight().is_finite())
            .map(|a| a.id().clone())
            .collect();
        for id in &bad {
            self.detach(id);
        }
        if !bad.is_empty() {
            self.refresh();
        }
        bad
    }

    pub(crate) fn atom_mut(&mut self, id: &str) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub(crate) fn from_parts(
        atoms: BTreeMap<AtomId, Atom>,
        clusters: BTreeMap<String, BTreeSet<AtomId>>,
    ) -> Self {
        let mut graph = Self {
            atoms,
            clusters,
            stats: GraphStats::default(),
        };
        graph.refresh();
        graph
    }

    pub(crate) fn refresh(&mut self) {
        let atoms = self.atoms.len();
        let degree_sum: usize = self.atoms.values().map(Atom::edge_count).sum();
        let mean_weight = if atoms == 0 {
            0.0
        } else {
            self.atoms.values().map(Atom::weight).sum::<f64>() / atoms as f64
        };
        let promotable = self
            .atoms
            .values()
            .filter(|a| !a.is_promoted() && a.is_promotion_candidate())
            .count();
        self.stats = GraphStats {
            atoms,
            edges: degree_sum / 2,
            mean_weight,
            promotable,
        };
    }
}
