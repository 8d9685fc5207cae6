//! Atom - a weighted, tagged node with symmetric adjacency
//!
//! Adjacency is only ever mutated through [`crate::AtomGraph`], which keeps
//! both directions of every edge in step.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use synaptic_core::{ActivationLevel, AtomId, EdgeKind};

/// Decay rate given to atoms whose creator does not pick one.
pub const DEFAULT_DECAY_RATE: f64 = 0.05;

/// Connection from one atom to another. Mirrored on the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// 0.0 - 1.0
    pub strength: f64,
    pub kind: EdgeKind,
    pub created_at: DateTime<Utc>,
}

/// One-way lifecycle of an atom.
///
/// `Active → Promoted` happens at most once; the decay rate is halved on the
/// transition and the weight at that moment is kept as `floor_weight`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Lifecycle {
    Active {
        decay_rate: f64,
    },
    Promoted {
        decay_rate: f64,
        promoted_at: DateTime<Utc>,
        /// Weight at the moment of promotion. A historical record only;
        /// decay does not clamp to it.
        floor_weight: f64,
    },
}

impl Lifecycle {
    pub fn decay_rate(&self) -> f64 {
        match self {
            Lifecycle::Active { decay_rate } | Lifecycle::Promoted { decay_rate, .. } => *decay_rate,
        }
    }

    pub fn promoted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Active { .. } => None,
            Lifecycle::Promoted { promoted_at, .. } => Some(*promoted_at),
        }
    }

    pub fn is_promoted(&self) -> bool {
        matches!(self, Lifecycle::Promoted { .. })
    }

    pub fn floor_weight(&self) -> Option<f64> {
        match self {
            Lifecycle::Active { .. } => None,
            Lifecycle::Promoted { floor_weight, .. } => Some(*floor_weight),
        }
    }

    /// Transition to `Promoted`. Already-promoted lifecycles are returned unchanged.
    pub fn promote(self, now: DateTime<Utc>, weight: f64) -> Self {
        match self {
            Lifecycle::Active { decay_rate } => Lifecycle::Promoted {
                decay_rate: decay_rate / 2.0,
                promoted_at: now,
                floor_weight: weight,
            },
            promoted => promoted,
        }
    }

    /// Same variant with the decay rate multiplied by `factor`, clamped to [0, 1].
    pub fn scale_decay_rate(self, factor: f64) -> Self {
        let scale = |r: f64| (r * factor).clamp(0.0, 1.0);
        match self {
            Lifecycle::Active { decay_rate } => Lifecycle::Active {
                decay_rate: scale(decay_rate),
            },
            Lifecycle::Promoted {
                decay_rate,
                promoted_at,
                floor_weight,
            } => Lifecycle::Promoted {
                decay_rate: scale(decay_rate),
                promoted_at,
                floor_weight,
            },
        }
    }
}

/// Construction input for [`crate::AtomGraph::add_atom`].
#[derive(Debug, Clone)]
pub struct NewAtom {
    pub id: AtomId,
    pub label: String,
    pub weight: f64,
    pub tags: Vec<String>,
    pub activation_level: Option<ActivationLevel>,
    pub decay_rate: f64,
}

impl NewAtom {
    pub fn new(id: impl Into<AtomId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            weight: 1.0,
            tags: Vec::new(),
            activation_level: None,
            decay_rate: DEFAULT_DECAY_RATE,
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn level(mut self, level: ActivationLevel) -> Self {
        self.activation_level = Some(level);
        self
    }

    pub fn decay_rate(mut self, rate: f64) -> Self {
        self.decay_rate = rate;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Atom {
    id: AtomId,
    pub label: String,
    weight: f64,
    lifecycle: Lifecycle,
    tags: Vec<String>,
    activation_level: Option<ActivationLevel>,
    created_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    activations: u64,
    pub(crate) edges: BTreeMap<AtomId, Edge>,
}

impl Atom {
    pub(crate) fn create(new: NewAtom, now: DateTime<Utc>) -> Self {
        let rate = if new.decay_rate.is_finite() {
            new.decay_rate.clamp(0.0, 1.0)
        } else {
            DEFAULT_DECAY_RATE
        };
        let mut atom = Self {
            id: new.id,
            label: new.label,
            weight: 0.0,
            lifecycle: Lifecycle::Active { decay_rate: rate },
            tags: new.tags,
            activation_level: new.activation_level,
            created_at: now,
            last_accessed: now,
            activations: 0,
            edges: BTreeMap::new(),
        };
        atom.set_weight(new.weight);
        atom
    }

    /// Rebuild an atom verbatim from exported state (used by snapshot import).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: AtomId,
        label: String,
        weight: f64,
        lifecycle: Lifecycle,
        tags: Vec<String>,
        activation_level: Option<ActivationLevel>,
        created_at: DateTime<Utc>,
        last_accessed: DateTime<Utc>,
        activations: u64,
        edges: BTreeMap<AtomId, Edge>,
    ) -> Self {
        Self {
            id,
            label,
            weight,
            lifecycle,
            tags,
            activation_level,
            created_at,
            last_accessed,
            activations,
            edges,
        }
    }

    pub fn id(&self) -> &AtomId {
        &self.id
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn decay_rate(&self) -> f64 {
        self.lifecycle.decay_rate()
    }

    pub fn is_promoted(&self) -> bool {
        self.lifecycle.is_promoted()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.has_tag(t))
    }

    pub fn activation_level(&self) -> Option<ActivationLevel> {
        self.activation_level
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }

    pub fn edges(&self) -> &BTreeMap<AtomId, Edge> {
        &self.edges
    }

    pub fn edge(&self, other: &str) -> Option<&Edge> {
        self.edges.get(other)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Time since last access; zero if `now` precedes the access.
    pub fn idle(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_accessed).max(Duration::zero())
    }

    /// Ranking score: weight + 0.1·edges + 0.1·ln(activations + 1) + 0.2 if promoted.
    pub fn overall_strength(&self) -> f64 {
        let promoted_bonus = if self.is_promoted() { 0.2 } else { 0.0 };
        self.weight
            + 0.1 * self.edge_count() as f64
            + 0.1 * ((self.activations + 1) as f64).ln()
            + promoted_bonus
    }

    /// Usage/connectivity half of the promotion predicate. The decay pass
    /// additionally requires the configured weight threshold.
    pub fn is_promotion_candidate(&self) -> bool {
        (self.activations >= 5 && self.weight >= 0.3)
            || self.activation_level.is_some_and(ActivationLevel::is_high)
            || self.edge_count() >= 3
    }

    /// Negative inputs clamp to zero. NaN is kept so integrity checks can see it.
    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = if weight.is_nan() { weight } else { weight.max(0.0) };
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
    }

    pub(crate) fn activate(&mut self, now: DateTime<Utc>) {
        self.activations += 1;
        self.last_accessed = now;
    }

    pub(crate) fn promote(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_promoted() {
            return false;
        }
        self.lifecycle = self.lifecycle.promote(now, self.weight);
        true
    }

    pub(crate) fn scale_decay_rate(&mut self, factor: f64) {
        self.lifecycle = self.lifecycle.scale_decay_rate(factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_weight_clamps_to_zero() {
        let atom = Atom::create(NewAtom::new("a", "A").weight(-3.0), Utc::now());
        assert_eq!(atom.weight(), 0.0);
    }

    #[test]
    fn promotion_halves_rate_once() {
        let now = Utc::now();
        let mut atom = Atom::create(NewAtom::new("a", "A").weight(0.6).decay_rate(0.08), now);
        assert_eq!(atom.lifecycle().floor_weight(), None);
        assert!(atom.promote(now));
        assert_eq!(atom.lifecycle().floor_weight(), Some(0.6));
        assert_eq!(atom.decay_rate(), 0.04);
        assert!(!atom.promote(now + Duration::hours(1)));
        assert_eq!(atom.decay_rate(), 0.04);
        assert_eq!(atom.lifecycle().promoted_at(), Some(now));
    }

    #[test]
    fn scaled_rate_keeps_variant_and_bounds() {
        let now = Utc::now();
        let promoted = Lifecycle::Active { decay_rate: 0.8 }.promote(now, 1.0);
        let scaled = promoted.scale_decay_rate(4.0);
        assert!(scaled.is_promoted());
        assert_eq!(scaled.decay_rate(), 1.0);
    }

    #[test]
    fn overall_strength_blends_components() {
        let now = Utc::now();
        let mut atom = Atom::create(NewAtom::new("a", "A").weight(0.5), now);
        assert!((atom.overall_strength() - 0.5).abs() < 1e-12);
        atom.promote(now);
        assert!((atom.overall_strength() - 0.7).abs() < 1e-12);
    }
}
