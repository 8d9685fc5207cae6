//! Core types for Synaptic

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::sync::Arc;

/// Atom identifier - cheaply cloneable, never regenerated after creation
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct AtomId(Arc<str>);

impl AtomId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AtomId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AtomId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::ops::Deref for AtomId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AtomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for AtomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AtomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(AtomId::from)
    }
}

/// Category of a connection between two atoms
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Semantic,
    Temporal,
    Causal,
    Associative,
    Hierarchical,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EdgeKind::Semantic => "semantic",
            EdgeKind::Temporal => "temporal",
            EdgeKind::Causal => "causal",
            EdgeKind::Associative => "associative",
            EdgeKind::Hierarchical => "hierarchical",
        };
        f.write_str(s)
    }
}

/// Five-level categorical intensity carried by an atom.
///
/// Ordered from lowest to highest intensity; higher levels shield an atom
/// from decay (see [`ActivationLevel::decay_factor`]).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivationLevel {
    Dormant,
    Low,
    Moderate,
    High,
    Peak,
}

impl ActivationLevel {
    pub const ALL: [ActivationLevel; 5] = [
        ActivationLevel::Dormant,
        ActivationLevel::Low,
        ActivationLevel::Moderate,
        ActivationLevel::High,
        ActivationLevel::Peak,
    ];

    /// Multiplier applied to the effective decay rate.
    pub fn decay_factor(self) -> f64 {
        match self {
            ActivationLevel::Dormant => 1.0,
            ActivationLevel::Low => 0.9,
            ActivationLevel::Moderate => 0.7,
            ActivationLevel::High => 0.5,
            ActivationLevel::Peak => 0.2,
        }
    }

    pub fn is_high(self) -> bool {
        self >= ActivationLevel::High
    }
}

impl std::fmt::Display for ActivationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivationLevel::Dormant => "dormant",
            ActivationLevel::Low => "low",
            ActivationLevel::Moderate => "moderate",
            ActivationLevel::High => "high",
            ActivationLevel::Peak => "peak",
        };
        f.write_str(s)
    }
}
