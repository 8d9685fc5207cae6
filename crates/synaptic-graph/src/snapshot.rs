//! JSON snapshot of an [`AtomGraph`]
//!
//! Export is infallible. Import validates the whole document before building
//! anything: on any structural problem nothing is constructed and
//! `Error::MalformedSnapshot` is returned. Edge symmetry is trusted.

use crate::atom::{Atom, Edge, Lifecycle};
use crate::store::{AtomGraph, GraphStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use synaptic_core::{ActivationLevel, AtomId, EdgeKind, Error, Result};
use tracing::info;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub atoms: Vec<AtomSnapshot>,
    #[serde(default)]
    pub clusters: BTreeMap<String, Vec<AtomId>>,
    #[serde(default)]
    pub stats: GraphStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomSnapshot {
    pub id: AtomId,
    pub label: String,
    pub weight: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub activations: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_level: Option<ActivationLevel>,
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub edges: Vec<EdgeSnapshot>,
    /// Informational; recomputed on import.
    #[serde(default)]
    pub overall_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub target: AtomId,
    pub strength: f64,
    pub kind: EdgeKind,
    pub created_at: DateTime<Utc>,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse errors are reported as malformed snapshots.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::malformed(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        info!("Saved snapshot of {} atoms to {:?}", self.atoms.len(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl AtomGraph {
    pub fn export(&self, now: DateTime<Utc>) -> GraphSnapshot {
        let atoms = self
            .atoms()
            .map(|atom| AtomSnapshot {
                id: atom.id().clone(),
                label: atom.label.clone(),
                weight: atom.weight(),
                tags: atom.tags().to_vec(),
                created_at: atom.created_at(),
                last_accessed: atom.last_accessed(),
                activations: atom.activations(),
                activation_level: atom.activation_level(),
                lifecycle: *atom.lifecycle(),
                edges: atom
                    .edges()
                    .iter()
                    .map(|(target, edge)| EdgeSnapshot {
                        target: target.clone(),
                        strength: edge.strength,
                        kind: edge.kind,
                        created_at: edge.created_at,
                    })
                    .collect(),
                overall_strength: atom.overall_strength(),
            })
            .collect();

        let clusters = self
            .clusters()
            .iter()
            .map(|(name, members)| (name.clone(), members.iter().cloned().collect()))
            .collect();

        GraphSnapshot {
            version: SNAPSHOT_VERSION,
            exported_at: now,
            atoms,
            clusters,
            stats: self.stats().clone(),
        }
    }

    pub fn import(snapshot: GraphSnapshot) -> Result<AtomGraph> {
        validate(&snapshot)?;

        let mut atoms = BTreeMap::new();
        for s in snapshot.atoms {
            let edges = s
                .edges
                .into_iter()
                .map(|e| {
                    (
                        e.target,
                        Edge {
                            strength: e.strength,
                            kind: e.kind,
                            created_at: e.created_at,
                        },
                    )
                })
                .collect();
            let atom = Atom::restore(
                s.id.clone(),
                s.label,
                s.weight,
                s.lifecycle,
                s.tags,
                s.activation_level,
                s.created_at,
                s.last_accessed,
                s.activations,
                edges,
            );
            atoms.insert(s.id, atom);
        }

        let clusters = snapshot
            .clusters
            .into_iter()
            .map(|(name, members)| (name, members.into_iter().collect::<BTreeSet<_>>()))
            .collect();

        let graph = AtomGraph::from_parts(atoms, clusters);
        info!("Imported snapshot: {} atoms, {} edges", graph.stats().atoms, graph.stats().edges);
        Ok(graph)
    }
}

fn unit_interval(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

fn validate(snapshot: &GraphSnapshot) -> Result<()> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(Error::malformed(format!(
            "unsupported version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    let mut ids = BTreeSet::new();
    for atom in &snapshot.atoms {
        if !ids.insert(atom.id.as_str()) {
            return Err(Error::malformed(format!("duplicate atom id {}", atom.id)));
        }
    }

    for atom in &snapshot.atoms {
        if !atom.weight.is_finite() || atom.weight < 0.0 {
            return Err(Error::malformed(format!(
                "atom {} has invalid weight {}",
                atom.id, atom.weight
            )));
        }
        if !unit_interval(atom.lifecycle.decay_rate()) {
            return Err(Error::malformed(format!(
                "atom {} has decay rate outside [0, 1]",
                atom.id
            )));
        }
        let mut targets = BTreeSet::new();
        for edge in &atom.edges {
            if !ids.contains(edge.target.as_str()) {
                return Err(Error::malformed(format!(
                    "atom {} has an edge to unknown atom {}",
                    atom.id, edge.target
                )));
            }
            if edge.target == atom.id {
                return Err(Error::malformed(format!("atom {} has a self-edge", atom.id)));
            }
            if !targets.insert(edge.target.as_str()) {
                return Err(Error::malformed(format!(
                    "atom {} lists edge to {} twice",
                    atom.id, edge.target
                )));
            }
            if !unit_interval(edge.strength) {
                return Err(Error::malformed(format!(
                    "edge {} -> {} has strength {} outside [0, 1]",
                    atom.id, edge.target, edge.strength
                )));
            }
        }
    }

    for (name, members) in &snapshot.clusters {
        if let Some(unknown) = members.iter().find(|m| !ids.contains(m.as_str())) {
            return Err(Error::malformed(format!(
                "cluster {} references unknown atom {}",
                name, unknown
            )));
        }
    }
    Ok(())
}
