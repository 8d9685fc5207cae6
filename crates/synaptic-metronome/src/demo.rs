//! Built-in seed graph for `--demo`

use chrono::{DateTime, Utc};
use synaptic_core::{ActivationLevel, EdgeKind, Result};
use synaptic_graph::{AtomGraph, NewAtom, WeightTable};

/// Similarity above which demo atoms are linked automatically.
const DEMO_ASSOCIATION_THRESHOLD: f64 = 0.6;

/// A small graph touching every tag family: critical, altruistic, negative,
/// emotional and noise. Initial weights come from the tag table.
pub fn demo_graph(now: DateTime<Utc>) -> Result<AtomGraph> {
    let table = WeightTable::standard();
    let mut graph = AtomGraph::new();

    let seeds: [(&str, &str, &[&str], Option<ActivationLevel>); 10] = [
        ("self", "Kim jestem", &["identity", "core_value"], Some(ActivationLevel::Peak)),
        ("care", "Miłość do bliskich", &["love", "empathy"], Some(ActivationLevel::High)),
        ("help", "Pomaganie innym", &["altruism", "cooperation"], Some(ActivationLevel::Moderate)),
        ("lesson", "Cierpliwość się opłaca", &["wisdom", "memory"], Some(ActivationLevel::Moderate)),
        ("wonder", "Dlaczego niebo jest niebieskie", &["curiosity"], Some(ActivationLevel::Low)),
        ("song", "Nowa melodia", &["creativity", "joy"], None),
        ("dog", "Pies sąsiada szczeka", &["fear", "sensory"], Some(ActivationLevel::Low)),
        ("quarrel", "Kłótnia w tramwaju", &["aggression"], Some(ActivationLevel::Dormant)),
        ("commute", "Codzienny dojazd", &["routine"], Some(ActivationLevel::Dormant)),
        ("tram", "Numer tramwaju", &["trivia"], None),
    ];

    for (id, label, tags, level) in seeds {
        let mut atom = NewAtom::new(id, label)
            .weight(table.base_weight_for(tags.iter().copied()))
            .tags(tags.iter().copied());
        if let Some(level) = level {
            atom = atom.level(level);
        }
        graph.add_atom(atom, now)?;
    }

    let links: [(&str, &str, f64, EdgeKind); 7] = [
        ("self", "care", 0.9, EdgeKind::Hierarchical),
        ("self", "help", 0.8, EdgeKind::Hierarchical),
        ("care", "help", 0.7, EdgeKind::Causal),
        ("lesson", "self", 0.6, EdgeKind::Semantic),
        ("wonder", "song", 0.4, EdgeKind::Associative),
        ("dog", "quarrel", 0.3, EdgeKind::Temporal),
        ("commute", "tram", 0.05, EdgeKind::Temporal),
    ];
    for (a, b, strength, kind) in links {
        graph.connect(a, b, strength, kind, now);
    }
    graph.auto_associate("care", DEMO_ASSOCIATION_THRESHOLD, now);

    for id in ["self", "care", "help"] {
        graph.add_to_cluster("values", id);
    }
    for id in ["dog", "quarrel"] {
        graph.add_to_cluster("threats", id);
    }
    Ok(graph)
}
