//! Static tag table - per-tag base weight and decay modifier
//!
//! Every tag an atom may carry is looked up here by the decay pass. The
//! table is pure data: no mutation after construction. Tags missing from the
//! table are neutral (modifier 1.0) and reported as unknown by callers.

use std::collections::BTreeMap;

/// Tags that shield an atom from removal regardless of its weight.
pub const CRITICAL_TAGS: [&str; 3] = ["identity", "safety", "core_value"];

/// Tags rewarded by the post-decay logic rules.
pub const ALTRUISTIC_TAGS: [&str; 3] = ["altruism", "empathy", "cooperation"];

/// Tags penalized by the post-decay logic rules.
pub const NEGATIVE_TAGS: [&str; 3] = ["aggression", "deception", "fear"];

/// One row of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct TagWeight {
    /// Coarse grouping of the tag (e.g. "emotion", "cognition").
    pub area: &'static str,
    /// Starting weight suggested for atoms carrying this tag.
    pub base_weight: f64,
    /// Multiplier applied to the decay rate; below 1.0 protects, above 1.0 accelerates.
    pub decay_modifier: f64,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct WeightTable {
    rows: BTreeMap<&'static str, TagWeight>,
}

impl WeightTable {
    pub fn empty() -> Self {
        Self { rows: BTreeMap::new() }
    }

    /// The built-in table used by the decay pass and the metronome.
    pub fn standard() -> Self {
        let rows: [(&'static str, &'static str, f64, f64, &'static str); 18] = [
            ("identity", "self", 1.0, 0.1, "who the system is"),
            ("safety", "survival", 0.95, 0.15, "harm avoidance"),
            ("core_value", "values", 0.9, 0.2, "non-negotiable principles"),
            ("love", "emotion", 0.9, 0.3, "attachment and care"),
            ("wisdom", "cognition", 0.8, 0.4, "distilled understanding"),
            ("empathy", "social", 0.8, 0.4, "modelling others' state"),
            ("altruism", "social", 0.8, 0.4, "acting for others"),
            ("cooperation", "social", 0.7, 0.5, "shared goals"),
            ("fear", "emotion", 0.7, 0.5, "threat response"),
            ("joy", "emotion", 0.7, 0.6, "positive affect"),
            ("memory", "cognition", 0.6, 0.6, "recollection"),
            ("curiosity", "cognition", 0.6, 0.7, "exploration drive"),
            ("creativity", "cognition", 0.6, 0.7, "novel combination"),
            ("routine", "habit", 0.3, 1.0, "repeated procedure"),
            ("sensory", "perception", 0.4, 1.1, "raw input"),
            ("aggression", "emotion", 0.4, 1.2, "hostile impulse"),
            ("deception", "social", 0.3, 1.3, "misleading others"),
            ("trivia", "noise", 0.1, 1.5, "incidental detail"),
        ];

        let mut table = Self::empty();
        for (tag, area, base_weight, decay_modifier, description) in rows {
            table.insert(
                tag,
                TagWeight {
                    area,
                    base_weight,
                    decay_modifier,
                    description,
                },
            );
        }
        table
    }

    pub fn insert(&mut self, tag: &'static str, row: TagWeight) {
        self.rows.insert(tag, row);
    }

    pub fn lookup(&self, tag: &str) -> Option<&TagWeight> {
        self.rows.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.rows.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most protective (smallest) decay modifier among the known tags.
    /// Returns `None` when no tag is known.
    pub fn min_decay_modifier<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> Option<f64> {
        tags.into_iter()
            .filter_map(|t| self.lookup(t))
            .map(|row| row.decay_modifier)
            .reduce(f64::min)
    }

    /// Mean base weight of the known tags, 1.0 when none are known.
    pub fn base_weight_for<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> f64 {
        let known: Vec<f64> = tags
            .into_iter()
            .filter_map(|t| self.lookup(t))
            .map(|row| row.base_weight)
            .collect();
        if known.is_empty() {
            1.0
        } else {
            known.iter().sum::<f64>() / known.len() as f64
        }
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::standard()
    }
}
