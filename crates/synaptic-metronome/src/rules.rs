//! Post-decay logic rules
//!
//! Altruistic atoms are rewarded (heavier, slower decay); negative atoms
//! decay faster. An atom carrying both kinds of tag gets both treatments.

use crate::config::RulesConfig;
use synaptic_core::AtomId;
use synaptic_graph::{AtomGraph, ALTRUISTIC_TAGS, NEGATIVE_TAGS};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleReport {
    pub rewarded: Vec<AtomId>,
    pub penalized: Vec<AtomId>,
}

pub struct LogicRules {
    config: RulesConfig,
}

impl LogicRules {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn apply(&self, graph: &mut AtomGraph) -> RuleReport {
        let rewarded = graph.ids_with_any_tag(&ALTRUISTIC_TAGS);
        for id in &rewarded {
            graph.scale_weight(id, self.config.altruistic_weight_boost);
            graph.scale_decay_rate(id, self.config.altruistic_decay_factor);
        }

        let penalized = graph.ids_with_any_tag(&NEGATIVE_TAGS);
        for id in &penalized {
            graph.scale_decay_rate(id, self.config.negative_decay_factor);
        }

        debug!("Rules: {} rewarded, {} penalized", rewarded.len(), penalized.len());
        RuleReport { rewarded, penalized }
    }
}

impl Default for LogicRules {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}
