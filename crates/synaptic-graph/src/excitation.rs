//! Excitation pass - boost atoms that match a query, or keep the heaviest warm
//!
//! Tag derivation sits behind [`TagMatcher`] so the pass does not care how a
//! query becomes a tag set. [`KeywordMatcher`] is the built-in strategy.

use crate::store::AtomGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use synaptic_core::AtomId;
use tracing::debug;

/// Turns free text into the set of tags it refers to.
pub trait TagMatcher: Send + Sync {
    fn derive_tags(&self, query: &str) -> BTreeSet<String>;
}

/// Case-insensitive substring matching over fixed keyword groups.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    groups: Vec<(String, Vec<String>)>,
}

impl KeywordMatcher {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let groups: [(&str, &[&str]); 12] = [
            ("love", &["miłość", "milosc", "kocham", "love"]),
            ("joy", &["radość", "radosc", "szczęście", "joy", "happy"]),
            ("fear", &["strach", "lęk", "boję", "fear", "afraid"]),
            ("curiosity", &["ciekaw", "dlaczego", "curious", "why"]),
            ("wisdom", &["mądrość", "madrosc", "wisdom", "insight"]),
            ("altruism", &["pomoc", "pomagać", "help", "altruis"]),
            ("empathy", &["empati", "współczu", "compassion"]),
            ("cooperation", &["współprac", "razem", "cooperat", "together"]),
            ("creativity", &["twórcz", "tworz", "creat", "imagin"]),
            ("memory", &["pamięć", "pamiec", "pamiętam", "remember", "memory"]),
            ("identity", &["kim jestem", "tożsamość", "tozsamosc", "identity", "who am i"]),
            ("aggression", &["gniew", "złość", "zlosc", "anger", "attack"]),
        ];

        let mut matcher = Self::empty();
        for (tag, keywords) in groups {
            matcher = matcher.with_group(tag, keywords.iter().copied());
        }
        matcher
    }

    /// Add (or extend) the keyword group for `tag`. Keywords are stored lowercased.
    pub fn with_group<'a>(mut self, tag: &str, keywords: impl IntoIterator<Item = &'a str>) -> Self {
        let keywords = keywords.into_iter().map(str::to_lowercase);
        match self.groups.iter_mut().find(|(t, _)| t == tag) {
            Some((_, existing)) => existing.extend(keywords),
            None => self.groups.push((tag.to_string(), keywords.collect())),
        }
        self
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(t, _)| t.as_str())
    }
}

impl TagMatcher for KeywordMatcher {
    fn derive_tags(&self, query: &str) -> BTreeSet<String> {
        let query = query.to_lowercase();
        self.groups
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| query.contains(k.as_str())))
            .map(|(tag, _)| tag.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcitationConfig {
    /// Atoms refreshed per spontaneous pass.
    pub spontaneous_top_n: usize,
}

impl Default for ExcitationConfig {
    fn default() -> Self {
        Self { spontaneous_top_n: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcitationMode {
    Query,
    Spontaneous,
}

/// Outcome of one excitation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcitationReport {
    pub mode: ExcitationMode,
    /// Empty in spontaneous mode.
    pub derived_tags: BTreeSet<String>,
    /// Touched atoms with their weight after the pass, heaviest first.
    pub boosted: Vec<(AtomId, f64)>,
}

pub struct ExcitationPass {
    config: ExcitationConfig,
    matcher: Box<dyn TagMatcher>,
}

impl ExcitationPass {
    pub fn new(config: ExcitationConfig, matcher: Box<dyn TagMatcher>) -> Self {
        Self { config, matcher }
    }

    pub fn matcher(&self) -> &dyn TagMatcher {
        self.matcher.as_ref()
    }

    pub fn run(&self, graph: &mut AtomGraph, query: Option<&str>, now: DateTime<Utc>) -> ExcitationReport {
        let report = match query {
            Some(q) => self.excite_query(graph, q, now),
            None => self.excite_spontaneous(graph, now),
        };
        graph.refresh();
        report
    }

    fn excite_query(&self, graph: &mut AtomGraph, query: &str, now: DateTime<Utc>) -> ExcitationReport {
        let derived = self.matcher.derive_tags(query);
        let mut boosted = Vec::new();

        if !derived.is_empty() {
            let total = derived.len() as f64;
            for id in graph.ids() {
                let Some(atom) = graph.atom_mut(&id) else {
                    continue;
                };
                let overlap = atom.tags().iter().filter(|t| derived.contains(*t)).count();
                if overlap == 0 {
                    continue;
                }
                atom.set_weight(atom.weight() * (1.0 + overlap as f64 / total));
                atom.touch(now);
                boosted.push((id, atom.weight()));
            }
        }
        sort_heaviest_first(&mut boosted);

        debug!(
            "Query excitation: tags {:?}, {} atoms boosted",
            derived,
            boosted.len()
        );
        ExcitationReport {
            mode: ExcitationMode::Query,
            derived_tags: derived,
            boosted,
        }
    }

    fn excite_spontaneous(&self, graph: &mut AtomGraph, now: DateTime<Utc>) -> ExcitationReport {
        let mut boosted = Vec::new();
        for id in graph.heaviest(self.config.spontaneous_top_n) {
            if let Some(atom) = graph.atom_mut(&id) {
                atom.touch(now);
                boosted.push((id, atom.weight()));
            }
        }
        ExcitationReport {
            mode: ExcitationMode::Spontaneous,
            derived_tags: BTreeSet::new(),
            boosted,
        }
    }
}

impl Default for ExcitationPass {
    fn default() -> Self {
        Self::new(ExcitationConfig::default(), Box::new(KeywordMatcher::standard()))
    }
}

fn sort_heaviest_first(boosted: &mut [(AtomId, f64)]) {
    boosted.sort_by(|(a_id, a), (b_id, b)| b.total_cmp(a).then_with(|| a_id.cmp(b_id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::NewAtom;
    use chrono::Duration;

    #[test]
    fn keyword_matching_is_case_insensitive_and_unicode_aware() {
        let m = KeywordMatcher::standard();
        assert!(m.derive_tags("MIŁOŚĆ jest wszystkim").contains("love"));
        assert!(m.derive_tags("I Love rust").contains("love"));
        let tags = m.derive_tags("kocham i pamiętam");
        let expected: BTreeSet<String> = ["love", "memory"].into_iter().map(String::from).collect();
        assert_eq!(tags, expected);
        assert!(m.derive_tags("nothing relevant").is_empty());
    }

    #[test]
    fn custom_groups_extend_existing_ones() {
        let m = KeywordMatcher::empty()
            .with_group("love", ["amor"])
            .with_group("love", ["AMOUR"]);
        assert_eq!(m.tags().count(), 1);
        assert!(m.derive_tags("mon amour").contains("love"));
    }

    #[test]
    fn query_boost_is_proportional_to_overlap() {
        let now = Utc::now();
        let mut g = AtomGraph::new();
        g.add_atom(NewAtom::new("both", "B").weight(0.5).tags(["love", "memory"]), now).unwrap();
        g.add_atom(NewAtom::new("one", "O").weight(0.5).tags(["love"]), now).unwrap();
        g.add_atom(NewAtom::new("none", "N").weight(0.5).tags(["trivia"]), now).unwrap();

        let later = now + Duration::hours(1);
        let report = ExcitationPass::default().run(&mut g, Some("kocham, pamiętam"), later);

        assert_eq!(report.mode, ExcitationMode::Query);
        assert_eq!(report.boosted.len(), 2);
        assert_eq!(report.boosted[0].0.as_str(), "both");
        assert!((g.get("both").unwrap().weight() - 1.0).abs() < 1e-12);
        assert!((g.get("one").unwrap().weight() - 0.75).abs() < 1e-12);
        assert_eq!(g.get("none").unwrap().weight(), 0.5);
        assert_eq!(g.get("one").unwrap().last_accessed(), later);
        assert_eq!(g.get("one").unwrap().activations(), 0);
        assert_eq!(g.get("none").unwrap().last_accessed(), now);
    }

    #[test]
    fn unmatched_query_boosts_nothing() {
        let now = Utc::now();
        let mut g = AtomGraph::new();
        g.add_atom(NewAtom::new("a", "A").tags(["love"]), now).unwrap();
        let report = ExcitationPass::default().run(&mut g, Some("xyz"), now);
        assert!(report.derived_tags.is_empty());
        assert!(report.boosted.is_empty());
        assert_eq!(g.get("a").unwrap().weight(), 1.0);
    }

    #[test]
    fn spontaneous_touches_heaviest_without_changing_weight() {
        let now = Utc::now();
        let mut g = AtomGraph::new();
        for (id, w) in [("a", 0.1), ("b", 0.9), ("c", 0.5), ("d", 0.7)] {
            g.add_atom(NewAtom::new(id, id).weight(w), now).unwrap();
        }
        let later = now + Duration::minutes(5);
        let report = ExcitationPass::default().run(&mut g, None, later);

        assert_eq!(report.mode, ExcitationMode::Spontaneous);
        let ids: Vec<&str> = report.boosted.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "c"]);
        assert_eq!(g.get("b").unwrap().weight(), 0.9);
        assert_eq!(g.get("b").unwrap().last_accessed(), later);
        assert_eq!(g.get("a").unwrap().last_accessed(), now);
    }
}
