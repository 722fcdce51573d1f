//! Tiered inclusion filtering
//!
//! Selects the analysis working set out of the full corpus in two passes
//! plus two corrective ones. Tier 1 topics qualify on their own signal,
//! Tier 2 topics ride in on a citation from Tier 1. When the result is
//! too small a relaxed rescan widens it; when too large, the weakest
//! Tier 2 members are dropped until the set fits.

use super::links::CitationGraph;
use super::scoring::TopicScores;
use crate::corpus::{Corpus, TopicId};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Thresholds and bounds for tiered inclusion
#[derive(Debug, Clone)]
pub struct TierConfig {
    /// First-pass score at which a topic enters Tier 1
    pub tier1_score: f64,
    /// In-degree at which a topic enters Tier 1 regardless of score
    pub tier1_in_degree: u64,
    /// Score floor for a cited topic to enter Tier 2
    pub tier2_score: f64,
    /// Relaxed score threshold applied when the set comes up short
    pub relax_score: f64,
    /// Relaxed in-degree threshold for the same pass
    pub relax_in_degree: u64,
    /// Below this size the relax pass runs
    pub min_included: usize,
    /// Above this size the shrink pass runs
    pub max_included: usize,
    /// Size the shrink pass trims toward
    pub shrink_target: usize,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            tier1_score: 0.25,
            tier1_in_degree: 3,
            tier2_score: 0.10,
            relax_score: 0.15,
            relax_in_degree: 2,
            min_included: 400,
            max_included: 600,
            shrink_target: 550,
        }
    }
}

/// How a topic earned its place in the working set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Tier1,
    Tier2,
    Relaxed,
}

/// The selected working set, keyed by topic id
#[derive(Debug, Clone, Default)]
pub struct Inclusion {
    tiers: BTreeMap<TopicId, Tier>,
}

impl Inclusion {
    pub fn tier(&self, id: &TopicId) -> Option<Tier> {
        self.tiers.get(id).copied()
    }

    pub fn contains(&self, id: &TopicId) -> bool {
        self.tiers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Included topic ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &TopicId> {
        self.tiers.keys()
    }
}

/// Applies the tiered selection policy
pub struct InclusionFilter {
    config: TierConfig,
}

impl InclusionFilter {
    pub fn new(config: TierConfig) -> Self {
        Self { config }
    }

    /// Select the working set from first-pass scores and the citation graph
    pub fn select(&self, corpus: &Corpus, graph: &CitationGraph, scores: &TopicScores) -> Inclusion {
        let mut inclusion = Inclusion::default();

        for topic in corpus.topics() {
            let score = scores.get(&topic.id);
            if score >= self.config.tier1_score
                || graph.in_degree_of(&topic.id) >= self.config.tier1_in_degree
            {
                inclusion.tiers.insert(topic.id, Tier::Tier1);
            }
        }

        // Tier 2: one-hop citation targets of Tier 1 that clear the floor
        let tier1: Vec<TopicId> = inclusion.tiers.keys().copied().collect();
        for src in &tier1 {
            let Some(targets) = graph.outgoing(src) else {
                continue;
            };
            for tgt in targets {
                if !corpus.contains(tgt) || inclusion.contains(tgt) {
                    continue;
                }
                if scores.get(tgt) >= self.config.tier2_score {
                    inclusion.tiers.insert(*tgt, Tier::Tier2);
                }
            }
        }

        if inclusion.len() < self.config.min_included {
            self.relax_pass(corpus, graph, scores, &mut inclusion);
        }
        if inclusion.len() > self.config.max_included {
            self.shrink_pass(scores, &mut inclusion);
        }

        debug!(included = inclusion.len(), "tiered selection complete");
        inclusion
    }

    /// Full-corpus rescan with looser thresholds; additions carry the
    /// relaxed tier so the shrink pass never evicts them by mistake
    fn relax_pass(
        &self,
        corpus: &Corpus,
        graph: &CitationGraph,
        scores: &TopicScores,
        inclusion: &mut Inclusion,
    ) {
        for topic in corpus.topics() {
            if inclusion.contains(&topic.id) {
                continue;
            }
            if scores.get(&topic.id) >= self.config.relax_score
                || graph.in_degree_of(&topic.id) >= self.config.relax_in_degree
            {
                inclusion.tiers.insert(topic.id, Tier::Relaxed);
            }
        }
    }

    /// Evict the lowest-scoring Tier 2 members until the set reaches the
    /// shrink target or Tier 2 is exhausted; Tier 1 is never removed
    fn shrink_pass(&self, scores: &TopicScores, inclusion: &mut Inclusion) {
        let mut tier2: Vec<TopicId> = inclusion
            .tiers
            .iter()
            .filter(|(_, t)| **t == Tier::Tier2)
            .map(|(id, _)| *id)
            .collect();
        tier2.sort_by(|a, b| scores.get(a).total_cmp(&scores.get(b)).then(a.cmp(b)));

        for id in tier2 {
            if inclusion.len() <= self.config.shrink_target {
                break;
            }
            inclusion.tiers.remove(&id);
        }
    }
}
