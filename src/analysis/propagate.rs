//! Cross-entity score propagation and the combined ranking
//!
//! Runs after intrinsic scoring. Topics borrow influence from the
//! proposals they mention, then all three entity populations are
//! percentile-normalized independently and merged into one ranking.
//! Only topics receive a boost; proposals and papers pass through the
//! clamp and normalization unchanged.

use super::links::Mentions;
use super::normalize::{clamp01, percentile_ranks};
use super::scoring::TopicScores;
use crate::corpus::{PaperId, ProposalCatalog, ProposalId, ProposalStatus, TopicId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Boost terms a topic earns from the proposals it mentions
#[derive(Debug, Clone)]
pub struct BoostWeights {
    /// Per mentioned proposal whose intrinsic score clears the bar
    pub per_strong: f64,
    /// Cap on the strong-mention term
    pub strong_cap: f64,
    /// Intrinsic score a mention must reach to count as strong
    pub strong_min_intrinsic: f64,
    /// Per mentioned proposal with Final status
    pub final_status: f64,
    /// Per mentioned proposal assigned to a shipped upgrade
    pub shipped_upgrade: f64,
}

impl Default for BoostWeights {
    fn default() -> Self {
        Self {
            per_strong: 0.05,
            strong_cap: 0.15,
            strong_min_intrinsic: 0.3,
            final_status: 0.03,
            shipped_upgrade: 0.05,
        }
    }
}

/// Entity population an entry in the combined ranking belongs to.
///
/// The derived order (topics, then proposals, then papers) is the
/// tie-break order within equal final scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Topic,
    Proposal,
    Paper,
}

/// One row of the combined cross-entity ranking
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntity {
    pub kind: EntityKind,
    pub id: String,
    pub score: f64,
}

/// Final per-population scores plus the merged ranking
#[derive(Debug, Default)]
pub struct PropagationOutput {
    pub topic_final: BTreeMap<TopicId, f64>,
    pub proposal_final: BTreeMap<ProposalId, f64>,
    pub paper_final: BTreeMap<PaperId, f64>,
    pub combined: Vec<RankedEntity>,
}

pub struct CrossEntityPropagator {
    weights: BoostWeights,
}

impl Default for CrossEntityPropagator {
    fn default() -> Self {
        Self::new(BoostWeights::default())
    }
}

impl CrossEntityPropagator {
    pub fn new(weights: BoostWeights) -> Self {
        Self { weights }
    }

    /// Boost for one topic given everything it mentions
    fn boost_for(
        &self,
        mentions: &Mentions,
        proposal_intrinsic: &BTreeMap<ProposalId, f64>,
        catalog: &ProposalCatalog,
        shipped_upgrades: &BTreeSet<String>,
    ) -> f64 {
        let w = &self.weights;

        let strong = mentions
            .all
            .iter()
            .filter(|id| {
                proposal_intrinsic.get(id).copied().unwrap_or(0.0) >= w.strong_min_intrinsic
            })
            .count();
        let mut boost = (w.per_strong * strong as f64).min(w.strong_cap);

        for id in &mentions.all {
            let Some(proposal) = catalog.get(id) else {
                continue;
            };
            if proposal.status == ProposalStatus::Final {
                boost += w.final_status;
            }
            if matches!(&proposal.fork, Some(fork) if shipped_upgrades.contains(fork)) {
                boost += w.shipped_upgrade;
            }
        }
        boost
    }

    /// Apply topic boosts, clamp every population, percentile-normalize
    /// each independently, and merge into the combined ranking
    pub fn propagate(
        &self,
        topic_intrinsic: &TopicScores,
        mentions: &BTreeMap<TopicId, Mentions>,
        catalog: &ProposalCatalog,
        proposal_intrinsic: &BTreeMap<ProposalId, f64>,
        paper_intrinsic: &BTreeMap<PaperId, f64>,
        shipped_upgrades: &BTreeSet<String>,
    ) -> PropagationOutput {
        let empty = Mentions::default();
        let topic_ids: Vec<TopicId> = topic_intrinsic.iter().map(|(id, _)| *id).collect();
        let boosted: Vec<f64> = topic_ids
            .iter()
            .map(|id| {
                let topic_mentions = mentions.get(id).unwrap_or(&empty);
                clamp01(
                    topic_intrinsic.get(id)
                        + self.boost_for(
                            topic_mentions,
                            proposal_intrinsic,
                            catalog,
                            shipped_upgrades,
                        ),
                )
            })
            .collect();
        let topic_final_ranks = percentile_ranks(&boosted);
        let topic_final: BTreeMap<TopicId, f64> = topic_ids
            .iter()
            .zip(&topic_final_ranks)
            .map(|(id, score)| (*id, *score))
            .collect();

        let proposal_ids: Vec<ProposalId> = proposal_intrinsic.keys().copied().collect();
        let clamped: Vec<f64> = proposal_ids
            .iter()
            .map(|id| clamp01(proposal_intrinsic[id]))
            .collect();
        let proposal_final: BTreeMap<ProposalId, f64> = proposal_ids
            .iter()
            .zip(percentile_ranks(&clamped))
            .map(|(id, score)| (*id, score))
            .collect();

        let paper_ids: Vec<&PaperId> = paper_intrinsic.keys().collect();
        let clamped: Vec<f64> = paper_ids
            .iter()
            .map(|id| clamp01(paper_intrinsic[*id]))
            .collect();
        let paper_final: BTreeMap<PaperId, f64> = paper_ids
            .iter()
            .zip(percentile_ranks(&clamped))
            .map(|(id, score)| ((*id).clone(), score))
            .collect();

        let mut combined: Vec<RankedEntity> = Vec::new();
        combined.extend(topic_final.iter().map(|(id, score)| RankedEntity {
            kind: EntityKind::Topic,
            id: id.to_string(),
            score: *score,
        }));
        combined.extend(proposal_final.iter().map(|(id, score)| RankedEntity {
            kind: EntityKind::Proposal,
            id: id.to_string(),
            score: *score,
        }));
        combined.extend(paper_final.iter().map(|(id, score)| RankedEntity {
            kind: EntityKind::Paper,
            id: id.to_string(),
            score: *score,
        }));
        combined.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(entities = combined.len(), "cross-entity propagation complete");
        PropagationOutput {
            topic_final,
            proposal_final,
            paper_final,
            combined,
        }
    }
}
