//! Research thread classification
//!
//! Each included topic is assigned to at most one thread from a fixed
//! ordered library of definitions. Matching is weighted pattern scoring
//! over title, tags, author, and excerpt; ties resolve to the earliest
//! definition in library order, so assignment is reproducible.

use super::links::{CitationGraph, Mentions};
use super::tiering::Inclusion;
use super::types::AnalysisError;
use crate::corpus::{Corpus, ProposalId, Topic, TopicId};
use chrono::{Datelike, NaiveDate};
use regex_lite::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Match weights: a title hit dominates, tags and excerpt corroborate,
/// a seed author nudges
const TITLE_MATCH: f64 = 2.0;
const TAG_MATCH: f64 = 1.0;
const SEED_AUTHOR_MATCH: f64 = 0.5;
const EXCERPT_MATCH: f64 = 1.0;

/// Milestones reported per thread, and the interval count used to spread
/// picks across the thread's date range
const MILESTONE_LIMIT: usize = 5;
const MILESTONE_INTERVALS: i64 = 5;
/// A year counts as active with at least this many member topics
const ACTIVE_YEAR_MIN_TOPICS: usize = 3;
/// Most-mentioned proposals reported per thread
const TOP_PROPOSAL_LIMIT: usize = 5;

/// One research thread definition
pub struct ThreadDefinition {
    pub id: String,
    pub name: String,
    title_patterns: Vec<Regex>,
    tag_patterns: Vec<Regex>,
    seed_authors: BTreeSet<String>,
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>, AnalysisError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| AnalysisError::Pattern {
                pattern: p.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}

impl ThreadDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        title_patterns: &[&str],
        tag_patterns: &[&str],
        seed_authors: &[&str],
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            id: id.into(),
            name: name.into(),
            title_patterns: compile_all(title_patterns)?,
            tag_patterns: compile_all(tag_patterns)?,
            seed_authors: seed_authors.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// The ordered library of thread definitions
pub struct ThreadLibrary {
    definitions: Vec<ThreadDefinition>,
}

impl ThreadLibrary {
    pub fn new(definitions: Vec<ThreadDefinition>) -> Self {
        Self { definitions }
    }

    pub fn definitions(&self) -> &[ThreadDefinition] {
        &self.definitions
    }

    /// The eleven-thread library for the Ethereum research corpus
    pub fn builtin() -> Result<Self, AnalysisError> {
        let definitions = vec![
            ThreadDefinition::new(
                "pbs_mev",
                "PBS, MEV & Block Production",
                &[
                    r"proposer.builder",
                    r"\bpbs\b",
                    r"\bmev\b",
                    r"block.?build",
                    r"mev.?burn",
                    r"epbs",
                    r"enshrined.*proposer",
                    r"builder.?separation",
                    r"auction",
                    r"block.?production",
                    r"payload.?timeliness",
                    r"proposer.?builder",
                    r"block.?builder",
                    r"mev.?boost",
                    r"order.?flow",
                    r"block.?auction",
                    r"timing.?game",
                ],
                &[r"pbs", r"mev", r"builder"],
                &["vbuterin", "JustinDrake", "mikeneuder", "quintus", "barnabe"],
            )?,
            ThreadDefinition::new(
                "sharding_da",
                "Sharding & Data Availability",
                &[
                    r"\bshard",
                    r"data.?availab",
                    r"\bdas\b",
                    r"danksharding",
                    r"proto.?dank",
                    r"blob",
                    r"4844",
                    r"peer.?das",
                    r"data.?column",
                    r"erasure.?cod",
                    r"kzg",
                    r"kate.?commitment",
                    r"stateless.?client",
                    r"fulldas",
                    r"full.?das",
                    r"peerdas",
                    r"big.?block",
                    r"block.?size",
                    r"blob.?count",
                    r"target.?blob",
                    r"blob.?market",
                ],
                &[r"shard", r"data-availab", r"blob", r"das"],
                &["vbuterin", "JustinDrake", "dankrad"],
            )?,
            ThreadDefinition::new(
                "plasma_l2",
                "Plasma & L2 Scaling",
                &[
                    r"\bplasma\b",
                    r"rollup",
                    r"\bl2\b",
                    r"layer.?2",
                    r"based.?rollup",
                    r"native.?rollup",
                    r"optimistic.?roll",
                    r"zk.?roll",
                    r"state.?channel",
                    r"pre.?confirmation",
                    r"sequenc",
                    r"optimistic",
                    r"bridge",
                    r"cross.?chain",
                ],
                &[r"plasma", r"rollup", r"layer-2"],
                &["vbuterin", "JustinDrake", "karl"],
            )?,
            ThreadDefinition::new(
                "pos_casper",
                "Consensus & Finality",
                &[
                    r"casper",
                    r"proof.?of.?stake",
                    r"\bpos\b",
                    r"beacon.?chain",
                    r"finality",
                    r"fork.?choice",
                    r"lmd.?ghost",
                    r"ffg",
                    r"cbc",
                    r"slashing",
                    r"attestat",
                    r"single.?slot.?final",
                    r"\bssf\b",
                    r"orbit.?ssf",
                    r"3sf",
                    r"slot.?final",
                    r"finality.?gadget",
                    r"committee",
                    r"validator.?set",
                    r"rainbow.?staking",
                    r"liquid.?staking",
                ],
                &[r"casper", r"pos", r"beacon", r"ssf"],
                &["vbuterin", "JustinDrake", "djrtwo", "fradamt"],
            )?,
            ThreadDefinition::new(
                "issuance_economics",
                "Issuance & Staking Economics",
                &[
                    r"issuance",
                    r"staking.?econom",
                    r"endgame.?stak",
                    r"yield",
                    r"minimum.?viable.?issuance",
                    r"reward.?curve",
                    r"staking.?ratio",
                    r"max.?eb\b",
                    r"max_effective_balance",
                    r"validator.?economics",
                    r"consolidat",
                    r"staking.?reward",
                    r"issuance.?curve",
                    r"endgame.*stak",
                ],
                &[r"issuance", r"staking", r"economics"],
                &["barnabe", "casparschwa", "aelowsson", "anderselowsson"],
            )?,
            ThreadDefinition::new(
                "inclusion_lists",
                "Inclusion Lists & Censorship Resistance",
                &[
                    r"inclusion.?list",
                    r"\bfocil\b",
                    r"censorship.?resist",
                    r"unconditional.?inclusion",
                    r"crlist",
                    r"force.?inclus",
                    r"censorship",
                    r"il.?design",
                    r"focil",
                    r"unconditional",
                ],
                &[r"inclusion-list", r"censorship"],
                &["mikeneuder", "fradamt", "vbuterin"],
            )?,
            ThreadDefinition::new(
                "based_preconf",
                "Based Sequencing & Preconfirmations",
                &[
                    r"based.?sequenc",
                    r"pre.?confirm",
                    r"preconf",
                    r"based.?rollup",
                    r"proposer.?commit",
                    r"pre.?conf",
                ],
                &[r"preconf", r"based"],
                &["JustinDrake"],
            )?,
            ThreadDefinition::new(
                "zk_proofs",
                "ZK Proofs & SNARKs/STARKs",
                &[
                    r"\bzk\b",
                    r"snark",
                    r"stark",
                    r"plonk",
                    r"zero.?knowledge",
                    r"zkp",
                    r"groth16",
                    r"proof.?system",
                    r"verifiable.?comput",
                    r"recursive.?proof",
                    r"recursive",
                    r"folding",
                    r"halo",
                    r"kzg",
                ],
                &[r"zk", r"snark", r"stark"],
                &["barryWhiteHat"],
            )?,
            ThreadDefinition::new(
                "fee_markets",
                "Fee Markets & EIP-1559",
                &[
                    r"1559",
                    r"fee.?market",
                    r"base.?fee",
                    r"gas.?price",
                    r"multidimensional",
                    r"resource.?pric",
                    r"eip.?4844.*fee",
                    r"blob.?fee",
                    r"gas.?limit",
                    r"gas.?cost",
                ],
                &[r"1559", r"fee-market", r"gas"],
                &["vbuterin", "barnabe"],
            )?,
            ThreadDefinition::new(
                "privacy_identity",
                "Privacy & Identity",
                &[
                    r"privacy",
                    r"\bmaci\b",
                    r"mixer",
                    r"anonymous",
                    r"stealth.?addr",
                    r"tornado",
                    r"ring.?sig",
                    r"zk.?passport",
                    r"identity",
                    r"semaphore",
                    r"rln",
                ],
                &[r"privacy", r"identity"],
                &["barryWhiteHat"],
            )?,
            ThreadDefinition::new(
                "state_execution",
                "State & Execution Layer",
                &[
                    r"verkle",
                    r"stateless",
                    r"state.?expir",
                    r"state.?growth",
                    r"state.?size",
                    r"trie",
                    r"witness",
                    r"binary.?trie",
                    r"portal.?network",
                    r"history.?expir",
                    r"purge",
                    r"evm.*improv",
                    r"eof\b",
                    r"state.?rent",
                    r"access.?list",
                ],
                &[r"verkle", r"stateless", r"state"],
                &["vbuterin", "Nero_eth", "gballet"],
            )?,
        ];
        Ok(Self::new(definitions))
    }
}

/// A notable topic in a thread's history
#[derive(Debug, Clone, Serialize)]
pub struct ThreadMilestone {
    pub id: TopicId,
    pub title: String,
    pub date: NaiveDate,
    pub influence: f64,
    /// Why this topic was picked: "earliest", "latest", "peak_influence",
    /// "peak_citations", or "interval"
    pub note: &'static str,
}

/// Summary statistics for one populated thread
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    pub id: String,
    pub name: String,
    pub topic_count: usize,
    /// Member topics, strongest first
    pub topic_ids: Vec<TopicId>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Usernames weighted by role, strongest first
    pub key_authors: Vec<String>,
    /// Proposals the thread's topics are primarily about
    pub proposals: Vec<ProposalId>,
    /// Notable member topics in date order
    pub milestones: Vec<ThreadMilestone>,
    /// Year with the most member topics
    pub peak_year: Option<i32>,
    /// Years with at least three member topics
    pub active_years: Vec<i32>,
    /// Most-mentioned proposals, by count of mentioning members
    pub top_proposals: Vec<ProposalId>,
    /// Distinct creators over member count
    pub author_diversity: f64,
}

/// Assigns included topics to research threads
pub struct ThreadClassifier {
    library: ThreadLibrary,
    min_score: f64,
}

impl ThreadClassifier {
    pub fn new(library: ThreadLibrary, min_score: f64) -> Self {
        Self { library, min_score }
    }

    fn match_score(definition: &ThreadDefinition, topic: &Topic) -> f64 {
        let mut score = 0.0;
        let title = topic.title.to_lowercase();
        let tags: Vec<String> = topic.tags.iter().map(|t| t.to_lowercase()).collect();
        let excerpt = topic.excerpt.to_lowercase();

        if definition.title_patterns.iter().any(|p| p.is_match(&title)) {
            score += TITLE_MATCH;
        }
        if definition
            .tag_patterns
            .iter()
            .any(|p| tags.iter().any(|tag| p.is_match(tag)))
        {
            score += TAG_MATCH;
        }
        if definition.seed_authors.contains(&topic.author) {
            score += SEED_AUTHOR_MATCH;
        }
        if !excerpt.is_empty()
            && definition.title_patterns.iter().any(|p| p.is_match(&excerpt))
        {
            score += EXCERPT_MATCH;
        }
        score
    }

    /// Assign each included topic to its best-matching thread, if any.
    ///
    /// Only a strictly higher score displaces an earlier definition, so
    /// exact ties go to the first definition in library order.
    pub fn classify(&self, corpus: &Corpus, inclusion: &Inclusion) -> BTreeMap<TopicId, String> {
        let mut assignments = BTreeMap::new();
        for id in inclusion.ids() {
            let Some(topic) = corpus.get(id) else {
                continue;
            };
            let mut best: Option<&str> = None;
            let mut best_score = 0.0;
            for definition in self.library.definitions() {
                let s = Self::match_score(definition, topic);
                if s > best_score {
                    best_score = s;
                    best = Some(&definition.id);
                }
            }
            if best_score >= self.min_score {
                if let Some(thread_id) = best {
                    assignments.insert(*id, thread_id.to_string());
                }
            }
        }
        debug!(assigned = assignments.len(), "thread classification complete");
        assignments
    }

    /// Build per-thread summaries from assignments; empty threads are
    /// omitted. Summaries come out in library order.
    pub fn summarize(
        &self,
        corpus: &Corpus,
        assignments: &BTreeMap<TopicId, String>,
        scores: &super::scoring::TopicScores,
        mentions: &BTreeMap<TopicId, Mentions>,
        graph: &CitationGraph,
    ) -> Vec<ThreadSummary> {
        let mut summaries = Vec::new();
        for definition in self.library.definitions() {
            let mut members: Vec<TopicId> = assignments
                .iter()
                .filter(|(_, thread)| **thread == definition.id)
                .map(|(id, _)| *id)
                .collect();
            if members.is_empty() {
                continue;
            }
            members.sort_by(|a, b| {
                scores
                    .get(b)
                    .total_cmp(&scores.get(a))
                    .then_with(|| a.cmp(b))
            });

            let mut first_date: Option<NaiveDate> = None;
            let mut last_date: Option<NaiveDate> = None;
            let mut dated: Vec<(NaiveDate, TopicId)> = Vec::new();
            let mut year_counts: BTreeMap<i32, usize> = BTreeMap::new();
            let mut creators: BTreeSet<&str> = BTreeSet::new();
            let mut author_weight: BTreeMap<String, f64> = BTreeMap::new();
            let mut proposals: BTreeSet<ProposalId> = BTreeSet::new();
            let mut proposal_counts: BTreeMap<ProposalId, usize> = BTreeMap::new();
            for id in &members {
                let Some(topic) = corpus.get(id) else {
                    continue;
                };
                if let Some(date) = topic.date {
                    first_date = Some(first_date.map_or(date, |d| d.min(date)));
                    last_date = Some(last_date.map_or(date, |d| d.max(date)));
                    dated.push((date, *id));
                    *year_counts.entry(date.year()).or_insert(0) += 1;
                }
                creators.insert(&topic.author);
                *author_weight.entry(topic.author.clone()).or_insert(0.0) += 1.0;
                for participant in &topic.participants {
                    if participant.username != topic.author {
                        *author_weight
                            .entry(participant.username.clone())
                            .or_insert(0.0) += 0.5;
                    }
                }
                if let Some(topic_mentions) = mentions.get(id) {
                    proposals.extend(topic_mentions.primary.iter().copied());
                    for proposal in &topic_mentions.all {
                        *proposal_counts.entry(*proposal).or_insert(0) += 1;
                    }
                }
            }
            dated.sort();

            let mut weighted: Vec<(String, f64)> = author_weight.into_iter().collect();
            weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let key_authors: Vec<String> =
                weighted.into_iter().take(10).map(|(name, _)| name).collect();

            let peak_year = year_counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(year, _)| *year);
            let active_years: Vec<i32> = year_counts
                .iter()
                .filter(|(_, count)| **count >= ACTIVE_YEAR_MIN_TOPICS)
                .map(|(year, _)| *year)
                .collect();
            let mut counted: Vec<(ProposalId, usize)> = proposal_counts.into_iter().collect();
            counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let top_proposals: Vec<ProposalId> = counted
                .into_iter()
                .take(TOP_PROPOSAL_LIMIT)
                .map(|(id, _)| id)
                .collect();
            let author_diversity =
                (creators.len() as f64 / members.len() as f64 * 10_000.0).round() / 10_000.0;
            let milestones = Self::milestones(corpus, &dated, scores, graph);

            summaries.push(ThreadSummary {
                id: definition.id.clone(),
                name: definition.name.clone(),
                topic_count: members.len(),
                topic_ids: members,
                first_date,
                last_date,
                key_authors,
                proposals: proposals.into_iter().collect(),
                milestones,
                peak_year,
                active_years,
                top_proposals,
                author_diversity,
            });
        }
        summaries
    }

    /// Pick up to five notable members: the earliest and latest, the
    /// influence peak, the most-cited-within-thread topic, and interval
    /// picks spread across the date range. Undated members never appear.
    fn milestones(
        corpus: &Corpus,
        dated: &[(NaiveDate, TopicId)],
        scores: &super::scoring::TopicScores,
        graph: &CitationGraph,
    ) -> Vec<ThreadMilestone> {
        let (Some(&(first_date, earliest)), Some(&(last_date, latest))) =
            (dated.first(), dated.last())
        else {
            return Vec::new();
        };

        // In-degree counted over thread-internal citations only
        let member_set: BTreeSet<TopicId> = dated.iter().map(|(_, id)| *id).collect();
        let mut internal_in: BTreeMap<TopicId, usize> = BTreeMap::new();
        for id in &member_set {
            if let Some(targets) = graph.outgoing(id) {
                for target in targets {
                    if member_set.contains(target) {
                        *internal_in.entry(*target).or_insert(0) += 1;
                    }
                }
            }
        }
        let peak_citations = internal_in
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(id, _)| *id);

        let mut peak_influence = earliest;
        for (_, id) in &dated[1..] {
            if scores.get(id) > scores.get(&peak_influence) {
                peak_influence = *id;
            }
        }

        let span = (last_date - first_date).num_days();
        let mut interval_picks: BTreeMap<i64, TopicId> = BTreeMap::new();
        if span > 0 {
            for (date, id) in dated {
                let offset = (*date - first_date).num_days();
                let bucket =
                    ((offset * MILESTONE_INTERVALS) / span).min(MILESTONE_INTERVALS - 1);
                let replace = interval_picks
                    .get(&bucket)
                    .map_or(true, |prev| scores.get(id) > scores.get(prev));
                if replace {
                    interval_picks.insert(bucket, *id);
                }
            }
        } else {
            interval_picks.insert(0, peak_influence);
        }

        let mut picks: Vec<(TopicId, &'static str)> = vec![(earliest, "earliest")];
        for (id, note) in [(latest, "latest"), (peak_influence, "peak_influence")] {
            if !picks.iter().any(|(seen, _)| *seen == id) {
                picks.push((id, note));
            }
        }
        if let Some(id) = peak_citations {
            if !picks.iter().any(|(seen, _)| *seen == id) {
                picks.push((id, "peak_citations"));
            }
        }
        for (_, id) in interval_picks {
            if picks.len() >= MILESTONE_LIMIT {
                break;
            }
            if !picks.iter().any(|(seen, _)| *seen == id) {
                picks.push((id, "interval"));
            }
        }

        let mut milestones: Vec<ThreadMilestone> = picks
            .into_iter()
            .filter_map(|(id, note)| {
                let topic = corpus.get(&id)?;
                Some(ThreadMilestone {
                    id,
                    title: topic.title.clone(),
                    date: topic.date?,
                    influence: scores.get(&id),
                    note,
                })
            })
            .collect();
        milestones.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        milestones
    }
}
