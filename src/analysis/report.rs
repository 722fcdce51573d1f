//! Serializable analysis output
//!
//! The report is the crate's only output surface. Every map is keyed by
//! an ordered id so serialization is byte-stable across runs on the same
//! input.

use super::authors::AuthorProfile;
use super::propagate::RankedEntity;
use super::threads::ThreadSummary;
use super::tiering::Tier;
use crate::corpus::{PaperId, ProposalId, TopicId};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Corpus-level counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportMetadata {
    pub total_topics: usize,
    pub included_topics: usize,
    pub skipped_records: usize,
    pub total_edges: usize,
    pub proposal_count: usize,
    pub paper_count: usize,
    /// Included topics per era id
    pub era_distribution: BTreeMap<String, usize>,
    pub generated_at: String,
}

/// Analysis output for one included topic
#[derive(Debug, Clone, Serialize)]
pub struct TopicRow {
    pub id: TopicId,
    pub title: String,
    pub author: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub tier: Tier,
    pub era: String,
    pub thread: Option<String>,
    /// First-pass score, used for tiering
    pub influence_score: f64,
    /// Second-pass score, used for the combined ranking
    pub intrinsic_score: f64,
    pub final_score: f64,
    pub in_degree: u64,
    pub out_degree: u64,
    /// Outgoing references, restricted to the included set
    pub references: Vec<TopicId>,
    /// Incoming references, restricted to the included set
    pub referenced_by: Vec<TopicId>,
    pub mentions: Vec<ProposalId>,
    pub primary_mentions: Vec<ProposalId>,
    /// Upgrades this topic's ideas landed in. Deciding whether an idea
    /// actually shipped needs semantic judgement this pipeline does not
    /// attempt, so the field stays empty.
    pub shipped_in: Vec<String>,
}

/// Analysis output for one standards-catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct ProposalRow {
    pub id: ProposalId,
    pub title: String,
    pub status: String,
    pub fork: Option<String>,
    pub citation_count: u64,
    pub intrinsic_score: f64,
    pub final_score: f64,
}

/// Analysis output for one paper
#[derive(Debug, Clone, Serialize)]
pub struct PaperRow {
    pub id: PaperId,
    pub title: String,
    pub year: Option<i32>,
    pub cited_by: u64,
    pub intrinsic_score: f64,
    pub final_score: f64,
}

/// The full analysis report
#[derive(Debug, Default, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub topics: BTreeMap<TopicId, TopicRow>,
    pub proposals: BTreeMap<ProposalId, ProposalRow>,
    pub papers: BTreeMap<PaperId, PaperRow>,
    pub threads: Vec<ThreadSummary>,
    pub authors: Vec<AuthorProfile>,
    pub combined_ranking: Vec<RankedEntity>,
}
