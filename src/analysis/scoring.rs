//! Per-entity-type influence scoring
//!
//! Three independent scorers, one per entity population. Topics carry
//! two deliberately different formulas: the first pass feeds tiering and
//! uses min-max scaling, the second pass feeds the combined ranking and
//! uses percentile ranks. Both are emitted; downstream consumers compare
//! them.

use super::links::{CitationGraph, Mentions};
use super::normalize::{min_max, percentile_ranks};
use crate::corpus::{Corpus, Paper, PaperId, ProposalCatalog, ProposalId, TopicId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Topic scores keyed by id; missing topics read as zero
#[derive(Debug, Clone, Default)]
pub struct TopicScores {
    scores: BTreeMap<TopicId, f64>,
}

impl TopicScores {
    pub fn get(&self, id: &TopicId) -> f64 {
        self.scores.get(id).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopicId, &f64)> {
        self.scores.iter()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl From<BTreeMap<TopicId, f64>> for TopicScores {
    fn from(scores: BTreeMap<TopicId, f64>) -> Self {
        Self { scores }
    }
}

/// Signal weights for the first-pass topic score
#[derive(Debug, Clone)]
pub struct FirstPassWeights {
    pub in_degree: f64,
    pub likes: f64,
    pub views: f64,
    pub posts: f64,
    pub prolific_bonus: f64,
}

impl Default for FirstPassWeights {
    fn default() -> Self {
        Self {
            in_degree: 0.30,
            likes: 0.25,
            views: 0.20,
            posts: 0.15,
            prolific_bonus: 0.10,
        }
    }
}

/// Minimum authored topics for the prolific bonus
const PROLIFIC_MIN_TOPICS: usize = 5;

/// Second-pass weights: citation and engagement percentiles, equal split
const SECOND_PASS_CITATION_WEIGHT: f64 = 0.50;
const SECOND_PASS_ENGAGEMENT_WEIGHT: f64 = 0.50;

pub struct InfluenceScorer {
    anchor_year: i32,
    weights: FirstPassWeights,
}

impl InfluenceScorer {
    pub fn new(anchor_year: i32) -> Self {
        Self {
            anchor_year,
            weights: FirstPassWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: FirstPassWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Authors with at least five topics in the full corpus.
    ///
    /// Computed once before any filtering; prolificacy is a fixed input
    /// to scoring, never recomputed per tier pass.
    pub fn prolific_authors(&self, corpus: &Corpus) -> BTreeSet<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for topic in corpus.topics() {
            *counts.entry(topic.author.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n >= PROLIFIC_MIN_TOPICS)
            .map(|(author, _)| author.to_string())
            .collect()
    }

    /// First-pass topic score over the full corpus, used for tiering
    pub fn first_pass(
        &self,
        corpus: &Corpus,
        graph: &CitationGraph,
        prolific: &BTreeSet<String>,
    ) -> TopicScores {
        let ids: Vec<TopicId> = corpus.ids().collect();
        let mut in_degree = Vec::with_capacity(ids.len());
        let mut likes = Vec::with_capacity(ids.len());
        let mut views = Vec::with_capacity(ids.len());
        let mut posts = Vec::with_capacity(ids.len());
        for topic in corpus.topics() {
            in_degree.push(graph.in_degree_of(&topic.id) as f64);
            likes.push(topic.likes as f64);
            views.push((topic.views as f64).ln_1p());
            posts.push(topic.posts_count as f64);
        }

        let in_degree = min_max(&in_degree);
        let likes = min_max(&likes);
        let views = min_max(&views);
        let posts = min_max(&posts);

        let w = &self.weights;
        let mut scores = BTreeMap::new();
        for (i, id) in ids.iter().enumerate() {
            let mut score = w.in_degree * in_degree[i]
                + w.likes * likes[i]
                + w.views * views[i]
                + w.posts * posts[i];
            if let Some(topic) = corpus.get(id) {
                if prolific.contains(&topic.author) {
                    score += w.prolific_bonus;
                }
            }
            scores.insert(*id, score);
        }
        debug!(topics = scores.len(), "first-pass topic scores computed");
        scores.into()
    }

    /// Second-pass topic intrinsic score over the full corpus, used for
    /// the combined ranking
    pub fn second_pass(&self, corpus: &Corpus, graph: &CitationGraph) -> TopicScores {
        let ids: Vec<TopicId> = corpus.ids().collect();
        let mut citations = Vec::with_capacity(ids.len());
        let mut engagement = Vec::with_capacity(ids.len());
        for topic in corpus.topics() {
            citations.push(graph.in_degree_of(&topic.id) as f64);
            engagement.push(
                topic.likes as f64
                    + (topic.posts_count as f64).sqrt()
                    + (topic.views as f64).ln_1p(),
            );
        }

        let citations = percentile_ranks(&citations);
        let engagement = percentile_ranks(&engagement);

        let scores: BTreeMap<TopicId, f64> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                (
                    *id,
                    SECOND_PASS_CITATION_WEIGHT * citations[i]
                        + SECOND_PASS_ENGAGEMENT_WEIGHT * engagement[i],
                )
            })
            .collect();
        scores.into()
    }

    /// Corpus-wide citation counts per proposal, from all mentions
    pub fn proposal_citation_counts(
        &self,
        mentions: &BTreeMap<TopicId, Mentions>,
    ) -> BTreeMap<ProposalId, u64> {
        let mut counts = BTreeMap::new();
        for topic_mentions in mentions.values() {
            for id in &topic_mentions.all {
                *counts.entry(*id).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Intrinsic scores for the standards catalog
    pub fn proposals(
        &self,
        catalog: &ProposalCatalog,
        citations: &BTreeMap<ProposalId, u64>,
        shipped_upgrades: &BTreeSet<String>,
    ) -> BTreeMap<ProposalId, f64> {
        let ids: Vec<ProposalId> = catalog.ids().collect();
        let mut venue = Vec::with_capacity(ids.len());
        let mut cited = Vec::with_capacity(ids.len());
        for p in catalog.entries() {
            venue.push(
                p.venue_likes as f64
                    + (p.venue_views as f64).ln_1p()
                    + (p.venue_posts as f64).sqrt(),
            );
            cited.push(citations.get(&p.id).copied().unwrap_or(0) as f64);
        }
        let venue = percentile_ranks(&venue);
        let cited = percentile_ranks(&cited);

        let mut scores = BTreeMap::new();
        for (i, p) in catalog.entries().enumerate() {
            let shipped = match &p.fork {
                Some(fork) if shipped_upgrades.contains(fork) => 1.0,
                _ => 0.0,
            };
            let requires = (0.15 * p.requires.len() as f64).min(1.0);
            let score = 0.20 * p.status.weight()
                + 0.25 * venue[i]
                + 0.25 * cited[i]
                + 0.20 * shipped
                + 0.10 * requires;
            scores.insert(ids[i], score);
        }
        scores
    }

    /// Intrinsic scores for the paper catalog.
    ///
    /// Citations are ranked among nonzero-cited papers only, so a sea of
    /// uncited entries cannot inflate the ranks of cited ones. Recent
    /// papers are damped relative to the anchor year because their
    /// citation counts have not matured.
    pub fn papers(&self, papers: &[Paper]) -> BTreeMap<PaperId, f64> {
        let citations = nonzero_citation_ranks(papers);
        let relevance: Vec<f64> = papers.iter().map(|p| p.relevance).collect();
        let relevance = percentile_ranks(&relevance);

        let mut scores = BTreeMap::new();
        for (i, paper) in papers.iter().enumerate() {
            let base = 0.55 * citations[i] + 0.45 * relevance[i];
            scores.insert(paper.id.clone(), base * self.recency_damp(paper.year));
        }
        scores
    }

    fn recency_damp(&self, year: Option<i32>) -> f64 {
        match year {
            Some(y) if y == self.anchor_year => 0.6,
            Some(y) if y == self.anchor_year - 1 => 0.75,
            Some(y) if y == self.anchor_year - 2 => 0.9,
            _ => 1.0,
        }
    }
}

/// Rank citation counts among nonzero-cited papers; zero-cited papers
/// score 0.0. A lone nonzero entry gets the neutral 0.5. With several,
/// each nonzero count maps to `count(nonzero ≤ it) / len(nonzero)`, so
/// tied nonzero counts share a nonzero rank and the maximum reaches 1.0.
fn nonzero_citation_ranks(papers: &[Paper]) -> Vec<f64> {
    let mut nonzero: Vec<u64> = papers.iter().map(|p| p.cited_by).filter(|&c| c > 0).collect();
    nonzero.sort_unstable();

    match nonzero.len() {
        0 => vec![0.0; papers.len()],
        1 => papers
            .iter()
            .map(|p| if p.cited_by > 0 { 0.5 } else { 0.0 })
            .collect(),
        n => papers
            .iter()
            .map(|p| {
                if p.cited_by == 0 {
                    0.0
                } else {
                    nonzero.partition_point(|&x| x <= p.cited_by) as f64 / n as f64
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::links::LinkExtractor;
    use crate::corpus::{Post, PostLink, Proposal, ProposalStatus, Topic};

    fn citing_post(targets: &[u64]) -> Post {
        Post {
            post_number: 1,
            username: "a".into(),
            cooked: String::new(),
            links: targets
                .iter()
                .map(|t| PostLink {
                    url: format!("https://ethresear.ch/t/x/{t}"),
                    internal: true,
                    reflection: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_prolific_authors_threshold() {
        let mut corpus = Corpus::new();
        for id in 1..=5u64 {
            corpus.insert(Topic::new(id, "t", "alice"));
        }
        for id in 6..=9u64 {
            corpus.insert(Topic::new(id, "t", "bob"));
        }
        let scorer = InfluenceScorer::new(2026);
        let prolific = scorer.prolific_authors(&corpus);
        assert!(prolific.contains("alice"));
        assert!(!prolific.contains("bob"));
    }

    #[test]
    fn test_first_pass_orders_by_signal() {
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let mut corpus = Corpus::new();
        corpus.insert(
            Topic::new(1u64, "cites", "a")
                .with_engagement(10, 1, 2)
                .with_posts(vec![citing_post(&[2])]),
        );
        corpus.insert(Topic::new(2u64, "cited and liked", "b").with_engagement(5000, 80, 40));
        corpus.insert(Topic::new(3u64, "quiet", "c").with_engagement(0, 0, 1));
        let graph = CitationGraph::build(&corpus, &extractor);

        let scorer = InfluenceScorer::new(2026);
        let scores = scorer.first_pass(&corpus, &graph, &BTreeSet::new());
        assert!(scores.get(&TopicId::new(2)) > scores.get(&TopicId::new(1)));
        assert!(scores.get(&TopicId::new(1)) > scores.get(&TopicId::new(3)));
    }

    #[test]
    fn test_first_pass_prolific_bonus() {
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let mut corpus = Corpus::new();
        corpus.insert(Topic::new(1u64, "t", "alice").with_engagement(100, 5, 3));
        corpus.insert(Topic::new(2u64, "t", "bob").with_engagement(100, 5, 3));
        let graph = CitationGraph::build(&corpus, &extractor);

        let scorer = InfluenceScorer::new(2026);
        let prolific = BTreeSet::from(["alice".to_string()]);
        let scores = scorer.first_pass(&corpus, &graph, &prolific);
        let diff = scores.get(&TopicId::new(1)) - scores.get(&TopicId::new(2));
        assert!((diff - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_second_pass_differs_from_first() {
        // Equal-weight percentile split: the cited topic outranks the
        // merely viewed one once views are log-damped
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let mut corpus = Corpus::new();
        corpus.insert(Topic::new(1u64, "a", "a").with_posts(vec![citing_post(&[2])]));
        corpus.insert(Topic::new(2u64, "cited", "b"));
        corpus.insert(Topic::new(3u64, "viewed", "c").with_engagement(100_000, 0, 1));
        let graph = CitationGraph::build(&corpus, &extractor);

        let scorer = InfluenceScorer::new(2026);
        let scores = scorer.second_pass(&corpus, &graph);
        assert!(scores.get(&TopicId::new(2)) > scores.get(&TopicId::new(1)));
    }

    #[test]
    fn test_proposal_status_and_shipped_terms() {
        let mut catalog = ProposalCatalog::new();
        catalog.insert(
            Proposal::new(1559u32, "Fee market", ProposalStatus::Final).with_fork("London"),
        );
        catalog.insert(Proposal::new(9999u32, "Draft idea", ProposalStatus::Draft));

        let scorer = InfluenceScorer::new(2026);
        let shipped = BTreeSet::from(["London".to_string()]);
        let scores = scorer.proposals(&catalog, &BTreeMap::new(), &shipped);

        // Both entries tie on the percentile terms; the gap is exactly
        // the status and shipped-upgrade terms
        let gap = scores[&ProposalId::new(1559)] - scores[&ProposalId::new(9999)];
        let expected = 0.20 * (1.0 - 0.3) + 0.20;
        assert!((gap - expected).abs() < 1e-12);
    }

    #[test]
    fn test_proposal_requires_term_caps() {
        let mut catalog = ProposalCatalog::new();
        catalog.insert(
            Proposal::new(1u32, "many prerequisites", ProposalStatus::Draft)
                .with_requires((100..110).map(ProposalId::new).collect()),
        );
        catalog.insert(Proposal::new(2u32, "none", ProposalStatus::Draft));

        let scorer = InfluenceScorer::new(2026);
        let scores = scorer.proposals(&catalog, &BTreeMap::new(), &BTreeSet::new());
        // 10 prerequisites saturate the 0.15-per-item term at 1.0
        let gap = scores[&ProposalId::new(1)] - scores[&ProposalId::new(2)];
        assert!((gap - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_paper_citation_ranks_nonzero_only() {
        let papers: Vec<Paper> = [0u64, 0, 5, 5, 20]
            .iter()
            .enumerate()
            .map(|(i, &c)| Paper::new(format!("p{i}"), "t").with_citations(c))
            .collect();
        let ranks = nonzero_citation_ranks(&papers);
        assert_eq!(ranks[0], 0.0);
        assert_eq!(ranks[1], 0.0);
        assert_eq!(ranks[2], ranks[3]);
        assert!(ranks[2] > 0.0);
        assert_eq!(ranks[4], 1.0);
    }

    #[test]
    fn test_paper_single_nonzero_is_neutral() {
        let papers = vec![
            Paper::new("a", "t").with_citations(0),
            Paper::new("b", "t").with_citations(7),
        ];
        assert_eq!(nonzero_citation_ranks(&papers), vec![0.0, 0.5]);
    }

    #[test]
    fn test_paper_recency_damping() {
        let scorer = InfluenceScorer::new(2026);
        assert_eq!(scorer.recency_damp(Some(2026)), 0.6);
        assert_eq!(scorer.recency_damp(Some(2025)), 0.75);
        assert_eq!(scorer.recency_damp(Some(2024)), 0.9);
        assert_eq!(scorer.recency_damp(Some(2020)), 1.0);
        assert_eq!(scorer.recency_damp(None), 1.0);
    }

    #[test]
    fn test_paper_scores_apply_damping() {
        let scorer = InfluenceScorer::new(2026);
        let papers = vec![
            Paper::new("old", "t")
                .with_year(2019)
                .with_citations(10)
                .with_relevance(0.8),
            Paper::new("new", "t")
                .with_year(2026)
                .with_citations(10)
                .with_relevance(0.8),
        ];
        let scores = scorer.papers(&papers);
        let old = scores[&PaperId::from("old")];
        let new = scores[&PaperId::from("new")];
        assert!((new - old * 0.6).abs() < 1e-12);
    }
}
