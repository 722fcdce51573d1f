//! Full analysis pipeline
//!
//! Wires the components together in dependency order: links feed
//! scoring, scoring feeds tiering, and everything downstream operates on
//! the included working set. The pipeline is a single synchronous pass;
//! rebuilding from scratch is the update model.

use super::authors::AuthorAggregator;
use super::links::{CitationGraph, LinkExtractor, MentionExtractor, Mentions};
use super::propagate::CrossEntityPropagator;
use super::report::{AnalysisReport, PaperRow, ProposalRow, ReportMetadata, TopicRow};
use super::scoring::InfluenceScorer;
use super::threads::{ThreadClassifier, ThreadLibrary};
use super::tiering::{Inclusion, InclusionFilter};
use super::types::{AnalysisConfig, AnalysisResult};
use crate::corpus::{
    Corpus, EraTimeline, Paper, ProposalCatalog, TopicId, UpgradeTimeline,
};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

pub struct Pipeline {
    config: AnalysisConfig,
    links: LinkExtractor,
    mentions: MentionExtractor,
    scorer: InfluenceScorer,
    filter: InclusionFilter,
    classifier: ThreadClassifier,
    aggregator: AuthorAggregator,
    propagator: CrossEntityPropagator,
    eras: EraTimeline,
}

impl Pipeline {
    /// Build a pipeline with the builtin thread library and era timeline
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        let links = LinkExtractor::for_host(&config.forum_host)?;
        let mentions = MentionExtractor::new()?;
        let classifier = ThreadClassifier::new(ThreadLibrary::builtin()?, config.thread_min_score);
        Ok(Self {
            links,
            mentions,
            scorer: InfluenceScorer::new(config.anchor_year),
            filter: InclusionFilter::new(config.tier.clone()),
            classifier,
            aggregator: AuthorAggregator::new(),
            propagator: CrossEntityPropagator::default(),
            eras: EraTimeline::builtin(),
            config,
        })
    }

    /// Swap in a custom thread library
    pub fn with_threads(mut self, library: ThreadLibrary) -> Self {
        self.classifier = ThreadClassifier::new(library, self.config.thread_min_score);
        self
    }

    /// Swap in a custom era timeline
    pub fn with_eras(mut self, eras: EraTimeline) -> Self {
        self.eras = eras;
        self
    }

    /// Run the full analysis over the loaded inputs
    pub fn run(
        &self,
        corpus: &Corpus,
        catalog: &ProposalCatalog,
        upgrades: &UpgradeTimeline,
        papers: &[Paper],
    ) -> AnalysisReport {
        info!(topics = corpus.len(), "building citation graph");
        let graph = CitationGraph::build(corpus, &self.links);
        let mentions: BTreeMap<TopicId, Mentions> = corpus
            .topics()
            .map(|t| (t.id, self.mentions.extract(t)))
            .collect();

        info!("scoring topics");
        let prolific = self.scorer.prolific_authors(corpus);
        let first_pass = self.scorer.first_pass(corpus, &graph, &prolific);

        info!("selecting working set");
        let inclusion = self.filter.select(corpus, &graph, &first_pass);

        info!(included = inclusion.len(), "classifying threads");
        let assignments = self.classifier.classify(corpus, &inclusion);

        info!("aggregating authors");
        let authors =
            self.aggregator
                .aggregate(corpus, &inclusion, &graph, &first_pass, &assignments);

        info!("scoring proposals and papers");
        let shipped = upgrades.shipped_names(self.config.today);
        let citations = self.scorer.proposal_citation_counts(&mentions);
        let proposal_intrinsic = self.scorer.proposals(catalog, &citations, &shipped);
        let paper_intrinsic = self.scorer.papers(papers);
        let second_pass = self.scorer.second_pass(corpus, &graph);

        info!("propagating cross-entity influence");
        let propagation = self.propagator.propagate(
            &second_pass,
            &mentions,
            catalog,
            &proposal_intrinsic,
            &paper_intrinsic,
            &shipped,
        );
        let threads = self
            .classifier
            .summarize(corpus, &assignments, &first_pass, &mentions, &graph);
        for thread in &threads {
            info!(thread = %thread.id, topics = thread.topic_count, "thread populated");
        }

        let mut era_distribution: BTreeMap<String, usize> = BTreeMap::new();
        let mut topics = BTreeMap::new();
        for id in inclusion.ids() {
            let Some(topic) = corpus.get(id) else {
                continue;
            };
            let restrict = |set: Option<&BTreeSet<TopicId>>| -> Vec<TopicId> {
                set.map(|s| {
                    s.iter()
                        .filter(|t| inclusion.contains(t))
                        .copied()
                        .collect()
                })
                .unwrap_or_default()
            };
            let topic_mentions = mentions.get(id).cloned().unwrap_or_default();
            let era = self.eras.era_for(topic.date).to_string();
            *era_distribution.entry(era.clone()).or_insert(0) += 1;
            topics.insert(
                *id,
                TopicRow {
                    id: *id,
                    title: topic.title.clone(),
                    author: topic.author.clone(),
                    date: topic.date,
                    category: topic.category.clone(),
                    // Inclusion membership implies a tier
                    tier: inclusion.tier(id).unwrap_or(super::tiering::Tier::Tier2),
                    era,
                    thread: assignments.get(id).cloned(),
                    influence_score: first_pass.get(id),
                    intrinsic_score: second_pass.get(id),
                    final_score: propagation.topic_final.get(id).copied().unwrap_or(0.0),
                    in_degree: graph.in_degree_of(id),
                    out_degree: graph.out_degree_of(id),
                    references: restrict(graph.outgoing(id)),
                    referenced_by: restrict(graph.incoming(id)),
                    mentions: topic_mentions.all.iter().copied().collect(),
                    primary_mentions: topic_mentions.primary.iter().copied().collect(),
                    shipped_in: Vec::new(),
                },
            );
        }

        let proposals: BTreeMap<_, _> = catalog
            .entries()
            .map(|p| {
                (
                    p.id,
                    ProposalRow {
                        id: p.id,
                        title: p.title.clone(),
                        status: p.status.as_str().to_string(),
                        fork: p.fork.clone(),
                        citation_count: citations.get(&p.id).copied().unwrap_or(0),
                        intrinsic_score: proposal_intrinsic.get(&p.id).copied().unwrap_or(0.0),
                        final_score: propagation.proposal_final.get(&p.id).copied().unwrap_or(0.0),
                    },
                )
            })
            .collect();

        let paper_rows: BTreeMap<_, _> = papers
            .iter()
            .map(|p| {
                (
                    p.id.clone(),
                    PaperRow {
                        id: p.id.clone(),
                        title: p.title.clone(),
                        year: p.year,
                        cited_by: p.cited_by,
                        intrinsic_score: paper_intrinsic.get(&p.id).copied().unwrap_or(0.0),
                        final_score: propagation.paper_final.get(&p.id).copied().unwrap_or(0.0),
                    },
                )
            })
            .collect();

        let metadata = ReportMetadata {
            total_topics: corpus.len(),
            included_topics: inclusion.len(),
            skipped_records: corpus.skipped(),
            total_edges: graph.edge_count(),
            proposal_count: catalog.len(),
            paper_count: papers.len(),
            era_distribution,
            generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        };
        info!(
            included = metadata.included_topics,
            edges = metadata.total_edges,
            "analysis complete"
        );

        AnalysisReport {
            metadata,
            topics,
            proposals,
            papers: paper_rows,
            threads,
            authors,
            combined_ranking: propagation.combined,
        }
    }

    /// The inclusion decision for a corpus, without the downstream stages
    pub fn select_only(&self, corpus: &Corpus) -> Inclusion {
        let graph = CitationGraph::build(corpus, &self.links);
        let prolific = self.scorer.prolific_authors(corpus);
        let first_pass = self.scorer.first_pass(corpus, &graph, &prolific);
        self.filter.select(corpus, &graph, &first_pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Topic;

    #[test]
    fn test_pipeline_builds_with_defaults() {
        assert!(Pipeline::new(AnalysisConfig::new()).is_ok());
    }

    #[test]
    fn test_run_on_empty_inputs() {
        let pipeline = Pipeline::new(AnalysisConfig::new()).unwrap();
        let report = pipeline.run(
            &Corpus::new(),
            &ProposalCatalog::new(),
            &UpgradeTimeline::builtin(),
            &[],
        );
        assert_eq!(report.metadata.total_topics, 0);
        assert!(report.topics.is_empty());
        assert!(report.combined_ranking.is_empty());
    }

    #[test]
    fn test_report_restricts_references_to_included() {
        // Handled end to end in tests/pipeline_end_to_end.rs; here we
        // only check that an isolated topic row carries empty lists
        let pipeline = Pipeline::new(AnalysisConfig::new()).unwrap();
        let mut corpus = Corpus::new();
        corpus.insert(Topic::new(1u64, "quiet topic", "a").with_engagement(10_000, 50, 20));
        let report = pipeline.run(
            &corpus,
            &ProposalCatalog::new(),
            &UpgradeTimeline::builtin(),
            &[],
        );
        let row = report.topics.get(&TopicId::new(1)).unwrap();
        assert!(row.references.is_empty());
        assert!(row.referenced_by.is_empty());
        assert!(row.shipped_in.is_empty());
    }
}
