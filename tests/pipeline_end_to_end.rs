//! End-to-end pipeline behavior over a small synthetic corpus.
//!
//! The corpus: topic 1 is heavily cited and engages well, cites topic 2;
//! topic 2 is modest; topic 3 is isolated and quiet; topics 10-14 exist
//! only to cite topic 1.

use chrono::NaiveDate;
use serde_json::Value;
use skein::{
    AnalysisConfig, Corpus, Paper, Pipeline, Post, PostLink, Proposal, ProposalCatalog,
    ProposalId, ProposalStatus, Tier, Topic, TopicId, UpgradeTimeline,
};

fn citing_post(targets: &[u64], cooked: &str) -> Post {
    Post {
        post_number: 1,
        username: "poster".into(),
        cooked: cooked.into(),
        links: targets
            .iter()
            .map(|t| PostLink {
                url: format!("https://ethresear.ch/t/topic/{t}"),
                internal: true,
                reflection: false,
            })
            .collect(),
    }
}

fn build_corpus() -> Corpus {
    let mut corpus = Corpus::new();
    corpus.insert(
        Topic::new(1u64, "Danksharding with blobs", "alice")
            .with_date(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap())
            .with_engagement(5000, 100, 30)
            .with_posts(vec![citing_post(
                &[2],
                "EIP-4844 blobs. EIP-4844 again. EIP-4844 a third time.",
            )]),
    );
    corpus.insert(
        Topic::new(2u64, "Plasma exit games", "alice")
            .with_date(NaiveDate::from_ymd_opt(2018, 3, 1).unwrap())
            .with_engagement(50, 2, 2),
    );
    corpus.insert(Topic::new(3u64, "An isolated musing", "bob").with_engagement(0, 0, 1));
    for (i, author) in [(10u64, "c1"), (11, "c2"), (12, "c3"), (13, "c4"), (14, "c5")] {
        corpus.insert(
            Topic::new(i, "A reply topic", author)
                .with_engagement(10, 0, 1)
                .with_posts(vec![citing_post(&[1], "see the blob thread")]),
        );
    }
    corpus
}

fn build_catalog() -> ProposalCatalog {
    let mut catalog = ProposalCatalog::new();
    catalog.insert(
        Proposal::new(4844u32, "Shard Blob Transactions", ProposalStatus::Final)
            .with_fork("Dencun"),
    );
    catalog
}

fn build_pipeline() -> Pipeline {
    let config =
        AnalysisConfig::new().with_today(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    Pipeline::new(config).unwrap()
}

fn papers() -> Vec<Paper> {
    vec![
        Paper::new("arxiv:1", "Availability sampling")
            .with_year(2020)
            .with_citations(40)
            .with_relevance(0.9),
        Paper::new("arxiv:2", "A minor note")
            .with_year(2020)
            .with_citations(0)
            .with_relevance(0.1),
    ]
}

#[test]
fn tiering_follows_citation_structure() {
    let pipeline = build_pipeline();
    let inclusion = pipeline.select_only(&build_corpus());

    // The cited hub is Tier 1, its citation target rides in as Tier 2,
    // and the isolated topic stays out even after the relax pass
    assert_eq!(inclusion.tier(&TopicId::new(1)), Some(Tier::Tier1));
    assert_eq!(inclusion.tier(&TopicId::new(2)), Some(Tier::Tier2));
    assert!(!inclusion.contains(&TopicId::new(3)));
    assert_eq!(inclusion.len(), 2);
}

#[test]
fn report_covers_included_topics_only() {
    let pipeline = build_pipeline();
    let report = pipeline.run(
        &build_corpus(),
        &build_catalog(),
        &UpgradeTimeline::builtin(),
        &papers(),
    );

    assert_eq!(report.metadata.total_topics, 8);
    assert_eq!(report.metadata.included_topics, 2);
    assert_eq!(report.metadata.total_edges, 6);
    assert!(report.topics.contains_key(&TopicId::new(1)));
    assert!(report.topics.contains_key(&TopicId::new(2)));
    assert!(!report.topics.contains_key(&TopicId::new(3)));
    assert_eq!(report.metadata.era_distribution.get("endgame"), Some(&1));
    assert_eq!(
        report.metadata.era_distribution.get("scaling_wars"),
        Some(&1)
    );
}

#[test]
fn topic_rows_carry_restricted_references_and_metadata() {
    let pipeline = build_pipeline();
    let report = pipeline.run(
        &build_corpus(),
        &build_catalog(),
        &UpgradeTimeline::builtin(),
        &papers(),
    );

    let hub = &report.topics[&TopicId::new(1)];
    assert_eq!(hub.in_degree, 5);
    assert_eq!(hub.references, vec![TopicId::new(2)]);
    // The citing topics were not included, so nothing survives the
    // restriction to the working set
    assert!(hub.referenced_by.is_empty());
    assert_eq!(hub.thread.as_deref(), Some("sharding_da"));
    assert_eq!(hub.era, "endgame");
    assert_eq!(hub.mentions, vec![ProposalId::new(4844)]);
    assert_eq!(hub.primary_mentions, vec![ProposalId::new(4844)]);
    assert!(hub.shipped_in.is_empty());

    let target = &report.topics[&TopicId::new(2)];
    assert_eq!(target.referenced_by, vec![TopicId::new(1)]);
    assert_eq!(target.thread.as_deref(), Some("plasma_l2"));
    assert_eq!(target.era, "scaling_wars");
}

#[test]
fn cross_entity_scores_and_combined_ranking() {
    let pipeline = build_pipeline();
    let report = pipeline.run(
        &build_corpus(),
        &build_catalog(),
        &UpgradeTimeline::builtin(),
        &papers(),
    );

    // Final + shipped Dencun + singleton venue/citation percentiles
    let proposal = &report.proposals[&ProposalId::new(4844)];
    assert!(proposal.intrinsic_score > 0.3);
    assert_eq!(proposal.citation_count, 1);

    let cited = &report.papers[&skein::PaperId::from("arxiv:1")];
    let uncited = &report.papers[&skein::PaperId::from("arxiv:2")];
    assert!(cited.intrinsic_score > uncited.intrinsic_score);
    assert_eq!(cited.final_score, 1.0);
    assert_eq!(uncited.final_score, 0.0);

    // The boosted hub tops its population and the combined list
    assert_eq!(report.combined_ranking[0].id, "1");
    assert_eq!(report.combined_ranking[0].score, 1.0);
    assert_eq!(
        report.combined_ranking.len(),
        report.metadata.total_topics + 1 + 2
    );
}

#[test]
fn author_profiles_roll_up_created_topics() {
    let pipeline = build_pipeline();
    let report = pipeline.run(
        &build_corpus(),
        &build_catalog(),
        &UpgradeTimeline::builtin(),
        &papers(),
    );

    // Only alice created two included topics
    assert_eq!(report.authors.len(), 1);
    let alice = &report.authors[0];
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.topics_created, 2);
    assert_eq!(alice.total_in_degree, 6);
    assert_eq!(alice.top_topics[0], TopicId::new(1));
}

#[test]
fn thread_summaries_cover_assigned_topics() {
    let pipeline = build_pipeline();
    let report = pipeline.run(
        &build_corpus(),
        &build_catalog(),
        &UpgradeTimeline::builtin(),
        &papers(),
    );

    let ids: Vec<&str> = report.threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["sharding_da", "plasma_l2"]);
    let sharding = &report.threads[0];
    assert_eq!(sharding.topic_ids, vec![TopicId::new(1)]);
    assert_eq!(sharding.proposals, vec![ProposalId::new(4844)]);
    assert_eq!(
        sharding.first_date,
        NaiveDate::from_ymd_opt(2023, 5, 1)
    );

    // A single dated member collapses every milestone role into one entry
    assert_eq!(sharding.milestones.len(), 1);
    assert_eq!(sharding.milestones[0].id, TopicId::new(1));
    assert_eq!(sharding.milestones[0].note, "earliest");
    assert_eq!(sharding.peak_year, Some(2023));
    assert!(sharding.active_years.is_empty());
    assert_eq!(sharding.top_proposals, vec![ProposalId::new(4844)]);
    assert_eq!(sharding.author_diversity, 1.0);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let corpus = build_corpus();
    let catalog = build_catalog();
    let upgrades = UpgradeTimeline::builtin();
    let papers = papers();
    let pipeline = build_pipeline();

    let strip_timestamp = |report: &skein::AnalysisReport| -> Value {
        let mut value = serde_json::to_value(report).unwrap();
        value["metadata"]
            .as_object_mut()
            .unwrap()
            .remove("generated_at");
        value
    };

    let first = strip_timestamp(&pipeline.run(&corpus, &catalog, &upgrades, &papers));
    let second = strip_timestamp(&pipeline.run(&corpus, &catalog, &upgrades, &papers));
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
