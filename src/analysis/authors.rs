//! Per-contributor profile aggregation
//!
//! Rolls included topics up into author profiles plus a co-occurrence
//! view of who shows up on whose topics. Creation is what earns a
//! profile; commenting only feeds the post totals and co-researcher
//! counts.

use super::links::CitationGraph;
use super::scoring::TopicScores;
use super::tiering::Inclusion;
use crate::corpus::{Corpus, TopicId};
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Authority weights: creating and being cited dominate, likes trail
const AUTHORITY_TOPICS_WEIGHT: f64 = 2.0;
const AUTHORITY_LIKES_WEIGHT: f64 = 0.5;
const AUTHORITY_IN_DEGREE_WEIGHT: f64 = 3.0;

/// An aggregated contributor profile
#[derive(Debug, Clone, Serialize)]
pub struct AuthorProfile {
    pub username: String,
    pub topics_created: usize,
    /// Posts across all included topics the author participated in,
    /// created or not
    pub total_posts: u64,
    pub total_likes: u64,
    pub total_in_degree: u64,
    pub authority_score: f64,
    pub active_years: BTreeSet<i32>,
    /// (category, topics created) pairs, most frequent first
    pub category_focus: Vec<(String, usize)>,
    /// (thread id, topics created) pairs, most frequent first
    pub thread_focus: Vec<(String, usize)>,
    /// Created topics by descending first-pass score
    pub top_topics: Vec<TopicId>,
    /// (username, shared topics) pairs, most frequent first
    pub co_researchers: Vec<(String, u64)>,
}

struct AuthorAccumulator {
    topics_created: usize,
    total_likes: u64,
    total_in_degree: u64,
    active_years: BTreeSet<i32>,
    categories: BTreeMap<String, usize>,
    threads: BTreeMap<String, usize>,
    topic_ids: Vec<TopicId>,
}

impl AuthorAccumulator {
    fn new() -> Self {
        Self {
            topics_created: 0,
            total_likes: 0,
            total_in_degree: 0,
            active_years: BTreeSet::new(),
            categories: BTreeMap::new(),
            threads: BTreeMap::new(),
            topic_ids: Vec::new(),
        }
    }
}

fn top_counts<K: Ord + Clone, V: Ord + Copy>(
    counts: &BTreeMap<K, V>,
    limit: usize,
) -> Vec<(K, V)> {
    let mut pairs: Vec<(K, V)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs.truncate(limit);
    pairs
}

/// Builds author profiles from the included working set
pub struct AuthorAggregator {
    max_profiles: usize,
    min_topics_created: usize,
    co_researcher_limit: usize,
    top_topics_limit: usize,
    category_focus_limit: usize,
    thread_focus_limit: usize,
}

impl Default for AuthorAggregator {
    fn default() -> Self {
        Self {
            max_profiles: 40,
            min_topics_created: 2,
            co_researcher_limit: 10,
            top_topics_limit: 10,
            category_focus_limit: 5,
            thread_focus_limit: 3,
        }
    }
}

impl AuthorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_profiles(mut self, max_profiles: usize) -> Self {
        self.max_profiles = max_profiles;
        self
    }

    /// Aggregate included topics into ranked author profiles
    pub fn aggregate(
        &self,
        corpus: &Corpus,
        inclusion: &Inclusion,
        graph: &CitationGraph,
        scores: &TopicScores,
        assignments: &BTreeMap<TopicId, String>,
    ) -> Vec<AuthorProfile> {
        let mut creators: BTreeMap<String, AuthorAccumulator> = BTreeMap::new();
        let mut post_totals: BTreeMap<String, u64> = BTreeMap::new();

        for id in inclusion.ids() {
            let Some(topic) = corpus.get(id) else {
                continue;
            };

            let acc = creators
                .entry(topic.author.clone())
                .or_insert_with(AuthorAccumulator::new);
            acc.topics_created += 1;
            acc.total_likes += topic.likes;
            acc.total_in_degree += graph.in_degree_of(id);
            if let Some(date) = topic.date {
                acc.active_years.insert(date.year());
            }
            if !topic.category.is_empty() {
                *acc.categories.entry(topic.category.clone()).or_insert(0) += 1;
            }
            if let Some(thread) = assignments.get(id) {
                *acc.threads.entry(thread.clone()).or_insert(0) += 1;
            }
            acc.topic_ids.push(*id);

            // Commenters accumulate posts without earning a profile
            for participant in &topic.participants {
                *post_totals.entry(participant.username.clone()).or_insert(0) +=
                    participant.post_count;
            }
        }

        let mut profiles: Vec<AuthorProfile> = creators
            .iter()
            .filter(|(_, acc)| acc.topics_created >= self.min_topics_created)
            .map(|(username, acc)| {
                let authority_score = AUTHORITY_TOPICS_WEIGHT * acc.topics_created as f64
                    + AUTHORITY_LIKES_WEIGHT * acc.total_likes as f64
                    + AUTHORITY_IN_DEGREE_WEIGHT * acc.total_in_degree as f64;

                let mut top_topics = acc.topic_ids.clone();
                top_topics.sort_by(|a, b| {
                    scores
                        .get(b)
                        .total_cmp(&scores.get(a))
                        .then_with(|| a.cmp(b))
                });
                top_topics.truncate(self.top_topics_limit);

                AuthorProfile {
                    username: username.clone(),
                    topics_created: acc.topics_created,
                    total_posts: post_totals.get(username).copied().unwrap_or(0),
                    total_likes: acc.total_likes,
                    total_in_degree: acc.total_in_degree,
                    authority_score,
                    active_years: acc.active_years.clone(),
                    category_focus: top_counts(&acc.categories, self.category_focus_limit),
                    thread_focus: top_counts(&acc.threads, self.thread_focus_limit),
                    top_topics,
                    co_researchers: Vec::new(),
                }
            })
            .collect();

        profiles.sort_by(|a, b| {
            b.authority_score
                .total_cmp(&a.authority_score)
                .then_with(|| a.username.cmp(&b.username))
        });
        profiles.truncate(self.max_profiles);

        // Co-occurrence is only computed for the published set
        for profile in &mut profiles {
            let acc = &creators[&profile.username];
            let mut shared: BTreeMap<String, u64> = BTreeMap::new();
            for id in &acc.topic_ids {
                let Some(topic) = corpus.get(id) else {
                    continue;
                };
                for participant in &topic.participants {
                    if participant.username != profile.username {
                        *shared.entry(participant.username.clone()).or_insert(0) += 1;
                    }
                }
            }
            profile.co_researchers = top_counts(&shared, self.co_researcher_limit);
        }

        debug!(profiles = profiles.len(), "author aggregation complete");
        profiles
    }
}
