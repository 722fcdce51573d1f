//! Topic representation in the discussion corpus

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a topic
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TopicId(u64);

impl TopicId {
    /// Create a TopicId from a raw forum id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TopicId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A link annotation attached to a post by the upstream scraper
///
/// `internal` marks links that stay within the forum; `reflection` marks
/// the reverse perspective (some other topic linking back at this one).
#[derive(Debug, Clone, Default)]
pub struct PostLink {
    pub url: String,
    pub internal: bool,
    pub reflection: bool,
}

/// A single post within a topic
#[derive(Debug, Clone, Default)]
pub struct Post {
    /// 1-based position in the topic; 1 is the opening post
    pub post_number: u32,
    pub username: String,
    /// Rendered HTML-ish body
    pub cooked: String,
    pub links: Vec<PostLink>,
}

/// A participant on a topic, creator or commenter
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub username: String,
    pub post_count: u64,
}

/// A discussion topic with raw metadata and posts
///
/// Holds only source data; derived quantities (degrees, scores, tier,
/// thread, era) live in the analysis outputs and are recomputed from
/// scratch on every run.
#[derive(Debug, Clone)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    /// Username of the creating author
    pub author: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub tags: Vec<String>,
    pub views: u64,
    pub likes: u64,
    pub posts_count: u64,
    pub participants: Vec<Participant>,
    /// Cleaned free-text excerpt of the opening post
    pub excerpt: String,
    pub posts: Vec<Post>,
}

impl Topic {
    /// Create a topic with the given identity; everything else defaults
    pub fn new(id: impl Into<TopicId>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            date: None,
            category: String::new(),
            tags: Vec::new(),
            views: 0,
            likes: 0,
            posts_count: 1,
            participants: Vec::new(),
            excerpt: String::new(),
            posts: Vec::new(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_engagement(mut self, views: u64, likes: u64, posts_count: u64) -> Self {
        self.views = views;
        self.likes = likes;
        self.posts_count = posts_count;
        self
    }

    pub fn with_participants(mut self, participants: Vec<Participant>) -> Self {
        self.participants = participants;
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    pub fn with_posts(mut self, posts: Vec<Post>) -> Self {
        self.posts = posts;
        self
    }

    /// The opening post, if present
    pub fn opening_post(&self) -> Option<&Post> {
        self.posts.iter().find(|p| p.post_number == 1)
    }
}

/// The loaded topic corpus
///
/// Keyed by topic id; iteration order is the id order, which keeps every
/// downstream computation deterministic.
#[derive(Debug, Default)]
pub struct Corpus {
    topics: BTreeMap<TopicId, Topic>,
    skipped: usize,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a topic, replacing any previous record with the same id
    pub fn insert(&mut self, topic: Topic) {
        self.topics.insert(topic.id, topic);
    }

    /// Record a source record that failed to load
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn get(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.get(id)
    }

    pub fn contains(&self, id: &TopicId) -> bool {
        self.topics.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Number of source records skipped during loading
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Topics in ascending id order
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    /// Topic ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = TopicId> + '_ {
        self.topics.keys().copied()
    }
}
