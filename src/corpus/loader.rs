//! JSON input records and file loading
//!
//! Source records mirror what the upstream scraper emits. Missing or
//! unparseable per-topic records are counted and skipped, never fatal;
//! absent engagement fields default to zero.

use super::paper::{Paper, PaperId};
use super::proposal::{Proposal, ProposalCatalog, ProposalId, ProposalStatus};
use super::topic::{Corpus, Participant, Post, PostLink, Topic};
use super::upgrade::{Upgrade, UpgradeTimeline};
use crate::analysis::AnalysisError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Maximum excerpt length in characters
const EXCERPT_MAX_CHARS: usize = 600;

/// A scraper link annotation on a post
#[derive(Debug, Clone, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub reflection: bool,
}

/// A raw post body with link annotations
#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub post_number: u32,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub cooked: String,
    #[serde(default)]
    pub link_counts: Vec<LinkRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantRecord {
    pub username: String,
    #[serde(default)]
    pub post_count: u64,
}

fn default_posts_count() -> u64 {
    1
}

/// A per-topic source record
#[derive(Debug, Clone, Deserialize)]
pub struct TopicRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default = "default_posts_count")]
    pub posts_count: u64,
    #[serde(default)]
    pub participants: Vec<ParticipantRecord>,
    #[serde(default)]
    pub posts: Vec<PostRecord>,
}

impl TopicRecord {
    /// Convert a source record into the domain model
    pub fn into_topic(self) -> Topic {
        let date = self.created_at.as_deref().and_then(parse_date);
        let posts = self
            .posts
            .into_iter()
            .map(|p| Post {
                post_number: p.post_number,
                username: p.username,
                cooked: p.cooked,
                links: p
                    .link_counts
                    .into_iter()
                    .map(|l| PostLink {
                        url: l.url,
                        internal: l.internal,
                        reflection: l.reflection,
                    })
                    .collect(),
            })
            .collect();

        let mut topic = Topic {
            id: self.id.into(),
            title: self.title,
            author: self.author,
            date,
            category: self.category,
            tags: self.tags,
            views: self.views,
            likes: self.like_count,
            posts_count: self.posts_count,
            participants: self
                .participants
                .into_iter()
                .map(|p| Participant {
                    username: p.username,
                    post_count: p.post_count,
                })
                .collect(),
            excerpt: String::new(),
            posts,
        };
        let excerpt = topic
            .opening_post()
            .map(|p| clean_excerpt(&p.cooked))
            .unwrap_or_default();
        topic.excerpt = excerpt;
        topic
    }
}

/// A standards-catalog source record
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fork: Option<String>,
    #[serde(default)]
    pub requires: Vec<u32>,
    #[serde(default)]
    pub venue_likes: u64,
    #[serde(default)]
    pub venue_views: u64,
    #[serde(default)]
    pub venue_posts: u64,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// An upgrade-timeline source record
#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeRecord {
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub proposals: Vec<u32>,
}

/// A paper-catalog source record
#[derive(Debug, Clone, Deserialize)]
pub struct PaperRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub cited_by_count: u64,
    #[serde(default)]
    pub relevance_score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PapersPayload {
    Wrapped { papers: Vec<PaperRecord> },
    Bare(Vec<PaperRecord>),
}

/// Parse an ISO-ish timestamp down to a date (YYYY, YYYY-MM, or longer)
///
/// Prefix slicing goes through `str::get` so a multibyte character near
/// the cut point yields `None` instead of panicking on untrusted input.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(prefix) = s.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(d);
        }
    }
    if let Some(prefix) = s.get(..7) {
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{prefix}-01"), "%Y-%m-%d") {
            return Some(d);
        }
    }
    if let Some(prefix) = s.get(..4) {
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{prefix}-01-01"), "%Y-%m-%d") {
            return Some(d);
        }
    }
    None
}

/// Strip tags from an HTML-ish body and truncate at a word boundary
fn clean_excerpt(cooked: &str) -> String {
    let mut text = String::with_capacity(cooked.len());
    let mut in_tag = false;
    for c in cooked.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    // Truncation counts characters, not bytes; the cut point must land on
    // a char boundary or non-ASCII bodies panic the slice
    let Some((limit, _)) = collapsed.char_indices().nth(EXCERPT_MAX_CHARS) else {
        return collapsed;
    };
    let cut = collapsed[..limit].rfind(' ').unwrap_or(limit);
    let mut out = collapsed[..cut]
        .trim_end_matches(['.', ',', ';', ':', '!', '?', ' '])
        .to_string();
    out.push_str("...");
    out
}

/// Load all `*.json` topic records from a directory
///
/// Records that fail to read or parse are counted on the corpus and skipped.
pub fn load_corpus_dir(dir: &Path) -> Result<Corpus, AnalysisError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut corpus = Corpus::new();
    for path in paths {
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable topic record");
                corpus.record_skip();
                continue;
            }
        };
        match serde_json::from_str::<TopicRecord>(&text) {
            Ok(record) => corpus.insert(record.into_topic()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unparseable topic record");
                corpus.record_skip();
            }
        }
    }
    debug!(
        loaded = corpus.len(),
        skipped = corpus.skipped(),
        "corpus loaded"
    );
    Ok(corpus)
}

/// Load the standards catalog: a JSON map of id string -> entry
///
/// Entries under non-numeric keys are skipped.
pub fn load_proposals(path: &Path) -> Result<ProposalCatalog, AnalysisError> {
    let text = fs::read_to_string(path)?;
    let records: BTreeMap<String, ProposalRecord> = serde_json::from_str(&text)?;

    let mut catalog = ProposalCatalog::new();
    for (key, record) in records {
        let Ok(num) = key.parse::<u32>() else {
            warn!(key = %key, "skipping proposal with non-numeric id");
            continue;
        };
        catalog.insert(Proposal {
            id: ProposalId::new(num),
            title: record.title,
            status: ProposalStatus::parse(&record.status),
            fork: record.fork,
            requires: record.requires.into_iter().map(ProposalId::new).collect(),
            venue_likes: record.venue_likes,
            venue_views: record.venue_views,
            venue_posts: record.venue_posts,
            authors: record.authors,
        });
    }
    debug!(entries = catalog.len(), "proposal catalog loaded");
    Ok(catalog)
}

/// Load the upgrade timeline: a JSON array of upgrade records
pub fn load_upgrades(path: &Path) -> Result<UpgradeTimeline, AnalysisError> {
    let text = fs::read_to_string(path)?;
    let records: Vec<UpgradeRecord> = serde_json::from_str(&text)?;
    let upgrades = records
        .into_iter()
        .map(|r| Upgrade::new(r.name, r.date.as_deref().and_then(parse_date), r.proposals))
        .collect();
    Ok(UpgradeTimeline::new(upgrades))
}

/// Load the paper catalog: either a bare array or `{"papers": [...]}`
///
/// Papers without an id or title are skipped.
pub fn load_papers(path: &Path) -> Result<Vec<Paper>, AnalysisError> {
    let text = fs::read_to_string(path)?;
    let payload: PapersPayload = serde_json::from_str(&text)?;
    let records = match payload {
        PapersPayload::Wrapped { papers } => papers,
        PapersPayload::Bare(papers) => papers,
    };
    let papers: Vec<Paper> = records
        .into_iter()
        .filter(|r| !r.id.trim().is_empty() && !r.title.trim().is_empty())
        .map(|r| Paper {
            id: PaperId::new(r.id.trim()),
            title: r.title,
            year: r.year,
            authors: r.authors,
            cited_by: r.cited_by_count,
            relevance: r.relevance_score,
        })
        .collect();
    debug!(papers = papers.len(), "paper catalog loaded");
    Ok(papers)
}
