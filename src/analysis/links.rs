//! Citation-link and proposal-mention extraction
//!
//! Builds the directed cross-reference graph out of the scraper's link
//! annotations, and pulls standards-catalog mentions out of titles and
//! post bodies. Malformed or unresolvable links are silently dropped;
//! they are not citations, not errors.

use super::types::AnalysisError;
use crate::corpus::{Corpus, ProposalId, Topic, TopicId};
use regex_lite::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Outgoing and incoming citation sets for one topic
///
/// `outgoing` are targets this topic's posts link to; `incoming` are
/// reflection links, posts elsewhere pointing back here, tagged as such
/// by the upstream scraper. Self-references are removed from both.
#[derive(Debug, Clone, Default)]
pub struct LinkSets {
    pub outgoing: BTreeSet<TopicId>,
    pub incoming: BTreeSet<TopicId>,
}

/// Extracts topic citations from post link annotations
pub struct LinkExtractor {
    topic_url: Regex,
}

impl LinkExtractor {
    /// Build an extractor for an explicit URL pattern; the first capture
    /// group must be the topic id
    pub fn new(pattern: &str) -> Result<Self, AnalysisError> {
        let topic_url = Regex::new(pattern).map_err(|e| AnalysisError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { topic_url })
    }

    /// Build an extractor for the standard Discourse topic URL shape on
    /// the given host: `https://<host>/t/<slug>/<id>`
    pub fn for_host(host: &str) -> Result<Self, AnalysisError> {
        let escaped = host.replace('.', "\\.");
        Self::new(&format!(r"https?://{escaped}/t/[^/]+/([0-9]+)"))
    }

    fn topic_id(&self, url: &str) -> Option<TopicId> {
        let caps = self.topic_url.captures(url)?;
        caps.get(1)?.as_str().parse::<u64>().ok().map(TopicId::new)
    }

    /// Extract this topic's citation sets from its posts
    pub fn extract(&self, topic: &Topic) -> LinkSets {
        let mut sets = LinkSets::default();
        for post in &topic.posts {
            for link in &post.links {
                if !link.internal {
                    continue;
                }
                let Some(target) = self.topic_id(&link.url) else {
                    continue;
                };
                if link.reflection {
                    sets.incoming.insert(target);
                } else {
                    sets.outgoing.insert(target);
                }
            }
        }
        sets.outgoing.remove(&topic.id);
        sets.incoming.remove(&topic.id);
        sets
    }
}

/// Proposal mentions for one topic
///
/// `primary` is what the topic is actually about: a title occurrence, or
/// at least three occurrences in the opening post. Passing references in
/// replies stay in `all` only.
#[derive(Debug, Clone, Default)]
pub struct Mentions {
    pub all: BTreeSet<ProposalId>,
    pub primary: BTreeSet<ProposalId>,
}

/// Minimum opening-post occurrences for a mention to count as primary
const PRIMARY_OP_MENTIONS: u32 = 3;

/// Extracts standards-catalog mentions from topic text
pub struct MentionExtractor {
    mention: Regex,
}

impl MentionExtractor {
    pub fn new() -> Result<Self, AnalysisError> {
        let pattern = r"(?i)EIP[- ]?([0-9]{1,5})";
        let mention = Regex::new(pattern).map_err(|e| AnalysisError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { mention })
    }

    fn ids_in<'a>(&'a self, text: &'a str) -> impl Iterator<Item = ProposalId> + 'a {
        self.mention
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| m.as_str().parse::<u32>().ok())
            .map(ProposalId::new)
    }

    /// Extract all and primary mentions for a topic
    pub fn extract(&self, topic: &Topic) -> Mentions {
        let mut mentions = Mentions::default();

        for id in self.ids_in(&topic.title) {
            mentions.all.insert(id);
            mentions.primary.insert(id);
        }

        for post in &topic.posts {
            if post.post_number == 1 {
                let mut op_counts: BTreeMap<ProposalId, u32> = BTreeMap::new();
                for id in self.ids_in(&post.cooked) {
                    mentions.all.insert(id);
                    *op_counts.entry(id).or_insert(0) += 1;
                }
                for (id, count) in op_counts {
                    if count >= PRIMARY_OP_MENTIONS {
                        mentions.primary.insert(id);
                    }
                }
            } else {
                for id in self.ids_in(&post.cooked) {
                    mentions.all.insert(id);
                }
            }
        }

        mentions
    }
}

/// The directed cross-reference graph over the corpus
///
/// Edges are built once from resolved outgoing links and immutable after
/// construction; duplicates across posts collapse into set membership.
#[derive(Debug, Default)]
pub struct CitationGraph {
    /// Raw per-topic citation sets (may reference unknown topics)
    links: BTreeMap<TopicId, LinkSets>,
    /// Resolved edges (source, target), both endpoints in the corpus
    edges: Vec<(TopicId, TopicId)>,
    in_degree: BTreeMap<TopicId, u64>,
    out_degree: BTreeMap<TopicId, u64>,
    /// Resolved incoming references: reverse edges plus resolved
    /// reflection sources
    incoming: BTreeMap<TopicId, BTreeSet<TopicId>>,
}

impl CitationGraph {
    /// Build the graph from the full corpus
    pub fn build(corpus: &Corpus, extractor: &LinkExtractor) -> Self {
        let mut graph = Self::default();

        for topic in corpus.topics() {
            graph.links.insert(topic.id, extractor.extract(topic));
        }

        for (&src, sets) in &graph.links {
            for &tgt in &sets.outgoing {
                if corpus.contains(&tgt) {
                    graph.edges.push((src, tgt));
                    *graph.out_degree.entry(src).or_insert(0) += 1;
                    *graph.in_degree.entry(tgt).or_insert(0) += 1;
                    graph.incoming.entry(tgt).or_default().insert(src);
                }
            }
            for &reflected in &sets.incoming {
                if corpus.contains(&reflected) {
                    graph.incoming.entry(src).or_default().insert(reflected);
                }
            }
        }

        graph
    }

    pub fn in_degree_of(&self, id: &TopicId) -> u64 {
        self.in_degree.get(id).copied().unwrap_or(0)
    }

    pub fn out_degree_of(&self, id: &TopicId) -> u64 {
        self.out_degree.get(id).copied().unwrap_or(0)
    }

    /// Raw outgoing citation set for a topic (targets may be unresolved)
    pub fn outgoing(&self, id: &TopicId) -> Option<&BTreeSet<TopicId>> {
        self.links.get(id).map(|s| &s.outgoing)
    }

    /// Resolved incoming reference set for a topic
    pub fn incoming(&self, id: &TopicId) -> Option<&BTreeSet<TopicId>> {
        self.incoming.get(id)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Post, PostLink, Topic};

    fn post_with_links(links: Vec<(&str, bool, bool)>) -> Post {
        Post {
            post_number: 1,
            username: "a".into(),
            cooked: String::new(),
            links: links
                .into_iter()
                .map(|(url, internal, reflection)| PostLink {
                    url: url.into(),
                    internal,
                    reflection,
                })
                .collect(),
        }
    }

    #[test]
    fn test_extract_outgoing_and_incoming() {
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let topic = Topic::new(1u64, "t", "a").with_posts(vec![post_with_links(vec![
            ("https://ethresear.ch/t/some-slug/2", true, false),
            ("https://ethresear.ch/t/other/3", true, true),
            ("https://example.com/t/external/4", true, false),
            ("https://ethresear.ch/about", true, false),
        ])]);

        let sets = extractor.extract(&topic);
        assert_eq!(sets.outgoing, BTreeSet::from([TopicId::new(2)]));
        assert_eq!(sets.incoming, BTreeSet::from([TopicId::new(3)]));
    }

    #[test]
    fn test_extract_removes_self_links() {
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let topic = Topic::new(5u64, "t", "a").with_posts(vec![post_with_links(vec![
            ("https://ethresear.ch/t/self/5", true, false),
            ("https://ethresear.ch/t/self/5", true, true),
        ])]);

        let sets = extractor.extract(&topic);
        assert!(sets.outgoing.is_empty());
        assert!(sets.incoming.is_empty());
    }

    #[test]
    fn test_extract_ignores_external_links() {
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let topic = Topic::new(1u64, "t", "a").with_posts(vec![post_with_links(vec![(
            "https://ethresear.ch/t/x/9",
            false,
            false,
        )])]);
        assert!(extractor.extract(&topic).outgoing.is_empty());
    }

    #[test]
    fn test_graph_drops_unresolvable_targets() {
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let mut corpus = Corpus::new();
        corpus.insert(
            Topic::new(1u64, "t", "a").with_posts(vec![post_with_links(vec![
                ("https://ethresear.ch/t/known/2", true, false),
                ("https://ethresear.ch/t/unknown/999", true, false),
            ])]),
        );
        corpus.insert(Topic::new(2u64, "u", "b"));

        let graph = CitationGraph::build(&corpus, &extractor);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.in_degree_of(&TopicId::new(2)), 1);
        assert_eq!(graph.out_degree_of(&TopicId::new(1)), 1);
        assert_eq!(graph.in_degree_of(&TopicId::new(999)), 0);
    }

    #[test]
    fn test_graph_incoming_includes_reflections() {
        let extractor = LinkExtractor::for_host("ethresear.ch").unwrap();
        let mut corpus = Corpus::new();
        // Topic 1 carries a reflection annotation pointing at topic 2
        corpus.insert(
            Topic::new(1u64, "t", "a").with_posts(vec![post_with_links(vec![(
                "https://ethresear.ch/t/back/2",
                true,
                true,
            )])]),
        );
        corpus.insert(Topic::new(2u64, "u", "b"));

        let graph = CitationGraph::build(&corpus, &extractor);
        let incoming = graph.incoming(&TopicId::new(1)).unwrap();
        assert!(incoming.contains(&TopicId::new(2)));
        // Reflections do not count toward in-degree
        assert_eq!(graph.in_degree_of(&TopicId::new(1)), 0);
    }

    #[test]
    fn test_mention_extraction_primary_rules() {
        let extractor = MentionExtractor::new().unwrap();
        let topic = Topic::new(1u64, "Thoughts on EIP-1559", "a").with_posts(vec![
            Post {
                post_number: 1,
                username: "a".into(),
                cooked: "EIP-4844 is great. eip 4844 again. EIP4844 thrice. EIP-2929 once."
                    .into(),
                links: vec![],
            },
            Post {
                post_number: 2,
                username: "b".into(),
                cooked: "see also EIP-7702".into(),
                links: vec![],
            },
        ]);

        let mentions = extractor.extract(&topic);
        let all: Vec<u32> = mentions.all.iter().map(|id| id.value()).collect();
        assert_eq!(all, vec![1559, 2929, 4844, 7702]);

        // Title mention and the thrice-repeated OP mention are primary;
        // the single OP mention and the reply mention are not
        let primary: Vec<u32> = mentions.primary.iter().map(|id| id.value()).collect();
        assert_eq!(primary, vec![1559, 4844]);
    }

    #[test]
    fn test_mention_extraction_duplicates_collapse() {
        let extractor = MentionExtractor::new().unwrap();
        let topic = Topic::new(1u64, "EIP-100 and EIP-100", "a");
        assert_eq!(extractor.extract(&topic).all.len(), 1);
    }
}
