//! Standards-catalog entries ("proposals") referenced from discussions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric identifier of a standards-catalog entry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProposalId(u32);

impl ProposalId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ProposalId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a proposal
///
/// Loaded once from the static catalog; never changes during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Draft,
    Review,
    LastCall,
    Final,
    Living,
    Stagnant,
    Withdrawn,
    Moved,
    /// Catalog carried a status string we do not recognize
    Unknown,
}

impl ProposalStatus {
    /// Parse the catalog's status string; unrecognized values map to Unknown
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Draft" => Self::Draft,
            "Review" => Self::Review,
            "Last Call" => Self::LastCall,
            "Final" => Self::Final,
            "Living" => Self::Living,
            "Stagnant" => Self::Stagnant,
            "Withdrawn" => Self::Withdrawn,
            "Moved" => Self::Moved,
            _ => Self::Unknown,
        }
    }

    /// Fixed ordinal weight used by the influence scorer
    pub fn weight(&self) -> f64 {
        match self {
            Self::Final => 1.0,
            Self::Living => 0.85,
            Self::LastCall => 0.65,
            Self::Review => 0.5,
            Self::Draft => 0.3,
            Self::Stagnant => 0.1,
            Self::Withdrawn => 0.05,
            Self::Moved => 0.02,
            Self::Unknown => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Review => "Review",
            Self::LastCall => "Last Call",
            Self::Final => "Final",
            Self::Living => "Living",
            Self::Stagnant => "Stagnant",
            Self::Withdrawn => "Withdrawn",
            Self::Moved => "Moved",
            Self::Unknown => "Unknown",
        }
    }
}

/// A standards-catalog entry
#[derive(Debug, Clone)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub status: ProposalStatus,
    /// Name of the assigned protocol upgrade, if any
    pub fork: Option<String>,
    /// Prerequisite proposal ids
    pub requires: Vec<ProposalId>,
    /// Engagement counters from the secondary discussion venue
    pub venue_likes: u64,
    pub venue_views: u64,
    pub venue_posts: u64,
    pub authors: Vec<String>,
}

impl Proposal {
    pub fn new(id: impl Into<ProposalId>, title: impl Into<String>, status: ProposalStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status,
            fork: None,
            requires: Vec::new(),
            venue_likes: 0,
            venue_views: 0,
            venue_posts: 0,
            authors: Vec::new(),
        }
    }

    pub fn with_fork(mut self, fork: impl Into<String>) -> Self {
        self.fork = Some(fork.into());
        self
    }

    pub fn with_requires(mut self, requires: Vec<ProposalId>) -> Self {
        self.requires = requires;
        self
    }

    pub fn with_venue_engagement(mut self, likes: u64, views: u64, posts: u64) -> Self {
        self.venue_likes = likes;
        self.venue_views = views;
        self.venue_posts = posts;
        self
    }
}

/// The static standards catalog, keyed by proposal id
#[derive(Debug, Default)]
pub struct ProposalCatalog {
    entries: BTreeMap<ProposalId, Proposal>,
}

impl ProposalCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, proposal: Proposal) {
        self.entries.insert(proposal.id, proposal);
    }

    pub fn get(&self, id: &ProposalId) -> Option<&Proposal> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order
    pub fn entries(&self) -> impl Iterator<Item = &Proposal> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ProposalId> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(ProposalStatus::parse("Final"), ProposalStatus::Final);
        assert_eq!(ProposalStatus::parse("Last Call"), ProposalStatus::LastCall);
        assert_eq!(ProposalStatus::parse("nonsense"), ProposalStatus::Unknown);
    }

    #[test]
    fn test_status_weights() {
        assert_eq!(ProposalStatus::Final.weight(), 1.0);
        assert_eq!(ProposalStatus::Living.weight(), 0.85);
        assert_eq!(ProposalStatus::LastCall.weight(), 0.65);
        assert_eq!(ProposalStatus::Review.weight(), 0.5);
        assert_eq!(ProposalStatus::Draft.weight(), 0.3);
        assert_eq!(ProposalStatus::Stagnant.weight(), 0.1);
        assert_eq!(ProposalStatus::Withdrawn.weight(), 0.05);
        assert_eq!(ProposalStatus::Moved.weight(), 0.02);
        assert_eq!(ProposalStatus::Unknown.weight(), 0.0);
    }

    #[test]
    fn test_catalog_ordering() {
        let mut catalog = ProposalCatalog::new();
        catalog.insert(Proposal::new(4844u32, "Shard blobs", ProposalStatus::Final));
        catalog.insert(Proposal::new(1559u32, "Fee market", ProposalStatus::Final));

        let ids: Vec<u32> = catalog.ids().map(|id| id.value()).collect();
        assert_eq!(ids, vec![1559, 4844]);
    }
}
