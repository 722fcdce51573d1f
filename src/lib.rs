//! Skein: influence scoring and thread classification for forum corpora
//!
//! Turns a scraped research-forum corpus (topics, posts, cross-links) plus
//! auxiliary catalogs (standards proposals, protocol-upgrade timeline,
//! academic papers) into a ranked, classified knowledge graph: which
//! discussions matter, how they cluster into persistent research threads,
//! and how influence propagates across entity types that reference each
//! other only loosely.
//!
//! # Core Concepts
//!
//! - **Topics**: forum discussions connected by citation links
//! - **Proposals**: standards-catalog entries mentioned from discussions
//! - **Papers**: academic literature scored alongside the other populations
//! - **Threads**: persistent research clusters assigned by pattern matching
//!
//! # Example
//!
//! ```
//! use skein::{AnalysisConfig, Pipeline};
//!
//! let pipeline = Pipeline::new(AnalysisConfig::new()).unwrap();
//! // Pipeline is ready to run over a loaded corpus
//! ```

pub mod analysis;
pub mod corpus;

pub use analysis::{
    AnalysisConfig, AnalysisError, AnalysisReport, AuthorProfile, CitationGraph,
    CrossEntityPropagator, EntityKind, InclusionFilter, InfluenceScorer, LinkExtractor,
    MentionExtractor, Pipeline, RankedEntity, ThreadClassifier, ThreadDefinition, ThreadLibrary,
    Tier, TierConfig,
};
pub use corpus::{
    Corpus, Era, EraTimeline, Paper, PaperId, Participant, Post, PostLink, Proposal,
    ProposalCatalog, ProposalId, ProposalStatus, Topic, TopicId, Upgrade, UpgradeTimeline,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
