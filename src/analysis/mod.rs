//! Analysis pipeline: graph construction, scoring, tiering,
//! classification, aggregation, and cross-entity propagation

mod authors;
mod links;
mod normalize;
mod pipeline;
mod propagate;
mod report;
mod scoring;
mod threads;
mod tiering;
mod types;

pub use authors::{AuthorAggregator, AuthorProfile};
pub use links::{CitationGraph, LinkExtractor, LinkSets, MentionExtractor, Mentions};
pub use normalize::{clamp01, min_max, percentile_ranks};
pub use pipeline::Pipeline;
pub use propagate::{
    BoostWeights, CrossEntityPropagator, EntityKind, PropagationOutput, RankedEntity,
};
pub use report::{AnalysisReport, PaperRow, ProposalRow, ReportMetadata, TopicRow};
pub use scoring::{FirstPassWeights, InfluenceScorer, TopicScores};
pub use threads::{
    ThreadClassifier, ThreadDefinition, ThreadLibrary, ThreadMilestone, ThreadSummary,
};
pub use tiering::{Inclusion, InclusionFilter, Tier, TierConfig};
pub use types::{AnalysisConfig, AnalysisError, AnalysisResult};
