//! Immutable corpus data model and input loading

mod era;
mod loader;
mod paper;
mod proposal;
mod topic;
mod upgrade;

pub use era::{Era, EraTimeline};
pub use loader::{
    load_corpus_dir, load_papers, load_proposals, load_upgrades, LinkRecord, PaperRecord,
    ParticipantRecord, PostRecord, ProposalRecord, TopicRecord, UpgradeRecord,
};
pub use paper::{Paper, PaperId};
pub use proposal::{Proposal, ProposalCatalog, ProposalId, ProposalStatus};
pub use topic::{Corpus, Participant, Post, PostLink, Topic, TopicId};
pub use upgrade::{Upgrade, UpgradeTimeline};
