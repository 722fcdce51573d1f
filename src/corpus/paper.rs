//! Academic papers scored alongside the discussion corpus

use serde::{Deserialize, Serialize};

/// Content-derived identifier for a paper (DOI, arXiv id, or similar)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaperId(String);

impl PaperId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PaperId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PaperId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog paper with precomputed relevance
///
/// The relevance score is produced by an external collaborator; this crate
/// only consumes it.
#[derive(Debug, Clone)]
pub struct Paper {
    pub id: PaperId,
    pub title: String,
    pub year: Option<i32>,
    pub authors: Vec<String>,
    pub cited_by: u64,
    pub relevance: f64,
}

impl Paper {
    pub fn new(id: impl Into<PaperId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: None,
            authors: Vec::new(),
            cited_by: 0,
            relevance: 0.0,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_citations(mut self, cited_by: u64) -> Self {
        self.cited_by = cited_by;
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance;
        self
    }
}
