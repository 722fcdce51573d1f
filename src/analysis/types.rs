//! Configuration and error types for the analysis pipeline

use super::tiering::TierConfig;
use chrono::{Datelike, NaiveDate, Utc};
use thiserror::Error;

/// Errors that can occur while loading inputs or building the pipeline
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Immutable pipeline configuration, constructed once at process start
/// and passed explicitly into each component
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Forum host whose topic URLs count as citations
    pub forum_host: String,
    /// Minimum match score for a thread assignment
    pub thread_min_score: f64,
    /// Analysis-time "today", used for shipped-upgrade checks
    pub today: NaiveDate,
    /// Anchor year for paper recency damping
    pub anchor_year: i32,
    /// Tiered inclusion thresholds
    pub tier: TierConfig,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        let today = Utc::now().date_naive();
        Self {
            forum_host: "ethresear.ch".to_string(),
            thread_min_score: 1.5,
            today,
            anchor_year: today.year(),
            tier: TierConfig::default(),
        }
    }

    /// Pin the analysis date (and anchor year) for reproducible runs
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self.anchor_year = today.year();
        self
    }

    pub fn with_forum_host(mut self, host: impl Into<String>) -> Self {
        self.forum_host = host.into();
        self
    }

    pub fn with_tier(mut self, tier: TierConfig) -> Self {
        self.tier = tier;
        self
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new()
    }
}
