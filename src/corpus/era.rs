//! Era assignment against a fixed ordered set of date ranges

use chrono::NaiveDate;
use serde::Serialize;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// A named date range in the corpus timeline
#[derive(Debug, Clone, Serialize)]
pub struct Era {
    pub id: String,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Era {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Ordered era definitions; the last era is the fallback bucket for
/// undated or future-dated items
#[derive(Debug, Clone, Serialize)]
pub struct EraTimeline {
    eras: Vec<Era>,
}

impl EraTimeline {
    /// Build a timeline from ordered eras; an empty list falls back to
    /// the builtin definitions
    pub fn new(eras: Vec<Era>) -> Self {
        if eras.is_empty() {
            Self::builtin()
        } else {
            Self { eras }
        }
    }

    /// The five-era timeline the engine was first built for
    pub fn builtin() -> Self {
        Self {
            eras: vec![
                Era::new("genesis", "Genesis", ymd(2017, 9, 1), ymd(2017, 12, 31)),
                Era::new(
                    "scaling_wars",
                    "Scaling Wars",
                    ymd(2018, 1, 1),
                    ymd(2018, 12, 31),
                ),
                Era::new(
                    "eth2_design",
                    "Eth2 Design",
                    ymd(2019, 1, 1),
                    ymd(2020, 12, 31),
                ),
                Era::new(
                    "post_merge_build",
                    "Post-Merge Build",
                    ymd(2021, 1, 1),
                    ymd(2022, 12, 31),
                ),
                Era::new(
                    "endgame",
                    "Endgame Architecture",
                    ymd(2023, 1, 1),
                    ymd(2026, 12, 31),
                ),
            ],
        }
    }

    pub fn eras(&self) -> &[Era] {
        &self.eras
    }

    /// Era id for a date; undated or out-of-range dates land in the last era
    pub fn era_for(&self, date: Option<NaiveDate>) -> &str {
        if let Some(d) = date {
            for era in &self.eras {
                if era.contains(d) {
                    return &era.id;
                }
            }
        }
        // Timeline is non-empty by construction
        self.eras.last().map(|e| e.id.as_str()).unwrap_or_default()
    }
}

impl Default for EraTimeline {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_for_in_range_date() {
        let timeline = EraTimeline::builtin();
        assert_eq!(timeline.era_for(Some(ymd(2018, 6, 1))), "scaling_wars");
        assert_eq!(timeline.era_for(Some(ymd(2020, 1, 15))), "eth2_design");
    }

    #[test]
    fn test_era_fallback_for_undated() {
        let timeline = EraTimeline::builtin();
        assert_eq!(timeline.era_for(None), "endgame");
    }

    #[test]
    fn test_era_fallback_for_future_date() {
        let timeline = EraTimeline::builtin();
        assert_eq!(timeline.era_for(Some(ymd(2030, 1, 1))), "endgame");
    }

    #[test]
    fn test_era_fallback_for_predating_corpus() {
        // Dates before the first era also fall through to the last bucket
        let timeline = EraTimeline::builtin();
        assert_eq!(timeline.era_for(Some(ymd(2015, 7, 30))), "endgame");
    }

    #[test]
    fn test_empty_definitions_use_builtin() {
        let timeline = EraTimeline::new(vec![]);
        assert_eq!(timeline.eras().len(), 5);
    }
}
