//! Protocol-upgrade ("fork") timeline

use super::proposal::ProposalId;
use chrono::NaiveDate;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// A scheduled or shipped protocol upgrade
#[derive(Debug, Clone)]
pub struct Upgrade {
    pub name: String,
    /// None = unscheduled
    pub date: Option<NaiveDate>,
    /// Associated standards-catalog ids, in catalog order
    pub proposals: Vec<ProposalId>,
}

impl Upgrade {
    pub fn new(name: impl Into<String>, date: Option<NaiveDate>, proposals: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            date,
            proposals: proposals.into_iter().map(ProposalId::new).collect(),
        }
    }

    /// Shipped = has a date that is on or before `today`
    pub fn is_shipped(&self, today: NaiveDate) -> bool {
        matches!(self.date, Some(d) if d <= today)
    }
}

/// Ordered upgrade timeline
#[derive(Debug, Clone, Default)]
pub struct UpgradeTimeline {
    upgrades: Vec<Upgrade>,
}

impl UpgradeTimeline {
    pub fn new(upgrades: Vec<Upgrade>) -> Self {
        Self { upgrades }
    }

    /// The Ethereum mainnet fork history this engine was first built for
    pub fn builtin() -> Self {
        Self::new(vec![
            Upgrade::new(
                "Byzantium",
                Some(ymd(2017, 10, 16)),
                vec![100, 140, 196, 197, 198, 211, 214, 649, 658],
            ),
            Upgrade::new(
                "Constantinople",
                Some(ymd(2019, 2, 28)),
                vec![145, 1014, 1052, 1234, 1283],
            ),
            Upgrade::new(
                "Istanbul",
                Some(ymd(2019, 12, 8)),
                vec![152, 1108, 1344, 1884, 2028, 2200],
            ),
            Upgrade::new("Phase 0", Some(ymd(2020, 12, 1)), vec![]),
            Upgrade::new(
                "Berlin",
                Some(ymd(2021, 4, 15)),
                vec![2565, 2929, 2718, 2930],
            ),
            Upgrade::new(
                "London",
                Some(ymd(2021, 8, 5)),
                vec![1559, 3198, 3529, 3541, 3554],
            ),
            Upgrade::new("Altair", Some(ymd(2021, 10, 27)), vec![]),
            Upgrade::new("The Merge", Some(ymd(2022, 9, 15)), vec![3675, 4399]),
            Upgrade::new(
                "Shapella",
                Some(ymd(2023, 4, 12)),
                vec![3651, 3855, 3860, 4895, 6049],
            ),
            Upgrade::new(
                "Dencun",
                Some(ymd(2024, 3, 13)),
                vec![1153, 4788, 4844, 5656, 6780, 7044, 7045, 7514, 7516],
            ),
            Upgrade::new(
                "Pectra",
                Some(ymd(2025, 5, 7)),
                vec![2537, 2935, 6110, 7002, 7251, 7549, 7623, 7685, 7691, 7702],
            ),
            Upgrade::new(
                "Fusaka",
                Some(ymd(2025, 12, 3)),
                vec![7594, 7823, 7825, 7883, 7917, 7918, 7934, 7939, 7951],
            ),
            Upgrade::new("Glamsterdam", None, vec![7732, 7928]),
        ])
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    /// Names of upgrades shipped as of `today`, in sorted order
    pub fn shipped_names(&self, today: NaiveDate) -> std::collections::BTreeSet<String> {
        self.upgrades
            .iter()
            .filter(|u| u.is_shipped(today))
            .map(|u| u.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_requires_past_date() {
        let today = ymd(2024, 1, 1);
        let shipped = Upgrade::new("A", Some(ymd(2023, 4, 12)), vec![]);
        let future = Upgrade::new("B", Some(ymd(2025, 5, 7)), vec![]);
        let unscheduled = Upgrade::new("C", None, vec![]);

        assert!(shipped.is_shipped(today));
        assert!(!future.is_shipped(today));
        assert!(!unscheduled.is_shipped(today));
    }

    #[test]
    fn test_shipped_on_the_day_counts() {
        let upgrade = Upgrade::new("A", Some(ymd(2024, 3, 13)), vec![]);
        assert!(upgrade.is_shipped(ymd(2024, 3, 13)));
    }

    #[test]
    fn test_builtin_shipped_names() {
        let timeline = UpgradeTimeline::builtin();
        let shipped = timeline.shipped_names(ymd(2022, 1, 1));
        assert!(shipped.contains("London"));
        assert!(!shipped.contains("The Merge"));
        assert!(!shipped.contains("Glamsterdam"));
    }
}
