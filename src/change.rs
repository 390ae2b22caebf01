//! Pending changes: user-authored date/intensity selections awaiting deployment.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{HistofyError, Result};

/// Intensity bucket a calendar date is painted with (0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContributionLevel {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ContributionLevel {
    /// Numeric level 0-4.
    pub fn level(self) -> u8 {
        match self {
            ContributionLevel::None => 0,
            ContributionLevel::Low => 1,
            ContributionLevel::Medium => 2,
            ContributionLevel::High => 3,
            ContributionLevel::VeryHigh => 4,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(ContributionLevel::None),
            1 => Some(ContributionLevel::Low),
            2 => Some(ContributionLevel::Medium),
            3 => Some(ContributionLevel::High),
            4 => Some(ContributionLevel::VeryHigh),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContributionLevel::None => "None",
            ContributionLevel::Low => "Low",
            ContributionLevel::Medium => "Medium",
            ContributionLevel::High => "High",
            ContributionLevel::VeryHigh => "Very High",
        }
    }

    /// Display-only range string shown in UIs. Not authoritative; the real
    /// mapping is [`draw_commit_count`](Self::draw_commit_count).
    pub fn commit_range_label(self) -> &'static str {
        match self {
            ContributionLevel::None => "0",
            ContributionLevel::Low => "1-3",
            ContributionLevel::Medium => "10-14",
            ContributionLevel::High => "20-24",
            ContributionLevel::VeryHigh => "25-32",
        }
    }

    /// Number of real commits to synthesize for a date at this level.
    ///
    /// The ranges are calibrated against GitHub's rendered intensity
    /// thresholds, which do not align with naive quartiles. The gaps
    /// (4-9 and 15-19 are never drawn) are intentional and load-bearing.
    pub fn draw_commit_count<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        match self {
            ContributionLevel::None => 0,
            ContributionLevel::Low => rng.gen_range(1..=3),
            ContributionLevel::Medium => rng.gen_range(10..=14),
            ContributionLevel::High => rng.gen_range(20..=24),
            ContributionLevel::VeryHigh => rng.gen_range(25..=32),
        }
    }
}

impl fmt::Display for ContributionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Target repository for a set of painted dates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoTarget {
    pub owner: String,
    pub name: String,
}

impl RepoTarget {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` override string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name))
            }
            _ => Err(HistofyError::InvalidTarget(s.to_string())),
        }
    }

    /// Grouping key used when partitioning the pending queue.
    pub fn repo_key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What kind of edit a pending change carries.
///
/// Only `DateSelection` is consumed by the deployer; other kinds are
/// data-only and pass through the store untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    DateSelection {
        /// Painted dates with their intensity. Keys are unique by construction.
        dates: BTreeMap<NaiveDate, ContributionLevel>,
        /// Explicit destination; `None` means infer from configuration/identity.
        target: Option<RepoTarget>,
    },
    /// Free-form annotation attached by the UI; never deployed.
    Note { text: String },
}

/// A user-authored edit persisted until a deployment consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: String,
    #[serde(flatten)]
    pub kind: ChangeKind,
    pub created_at: DateTime<Utc>,
}

impl PendingChange {
    /// Create a date-selection change with a fresh id.
    pub fn date_selection(
        dates: BTreeMap<NaiveDate, ContributionLevel>,
        target: Option<RepoTarget>,
    ) -> Self {
        Self {
            id: generate_change_id(),
            kind: ChangeKind::DateSelection { dates, target },
            created_at: Utc::now(),
        }
    }

    /// Painted dates, if this change is deployable.
    pub fn dates(&self) -> Option<&BTreeMap<NaiveDate, ContributionLevel>> {
        match &self.kind {
            ChangeKind::DateSelection { dates, .. } => Some(dates),
            ChangeKind::Note { .. } => None,
        }
    }
}

/// Unique change id: millisecond timestamp plus a random suffix.
fn generate_change_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let token: u32 = rand::thread_rng().r#gen();
    format!("chg-{millis:x}-{token:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_roundtrip() {
        for level in 0..=4 {
            let parsed = ContributionLevel::from_level(level).unwrap();
            assert_eq!(parsed.level(), level);
        }
        assert!(ContributionLevel::from_level(5).is_none());
    }

    #[test]
    fn test_draw_commit_count_ranges() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            assert_eq!(ContributionLevel::None.draw_commit_count(&mut rng), 0);
            assert!((1..=3).contains(&ContributionLevel::Low.draw_commit_count(&mut rng)));
            assert!((10..=14).contains(&ContributionLevel::Medium.draw_commit_count(&mut rng)));
            assert!((20..=24).contains(&ContributionLevel::High.draw_commit_count(&mut rng)));
            assert!((25..=32).contains(&ContributionLevel::VeryHigh.draw_commit_count(&mut rng)));
        }
    }

    #[test]
    fn test_draw_never_lands_in_gaps() {
        // 4-9 and 15-19 must never be drawn at any level.
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            for level in 0..=4 {
                let n = ContributionLevel::from_level(level)
                    .unwrap()
                    .draw_commit_count(&mut rng);
                assert!(!(4..=9).contains(&n), "level {level} drew {n}");
                assert!(!(15..=19).contains(&n), "level {level} drew {n}");
            }
        }
    }

    #[test]
    fn test_repo_target_parse() {
        let target = RepoTarget::parse("octocat/hello-world").unwrap();
        assert_eq!(target.owner, "octocat");
        assert_eq!(target.name, "hello-world");
        assert_eq!(target.repo_key(), "octocat/hello-world");

        assert!(RepoTarget::parse("no-slash").is_err());
        assert!(RepoTarget::parse("/empty-owner").is_err());
        assert!(RepoTarget::parse("empty-name/").is_err());
    }

    #[test]
    fn test_pending_change_serde_tagging() {
        let mut dates = BTreeMap::new();
        dates.insert(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ContributionLevel::Medium,
        );
        let change = PendingChange::date_selection(dates, None);

        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("\"type\":\"date_selection\""));

        let back: PendingChange = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, change.id);
        assert!(back.dates().is_some());
    }

    #[test]
    fn test_change_ids_unique() {
        let a = generate_change_id();
        let b = generate_change_id();
        assert_ne!(a, b);
    }
}
