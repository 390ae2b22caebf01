//! Structured outcome of a deployment run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::change::{ContributionLevel, RepoTarget};

/// One commit object successfully created on the remote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub date: NaiveDate,
    pub sha: String,
    pub level: ContributionLevel,
    /// 1-based position within this date's chain.
    pub commit_index: u32,
    /// Total commits drawn for this date.
    pub commit_count: u32,
}

/// A date whose chain could not be completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateFailure {
    pub date: NaiveDate,
    pub error: String,
}

/// Outcome for one target repository.
///
/// A date whose chain failed partway contributes its landed commits to
/// `successful` and one entry to `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoDeployment {
    pub target: RepoTarget,
    pub successful: Vec<CommitRecord>,
    pub failed: Vec<DateFailure>,
    /// Last known-good head after the run; `None` if nothing was committed.
    pub head_sha: Option<String>,
    /// Whether the branch ref points at `head_sha`. When false the
    /// created commits exist but are unreferenced; recovery is to retry
    /// just the ref update, not to redo content creation.
    pub ref_updated: bool,
}

impl RepoDeployment {
    pub fn new(target: RepoTarget) -> Self {
        Self {
            target,
            successful: Vec::new(),
            failed: Vec::new(),
            head_sha: None,
            ref_updated: false,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && (self.successful.is_empty() || self.ref_updated)
    }
}

/// Aggregated outcome across every repository in a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub repos: Vec<RepoDeployment>,
}

impl DeploymentResult {
    pub fn total_commits(&self) -> usize {
        self.repos.iter().map(|r| r.successful.len()).sum()
    }

    pub fn total_failed_dates(&self) -> usize {
        self.repos.iter().map(|r| r.failed.len()).sum()
    }

    pub fn is_complete_success(&self) -> bool {
        self.repos.iter().all(RepoDeployment::is_clean)
    }

    /// One-line human summary for logs and the CLI.
    pub fn summary(&self) -> String {
        format!(
            "{} commits across {} repositories, {} failed dates",
            self.total_commits(),
            self.repos.len(),
            self.total_failed_dates()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sha: &str) -> CommitRecord {
        CommitRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            sha: sha.into(),
            level: ContributionLevel::Low,
            commit_index: 1,
            commit_count: 1,
        }
    }

    #[test]
    fn test_clean_deployment() {
        let mut repo = RepoDeployment::new(RepoTarget::new("o", "r"));
        repo.successful.push(record("abc"));
        repo.ref_updated = true;

        let result = DeploymentResult { repos: vec![repo] };
        assert!(result.is_complete_success());
        assert_eq!(result.total_commits(), 1);
    }

    #[test]
    fn test_unreferenced_commits_are_not_clean() {
        let mut repo = RepoDeployment::new(RepoTarget::new("o", "r"));
        repo.successful.push(record("abc"));
        repo.ref_updated = false;

        let result = DeploymentResult { repos: vec![repo] };
        assert!(!result.is_complete_success());
    }

    #[test]
    fn test_empty_repo_deployment_is_clean() {
        let repo = RepoDeployment::new(RepoTarget::new("o", "r"));
        assert!(repo.is_clean());
    }
}
