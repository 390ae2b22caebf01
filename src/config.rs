//! Deployment configuration and tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::change::RepoTarget;
use crate::error::Result;

/// Tunables for a deployment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Destination repository override. When set it wins over any target
    /// embedded in a pending change; when `None`, changes without their
    /// own target fall back to `histofy-contributions` under the
    /// authenticated identity.
    pub target: Option<RepoTarget>,

    /// Branch that receives commits. Must match the repository's actual
    /// default branch for contributions to be credited.
    pub branch: String,

    /// Create the fallback repository as private.
    pub private_repo: bool,

    /// Description applied when the fallback repository is created.
    pub repo_description: String,

    /// Dates processed per batch before a progress report, a courtesy
    /// delay, and a ref update.
    pub batch_size: usize,

    /// Cooperative delay between batches. Rate-limit courtesy only, not
    /// needed for correctness.
    pub batch_delay: Duration,

    /// Retry attempts per remote object-creation call.
    pub retry_attempts: u32,

    /// Base delay for exponential backoff (doubles per attempt).
    pub retry_base_delay: Duration,

    /// Maximum entries per memoization cache (commit lookups, blob and
    /// tree creations).
    pub cache_capacity: usize,

    /// Upper bound on how long to sleep waiting for a rate-limit window
    /// to reset before giving up on the attempt.
    pub max_rate_limit_wait: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            target: None,
            branch: "main".into(),
            private_repo: false,
            repo_description: "Contribution history managed by histofy".into(),
            batch_size: 10,
            batch_delay: Duration::from_millis(50),
            retry_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            cache_capacity: 256,
            max_rate_limit_wait: Duration::from_secs(120),
        }
    }
}

impl DeployConfig {
    /// Parse and set the `owner/name` target override.
    pub fn with_target(mut self, target: &str) -> Result<Self> {
        self.target = Some(RepoTarget::parse(target)?);
        Ok(self)
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

/// Name of the repository created when no target is configured.
pub const FALLBACK_REPO_NAME: &str = "histofy-contributions";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.branch, "main");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.retry_attempts, 3);
        assert!(config.target.is_none());
    }

    #[test]
    fn test_with_target() {
        let config = DeployConfig::default().with_target("octocat/graph").unwrap();
        assert_eq!(config.target.unwrap().repo_key(), "octocat/graph");

        assert!(DeployConfig::default().with_target("bad").is_err());
    }

    #[test]
    fn test_batch_size_floor() {
        let config = DeployConfig::default().with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }
}
