//! # Histofy
//!
//! Materializes a painted GitHub contribution pattern as real, dated
//! commits pushed through the Git Data API.
//!
//! The pipeline turns a queue of (date, intensity) selections into a
//! causally linked chain of Git objects (blobs, trees, commit objects,
//! then a ref update), handling empty-repository bootstrap, retries,
//! batching, and per-run caching while preserving commit ordering and
//! branch-head consistency.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use histofy::prelude::*;
//! use std::collections::BTreeMap;
//!
//! let client = GitHubClient::from_env()?;
//! let config = DeployConfig::default().with_target("octocat/my-graph")?;
//!
//! let mut dates = BTreeMap::new();
//! dates.insert("2024-03-01".parse().unwrap(), ContributionLevel::High);
//!
//! let store = MemoryStore::new();
//! store.add(PendingChange::date_selection(dates, None))?;
//!
//! let orchestrator = DeploymentOrchestrator::new(&client, config);
//! let result = orchestrator.deploy(&store, &NullReporter, &CancellationToken::new())?;
//! println!("{}", result.summary());
//! # Ok::<(), histofy::error::HistofyError>(())
//! ```
//!
//! Commits within a date form a strict parent chain and dates are
//! processed chronologically, so the final branch head always reflects
//! the most recent painted date.

pub mod cache;
pub mod cancel;
pub mod change;
pub mod config;
pub mod deploy;
pub mod error;
pub mod github;
pub mod retry;
pub mod store;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cancel::CancellationToken;
    pub use crate::change::{ChangeKind, ContributionLevel, PendingChange, RepoTarget};
    pub use crate::config::{DeployConfig, FALLBACK_REPO_NAME};
    pub use crate::deploy::{
        CommitGraphBuilder, CommitRecord, DateFailure, DeploymentOrchestrator, DeploymentProgress,
        DeploymentResult, NullReporter, ProgressReporter, RecordingReporter, RepoDeployment,
        TracingReporter,
    };
    pub use crate::error::{HistofyError, Result};
    pub use crate::github::{GitDataOps, GitHubClient, Identity, RepoOps, Repository};
    pub use crate::retry::RetryPolicy;
    pub use crate::store::{JsonFileStore, MemoryStore, PendingChangeStore};
}

pub use prelude::*;
