//! GitHub API integration.
//!
//! [`GitHubClient`] is the authenticated transport; [`RepoOps`] and
//! [`GitDataOps`] are the operation seams the deployment layer drives.
//! The deployer never touches HTTP directly, so tests can substitute an
//! in-memory remote.
//!
//! # Example
//!
//! ```rust,no_run
//! use histofy::github::{GitHubClient, RepoOps};
//!
//! let client = GitHubClient::from_env()?;
//! let repo = client.get_repository("octocat", "hello-world")?;
//! println!("{} (default branch {})", repo.full_name, repo.default_branch);
//! # Ok::<(), histofy::error::HistofyError>(())
//! ```

mod client;
mod gitdata;
mod repos;
pub mod types;

pub use client::{GitHubClient, RateLimitSnapshot};
pub use gitdata::GitDataOps;
pub use repos::RepoOps;
pub use types::{CommitSignature, GitCommit, Identity, Repository, TreeEntry};
