//! The deployment pipeline: commit synthesis and orchestration.
//!
//! [`CommitGraphBuilder`] turns painted (date, level) pairs into chained
//! Git objects; [`DeploymentOrchestrator`] drives the whole run from the
//! pending queue to the final branch-ref update.

mod builder;
mod orchestrator;
mod progress;
mod result;

pub use builder::{ACTIVITY_FILE, CommitGraphBuilder, DateChainOutcome, commit_timestamp};
pub use orchestrator::DeploymentOrchestrator;
pub use progress::{
    DeploymentProgress, NullReporter, ProgressReporter, RecordingReporter, TracingReporter,
};
pub use result::{CommitRecord, DateFailure, DeploymentResult, RepoDeployment};
