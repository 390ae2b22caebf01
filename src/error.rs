//! Error types for the deployment pipeline.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The main error type for deployment operations.
#[derive(Error, Debug)]
pub enum HistofyError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Permission denied for {owner}/{repo}: {message}")]
    Permission {
        owner: String,
        repo: String,
        message: String,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict on {resource}: {message}")]
    Conflict { resource: String, message: String },

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded, resets at {reset}")]
    RateLimited { reset: DateTime<Utc> },

    #[error("A deployment is already in progress")]
    ConcurrentDeployment,

    #[error("Deployment cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid target repository '{0}', expected owner/name")]
    InvalidTarget(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bootstrap commit failed: {original}; recovery also failed: {recovery}")]
    BootstrapFailed { original: String, recovery: String },
}

impl HistofyError {
    /// Whether a failed remote call is worth retrying with backoff.
    ///
    /// Authentication and permission failures will not fix themselves;
    /// conflicts have a dedicated recovery path in the orchestrator.
    pub fn is_transient(&self) -> bool {
        match self {
            HistofyError::Api { status, .. } => *status >= 500 || *status == 429,
            HistofyError::RateLimited { .. } => true,
            HistofyError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Human-readable guidance for known failure modes, used by the CLI.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            HistofyError::Authentication { .. } => {
                Some("Check that your token is set and has not expired")
            }
            HistofyError::Permission { .. } => {
                Some("The token needs repo scope and write access to the target repository")
            }
            HistofyError::NotFound { .. } => {
                Some("The repository or branch does not exist and could not be created")
            }
            HistofyError::Conflict { .. } => {
                Some("The branch reference is in a transient conflict; retrying usually resolves it")
            }
            HistofyError::RateLimited { .. } => {
                Some("Wait for the rate limit window to reset before deploying again")
            }
            _ => None,
        }
    }
}

/// A specialized Result type for deployment operations.
pub type Result<T> = std::result::Result<T, HistofyError>;
