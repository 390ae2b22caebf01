//! GitHub API client.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::{HistofyError, Result};

/// Rate-limit state observed on the most recent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub remaining: u64,
    pub reset: DateTime<Utc>,
}

/// Client for interacting with the GitHub API.
///
/// Pure transport: attaches credentials and headers, tracks rate-limit
/// headers, and maps response statuses to typed errors. No retries here;
/// retry policy belongs to the deployment layer.
#[derive(Debug)]
pub struct GitHubClient {
    token: String,
    base_url: String,
    client: Client,
    rate_limit: Mutex<Option<RateLimitSnapshot>>,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(HistofyError::Authentication {
                message: "no API token configured".into(),
            });
        }
        Ok(Self {
            token,
            base_url: "https://api.github.com".into(),
            client: Client::new(),
            rate_limit: Mutex::new(None),
        })
    }

    /// Create a client against a custom API base URL (GitHub Enterprise).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let mut url = base_url.into();
        if url.ends_with('/') {
            url.pop();
        }
        let mut client = Self::new(token)?;
        client.base_url = url;
        Ok(client)
    }

    /// Create a client using the GITHUB_TOKEN environment variable.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN").map_err(|_| HistofyError::Authentication {
            message: "GITHUB_TOKEN environment variable not set".into(),
        })?;
        Self::new(token)
    }

    /// The rate-limit state from the most recent response, if any.
    pub fn rate_limit(&self) -> Option<RateLimitSnapshot> {
        *self.rate_limit.lock().expect("rate limit lock poisoned")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token)).map_err(|_| {
                HistofyError::Authentication {
                    message: "token contains invalid header characters".into(),
                }
            })?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("histofy"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Make a GET request to the GitHub API.
    pub(crate) fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "GET");
        let response = self.client.get(&url).headers(self.headers()?).send()?;
        self.handle(endpoint, response)
    }

    /// Make a POST request to the GitHub API.
    pub(crate) fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()?;
        self.handle(endpoint, response)
    }

    /// Make a PATCH request to the GitHub API.
    pub(crate) fn patch<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "PATCH");
        let response = self
            .client
            .patch(&url)
            .headers(self.headers()?)
            .json(body)
            .send()?;
        self.handle(endpoint, response)
    }

    /// Make a PUT request to the GitHub API.
    pub(crate) fn put<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "PUT");
        let response = self
            .client
            .put(&url)
            .headers(self.headers()?)
            .json(body)
            .send()?;
        self.handle(endpoint, response)
    }

    fn handle<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        response: Response,
    ) -> Result<T> {
        let snapshot = read_rate_limit(response.headers());
        if let Some(snapshot) = snapshot {
            *self.rate_limit.lock().expect("rate limit lock poisoned") = Some(snapshot);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(map_status(endpoint, status, body, snapshot));
        }

        response.json().map_err(|e| HistofyError::Api {
            status: status.as_u16(),
            message: format!("failed to parse response from {endpoint}: {e}"),
        })
    }
}

fn read_rate_limit(headers: &reqwest::header::HeaderMap) -> Option<RateLimitSnapshot> {
    let remaining = header_u64(headers, "x-ratelimit-remaining")?;
    let reset_epoch = header_u64(headers, "x-ratelimit-reset")?;
    let reset = Utc.timestamp_opt(reset_epoch as i64, 0).single()?;
    Some(RateLimitSnapshot { remaining, reset })
}

fn header_u64(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

/// Map a non-2xx response to the error taxonomy.
fn map_status(
    endpoint: &str,
    status: StatusCode,
    body: String,
    rate_limit: Option<RateLimitSnapshot>,
) -> HistofyError {
    match status {
        StatusCode::UNAUTHORIZED => HistofyError::Authentication {
            message: format!("request to {endpoint} rejected: {body}"),
        },
        StatusCode::FORBIDDEN => {
            // A 403 with an exhausted quota is a rate limit, not a
            // permission problem.
            if let Some(snapshot) = rate_limit.filter(|s| s.remaining == 0) {
                HistofyError::RateLimited {
                    reset: snapshot.reset,
                }
            } else {
                let (owner, repo) = split_repo_endpoint(endpoint);
                HistofyError::Permission {
                    owner,
                    repo,
                    message: body,
                }
            }
        }
        StatusCode::NOT_FOUND => HistofyError::NotFound {
            resource: endpoint.to_string(),
        },
        StatusCode::CONFLICT => HistofyError::Conflict {
            resource: endpoint.to_string(),
            message: body,
        },
        _ => HistofyError::Api {
            status: status.as_u16(),
            message: format!("{endpoint}: {body}"),
        },
    }
}

/// Best-effort owner/repo extraction from a `/repos/{owner}/{repo}/...` path.
fn split_repo_endpoint(endpoint: &str) -> (String, String) {
    let mut parts = endpoint.trim_start_matches('/').split('/');
    if parts.next() == Some("repos") {
        let owner = parts.next().unwrap_or_default().to_string();
        let repo = parts.next().unwrap_or_default().to_string();
        (owner, repo)
    } else {
        (String::new(), String::new())
    }
}
