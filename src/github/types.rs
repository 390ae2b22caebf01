//! Wire types for the GitHub REST and Git Data endpoints the deployer uses.

use serde::{Deserialize, Serialize};

/// Repository information from the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub default_branch: String,
    #[serde(rename = "private")]
    pub is_private: bool,
    pub description: Option<String>,
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// The authenticated account, with the commit-authorship email resolved.
#[derive(Debug, Clone)]
pub struct Identity {
    pub login: String,
    pub name: String,
    /// Falls back to `{login}@users.noreply.github.com` when the account
    /// email is private. Commit authorship must use an address GitHub
    /// associates with the account or the contribution is not credited.
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserResponse {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRepositoryRequest {
    pub name: String,
    pub description: String,
    pub private: bool,
    /// Always false: an auto-created README commit would land on the
    /// creation date and pollute the painted pattern.
    pub auto_init: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateBlobRequest {
    pub content: String,
    pub encoding: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShaResponse {
    pub sha: String,
}

/// One entry in a tree-creation request.
#[derive(Debug, Clone, Serialize)]
pub struct TreeEntry {
    pub path: String,
    /// `100644` for a regular file.
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub sha: String,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, blob_sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644",
            entry_type: "blob",
            sha: blob_sha.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTreeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
    pub tree: Vec<TreeEntry>,
}

/// Author/committer signature on a synthesized commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSignature {
    pub name: String,
    pub email: String,
    /// ISO-8601 with offset; pinned to 12:00:00Z by the builder.
    pub date: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: CommitSignature,
    pub committer: CommitSignature,
}

/// A commit object as read back from the Git Data API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub tree: GitCommitTree,
    #[serde(default)]
    pub parents: Vec<CommitParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitCommitTree {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitParent {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefResponse {
    pub object: RefObject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefObject {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRefRequest {
    pub sha: String,
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutContentsRequest {
    pub message: String,
    /// Base64-encoded file content, as the contents endpoint requires.
    pub content: String,
    pub branch: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PutContentsResponse {
    pub commit: ShaResponse,
}
