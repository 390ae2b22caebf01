//! Low-level Git Data operations: blobs, trees, commit objects, refs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::Result;
use crate::github::GitHubClient;
use crate::github::types::{
    CommitSignature, CreateBlobRequest, CreateCommitRequest, CreateRefRequest, CreateTreeRequest,
    GitCommit, PutContentsRequest, PutContentsResponse, RefResponse, ShaResponse, TreeEntry,
    UpdateRefRequest,
};

/// One-to-one wrappers over the Git Data endpoints.
///
/// The sequencing contract lives in the deployment layer; these calls
/// carry no business logic. The trait is the seam the tests fake.
pub trait GitDataOps {
    /// Create a blob from UTF-8 text, returning its SHA.
    fn create_blob(&self, owner: &str, repo: &str, content: &str) -> Result<String>;

    /// Create a tree, optionally layered on a base tree, returning its SHA.
    fn create_tree(
        &self,
        owner: &str,
        repo: &str,
        base_tree: Option<&str>,
        entries: Vec<TreeEntry>,
    ) -> Result<String>;

    /// Create a commit object. `parents` is empty for a root commit.
    fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        tree: &str,
        parents: &[String],
        author: &CommitSignature,
    ) -> Result<String>;

    /// Read a commit object back (used for parent-tree resolution).
    fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<GitCommit>;

    /// Read the SHA a branch ref points at.
    fn get_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<String>;

    /// Create a branch ref pointing at `sha`.
    fn create_ref(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<()>;

    /// Fast-forward a branch ref to `sha`. Never forced: a forced update
    /// could silently discard commits someone else pushed mid-run.
    fn update_ref(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<()>;

    /// Simple content-write endpoint. Used only to bootstrap an empty
    /// repository when the ref endpoints are in a transient conflict.
    fn put_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
    ) -> Result<String>;
}

impl GitDataOps for GitHubClient {
    fn create_blob(&self, owner: &str, repo: &str, content: &str) -> Result<String> {
        let response: ShaResponse = self.post(
            &format!("/repos/{owner}/{repo}/git/blobs"),
            &CreateBlobRequest {
                content: content.to_string(),
                encoding: "utf-8",
            },
        )?;
        Ok(response.sha)
    }

    fn create_tree(
        &self,
        owner: &str,
        repo: &str,
        base_tree: Option<&str>,
        entries: Vec<TreeEntry>,
    ) -> Result<String> {
        let response: ShaResponse = self.post(
            &format!("/repos/{owner}/{repo}/git/trees"),
            &CreateTreeRequest {
                base_tree: base_tree.map(str::to_string),
                tree: entries,
            },
        )?;
        Ok(response.sha)
    }

    fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        tree: &str,
        parents: &[String],
        author: &CommitSignature,
    ) -> Result<String> {
        let response: ShaResponse = self.post(
            &format!("/repos/{owner}/{repo}/git/commits"),
            &CreateCommitRequest {
                message: message.to_string(),
                tree: tree.to_string(),
                parents: parents.to_vec(),
                author: author.clone(),
                committer: author.clone(),
            },
        )?;
        Ok(response.sha)
    }

    fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<GitCommit> {
        self.get(&format!("/repos/{owner}/{repo}/git/commits/{sha}"))
    }

    fn get_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
        let response: RefResponse =
            self.get(&format!("/repos/{owner}/{repo}/git/ref/heads/{branch}"))?;
        Ok(response.object.sha)
    }

    fn create_ref(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<()> {
        let _: RefResponse = self.post(
            &format!("/repos/{owner}/{repo}/git/refs"),
            &CreateRefRequest {
                ref_name: format!("refs/heads/{branch}"),
                sha: sha.to_string(),
            },
        )?;
        Ok(())
    }

    fn update_ref(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<()> {
        let _: RefResponse = self.patch(
            &format!("/repos/{owner}/{repo}/git/refs/heads/{branch}"),
            &UpdateRefRequest {
                sha: sha.to_string(),
                force: false,
            },
        )?;
        Ok(())
    }

    fn put_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
    ) -> Result<String> {
        let response: PutContentsResponse = self.put(
            &format!("/repos/{owner}/{repo}/contents/{path}"),
            &PutContentsRequest {
                message: message.to_string(),
                content: BASE64.encode(content),
                branch: branch.to_string(),
            },
        )?;
        Ok(response.commit.sha)
    }
}
