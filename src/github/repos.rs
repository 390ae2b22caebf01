//! Repository and identity operations.

use tracing::info;

use crate::error::Result;
use crate::github::GitHubClient;
use crate::github::types::{CreateRepositoryRequest, Identity, Repository, UserResponse};

/// Repository read/create and identity operations.
///
/// A trait seam so the deployment layer can run against an in-memory
/// remote in tests.
pub trait RepoOps {
    /// Get a specific repository.
    fn get_repository(&self, owner: &str, name: &str) -> Result<Repository>;

    /// Create a repository under the authenticated account.
    ///
    /// The repository is never auto-initialized: an auto-created README
    /// commit would itself count as a contribution on the creation date.
    fn create_repository(&self, name: &str, private: bool, description: &str)
    -> Result<Repository>;

    /// The authenticated account, with a commit-authorship email that
    /// GitHub will attribute.
    fn current_identity(&self) -> Result<Identity>;
}

impl RepoOps for GitHubClient {
    fn get_repository(&self, owner: &str, name: &str) -> Result<Repository> {
        self.get(&format!("/repos/{owner}/{name}"))
    }

    fn create_repository(
        &self,
        name: &str,
        private: bool,
        description: &str,
    ) -> Result<Repository> {
        info!(name, private, "creating repository");
        self.post(
            "/user/repos",
            &CreateRepositoryRequest {
                name: name.to_string(),
                description: description.to_string(),
                private,
                auto_init: false,
            },
        )
    }

    fn current_identity(&self) -> Result<Identity> {
        let user: UserResponse = self.get("/user")?;
        Ok(resolve_identity(user))
    }
}

/// Resolve the commit-authorship identity for an account.
///
/// Private-email accounts return `email: null`; the noreply fallback is
/// load-bearing because commits authored under any other address are not
/// credited to the account's contribution graph.
pub(crate) fn resolve_identity(user: UserResponse) -> Identity {
    let email = user
        .email
        .unwrap_or_else(|| format!("{}@users.noreply.github.com", user.login));
    let name = user.name.unwrap_or_else(|| user.login.clone());
    Identity {
        login: user.login,
        name,
        email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_uses_public_email() {
        let identity = resolve_identity(UserResponse {
            login: "octocat".into(),
            name: Some("The Octocat".into()),
            email: Some("octo@example.com".into()),
        });
        assert_eq!(identity.email, "octo@example.com");
        assert_eq!(identity.name, "The Octocat");
    }

    #[test]
    fn test_identity_falls_back_to_noreply() {
        let identity = resolve_identity(UserResponse {
            login: "octocat".into(),
            name: None,
            email: None,
        });
        assert_eq!(identity.email, "octocat@users.noreply.github.com");
        assert_eq!(identity.name, "octocat");
    }
}
