use async_trait::async_trait;
use flow_defs::{
    GitCommit, GitHostError, GitRef, GitTree, NewCommit, NewPullRequest, NewTree, PullRequestRef,
    RepoRef,
};

/// The subset of a git hosting API the release engine needs.
///
/// Branch arguments are short names (`main`, `release/prod-app-v1`); implementations add the
/// `refs/heads/` prefix themselves.
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Returns `None` when the branch does not exist.
    async fn get_ref(&self, repo: &RepoRef, branch: &str) -> Result<Option<GitRef>, GitHostError>;
    async fn create_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
    ) -> Result<GitRef, GitHostError>;
    async fn update_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<GitRef, GitHostError>;
    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<GitCommit, GitHostError>;
    async fn create_tree(&self, repo: &RepoRef, tree: &NewTree) -> Result<GitTree, GitHostError>;
    async fn create_commit(
        &self,
        repo: &RepoRef,
        commit: &NewCommit,
    ) -> Result<GitCommit, GitHostError>;
    /// Decoded text content of `path` at `reference`.
    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<String, GitHostError>;
    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        pull_request: &NewPullRequest,
    ) -> Result<PullRequestRef, GitHostError>;
    /// The open pull request from `head` into `base`, if there is one.
    async fn find_pull_request(
        &self,
        repo: &RepoRef,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestRef>, GitHostError>;
    async fn add_labels(
        &self,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), GitHostError>;
}
