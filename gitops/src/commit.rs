use std::collections::BTreeSet;

use chrono::Utc;
use flow_defs::{
    CommitAuthor, CommitStage, FlowError, GitHostError, GitRef, NewCommit, NewTree, TreeEntry,
};
use flow_utils::RetryPolicy;

use crate::release::Release;
use crate::rewrite::rewrite_files;
use crate::GitHost;

/// A commit that landed on the release's commit branch.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub sha: String,
    pub branch: String,
    pub files: Vec<String>,
    pub previous_versions: BTreeSet<String>,
}

struct Committer<'a> {
    host: &'a dyn GitHost,
    release: &'a Release,
    stage: CommitStage,
}

impl<'a> Committer<'a> {
    fn enter(&mut self, stage: CommitStage) {
        log::debug!(
            "{}@{}: {}",
            self.release.repo.full_name(),
            self.release.commit_branch,
            stage
        );
        self.stage = stage;
    }

    fn fail(&self, source: GitHostError) -> FlowError {
        FlowError::commit(self.stage, source)
    }

    /// Reuses the commit branch if it exists, otherwise branches it off the base branch.
    async fn resolve_ref(&mut self) -> Result<GitRef, FlowError> {
        self.enter(CommitStage::RefResolving);
        let release = self.release;
        let repo = &release.repo;
        let branch = &release.commit_branch;

        if let Some(existing) = self.host.get_ref(repo, branch).await.map_err(|e| self.fail(e))? {
            return Ok(existing);
        }

        let base = self
            .host
            .get_ref(repo, &release.base_branch)
            .await
            .map_err(|e| self.fail(e))?
            .ok_or_else(|| {
                self.fail(GitHostError::NotFound(format!(
                    "base branch {} of {}",
                    release.base_branch,
                    repo.full_name()
                )))
            })?;

        log::info!(
            "Creating branch {} in {} from {} ({})",
            branch,
            repo.full_name(),
            release.base_branch,
            base.object.sha
        );
        self.host
            .create_ref(repo, branch, &base.object.sha)
            .await
            .map_err(|e| self.fail(e))
    }

    async fn run(mut self) -> Result<CommitOutcome, FlowError> {
        let release = self.release;
        let repo = &release.repo;

        // Always rewrite from the base branch so retries never stack edits.
        // The commit branch is only touched once there is something to commit.
        self.enter(CommitStage::ContentFetching);
        let rewritten = rewrite_files(self.host, repo, &release.base_branch, &release.changes)
            .await
            .map_err(|e| self.fail(e))?;
        if rewritten.is_empty() {
            return Err(FlowError::NoChanges {
                branch: release.commit_branch.clone(),
            });
        }

        let git_ref = self.resolve_ref().await?;

        self.enter(CommitStage::TreeBuilding);
        let parent = self
            .host
            .get_commit(repo, &git_ref.object.sha)
            .await
            .map_err(|e| self.fail(e))?;
        let new_tree = NewTree {
            base_tree: parent.tree.sha.clone(),
            tree: rewritten
                .files
                .iter()
                .map(|(path, content)| TreeEntry::blob(path, content))
                .collect(),
        };
        let tree = self
            .host
            .create_tree(repo, &new_tree)
            .await
            .map_err(|e| self.fail(e))?;

        self.enter(CommitStage::CommitCreating);
        let new_commit = NewCommit {
            message: release.message.clone(),
            tree: tree.sha,
            parents: vec![parent.sha.clone()],
            author: CommitAuthor {
                name: release.author.name.clone(),
                email: release.author.email.clone(),
                date: Utc::now().to_rfc3339(),
            },
        };
        let commit = self
            .host
            .create_commit(repo, &new_commit)
            .await
            .map_err(|e| self.fail(e))?;

        self.enter(CommitStage::RefUpdating);
        self.host
            .update_ref(repo, &release.commit_branch, &commit.sha, false)
            .await
            .map_err(|e| self.fail(e))?;

        Ok(CommitOutcome {
            sha: commit.sha,
            branch: release.commit_branch.clone(),
            files: rewritten.files.into_keys().collect(),
            previous_versions: rewritten.old_values,
        })
    }
}

/// Writes the release's rewritten files as a single commit on its commit branch.
pub async fn commit_release(
    host: &dyn GitHost,
    release: &Release,
) -> Result<CommitOutcome, FlowError> {
    Committer {
        host,
        release,
        stage: CommitStage::RefResolving,
    }
    .run()
    .await
}

/// `commit_release` under `policy`; an empty rewrite is not retried.
pub async fn commit_release_with_retry(
    host: &dyn GitHost,
    release: &Release,
    policy: &RetryPolicy,
) -> Result<CommitOutcome, FlowError> {
    let what = format!("Commit to {}@{}", release.repo.full_name(), release.commit_branch);
    policy
        .run_if(
            &what,
            |e: &FlowError| !matches!(e, FlowError::NoChanges { .. }),
            |_| commit_release(host, release),
        )
        .await
}
