use flow_defs::FlowError;

use crate::pull_request::PublishedPullRequest;

/// Result of one manifest that was meant to end in a pull request.
#[derive(Debug)]
pub struct PullRequest {
    pub env: String,
    pub outcome: Result<PublishedPullRequest, FlowError>,
}

/// Per-manifest results of one event, in manifest order.
#[derive(Debug, Default)]
pub struct PullRequests {
    results: Vec<PullRequest>,
    direct_commits: Vec<DirectCommit>,
}

/// A manifest committed straight to its base branch.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectCommit {
    pub env: String,
    pub branch: String,
    pub sha: String,
}

impl PullRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_opened(&mut self, env: &str, pull_request: PublishedPullRequest) {
        self.results.push(PullRequest {
            env: env.to_string(),
            outcome: Ok(pull_request),
        });
    }

    pub fn push_failed(&mut self, env: &str, error: FlowError) {
        self.results.push(PullRequest {
            env: env.to_string(),
            outcome: Err(error),
        });
    }

    pub fn push_direct_commit(&mut self, commit: DirectCommit) {
        self.direct_commits.push(commit);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PullRequest> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn direct_commits(&self) -> &[DirectCommit] {
        &self.direct_commits
    }

    /// Nothing was committed and nothing failed, e.g. every manifest filtered the version out.
    pub fn is_noop(&self) -> bool {
        self.results.is_empty() && self.direct_commits.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|pr| pr.outcome.is_ok())
    }

    /// One block per environment: the env name, then the PR URL or the error.
    pub fn format_details(&self) -> String {
        let mut details = String::new();
        for pr in &self.results {
            match &pr.outcome {
                Ok(published) => {
                    details += &format!("`{}`\n```{}```\n", pr.env, published.url);
                    for warning in &published.warnings {
                        details += &format!("> {}\n", warning);
                    }
                }
                Err(e) => details += &format!("`{}`\n```{}```\n", pr.env, e),
            }
        }
        for commit in &self.direct_commits {
            details += &format!(
                "`{}`\n```Committed {} to {}```\n",
                commit.env, commit.sha, commit.branch
            );
        }
        details
    }
}

impl<'a> IntoIterator for &'a PullRequests {
    type Item = &'a PullRequest;
    type IntoIter = std::slice::Iter<'a, PullRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
