use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use flow_defs::{
    GitCommit, GitHostError, GitObject, GitRef, GitTree, NewCommit, NewPullRequest, NewTree,
    PullRequestRef, RepoRef, ShaRef,
};

use crate::GitHost;

#[derive(Default)]
struct State {
    refs: HashMap<(String, String), String>,
    commits: HashMap<String, GitCommit>,
    files: HashMap<(String, String, String), String>,
    trees: Vec<(RepoRef, NewTree)>,
    new_commits: Vec<(RepoRef, NewCommit)>,
    pull_requests: Vec<(RepoRef, NewPullRequest)>,
    labels: Vec<(u64, Vec<String>)>,
    created_refs: Vec<(String, String)>,
    content_fetches: usize,
    update_ref_failures: u32,
    failing_repos: HashSet<String>,
    fail_pull_requests: bool,
    fail_labels: bool,
    next_id: u64,
}

/// In-memory git host. Commits store the tree they were created with so refs can advance.
#[derive(Default)]
pub struct FakeGitHost {
    state: Mutex<State>,
}

impl FakeGitHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `branch` pointing at commit `sha`, whose tree is `tree-<sha>`.
    pub fn with_branch(self, repo: &RepoRef, branch: &str, sha: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .refs
                .insert((repo.full_name(), branch.to_string()), sha.to_string());
            state.commits.insert(
                sha.to_string(),
                GitCommit {
                    sha: sha.to_string(),
                    tree: ShaRef {
                        sha: format!("tree-{}", sha),
                    },
                    parents: vec![],
                },
            );
        }
        self
    }

    pub fn with_file(self, repo: &RepoRef, reference: &str, path: &str, content: &str) -> Self {
        self.state.lock().unwrap().files.insert(
            (repo.full_name(), reference.to_string(), path.to_string()),
            content.to_string(),
        );
        self
    }

    /// The next `times` ref updates fail as if the branch moved underneath us.
    pub fn failing_ref_updates(self, times: u32) -> Self {
        self.state.lock().unwrap().update_ref_failures = times;
        self
    }

    /// Every commit creation in `repo` fails.
    pub fn failing_commits_in(self, repo: &RepoRef) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_repos
            .insert(repo.full_name());
        self
    }

    pub fn failing_pull_requests(self) -> Self {
        self.state.lock().unwrap().fail_pull_requests = true;
        self
    }

    pub fn failing_labels(self) -> Self {
        self.state.lock().unwrap().fail_labels = true;
        self
    }

    pub fn ref_sha(&self, repo: &RepoRef, branch: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .refs
            .get(&(repo.full_name(), branch.to_string()))
            .cloned()
    }

    pub fn trees(&self) -> Vec<NewTree> {
        let state = self.state.lock().unwrap();
        state.trees.iter().map(|(_, tree)| tree.clone()).collect()
    }

    pub fn commits(&self) -> Vec<NewCommit> {
        let state = self.state.lock().unwrap();
        state
            .new_commits
            .iter()
            .map(|(_, commit)| commit.clone())
            .collect()
    }

    pub fn pull_requests(&self) -> Vec<NewPullRequest> {
        let state = self.state.lock().unwrap();
        state
            .pull_requests
            .iter()
            .map(|(_, pr)| pr.clone())
            .collect()
    }

    pub fn labels(&self) -> Vec<(u64, Vec<String>)> {
        self.state.lock().unwrap().labels.clone()
    }

    pub fn created_refs(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().created_refs.clone()
    }

    pub fn content_fetches(&self) -> usize {
        self.state.lock().unwrap().content_fetches
    }

    fn next_id(state: &mut State) -> u64 {
        state.next_id += 1;
        state.next_id
    }
}

fn git_ref(branch: &str, sha: &str) -> GitRef {
    GitRef {
        ref_name: format!("refs/heads/{}", branch),
        object: GitObject {
            sha: sha.to_string(),
            object_type: "commit".to_string(),
        },
    }
}

fn open_pull_request(state: &State, repo: &RepoRef, head: &str, base: &str) -> Option<u64> {
    state
        .pull_requests
        .iter()
        .position(|(r, pr)| r == repo && pr.head == head && pr.base == base)
        .map(|index| index as u64 + 1)
}

fn pull_request_ref(repo: &RepoRef, number: u64) -> PullRequestRef {
    PullRequestRef {
        number,
        html_url: format!("https://github.com/{}/pull/{}", repo.full_name(), number),
    }
}

fn unprocessable(url: &str, message: &str) -> GitHostError {
    GitHostError::Http {
        url: url.to_string(),
        status: 422,
        message: message.to_string(),
    }
}

#[async_trait]
impl GitHost for FakeGitHost {
    async fn get_ref(&self, repo: &RepoRef, branch: &str) -> Result<Option<GitRef>, GitHostError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .refs
            .get(&(repo.full_name(), branch.to_string()))
            .map(|sha| git_ref(branch, sha)))
    }

    async fn create_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
    ) -> Result<GitRef, GitHostError> {
        let mut state = self.state.lock().unwrap();
        let key = (repo.full_name(), branch.to_string());
        if state.refs.contains_key(&key) {
            return Err(unprocessable("git/refs", "Reference already exists"));
        }
        state.refs.insert(key, sha.to_string());
        state
            .created_refs
            .push((branch.to_string(), sha.to_string()));
        Ok(git_ref(branch, sha))
    }

    async fn update_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<GitRef, GitHostError> {
        let mut state = self.state.lock().unwrap();
        if state.update_ref_failures > 0 {
            state.update_ref_failures -= 1;
            return Err(unprocessable("git/refs", "Update is not a fast forward"));
        }
        let key = (repo.full_name(), branch.to_string());
        let current = state
            .refs
            .get(&key)
            .cloned()
            .ok_or_else(|| GitHostError::NotFound(format!("refs/heads/{}", branch)))?;
        let fast_forward = state
            .commits
            .get(sha)
            .map_or(false, |c| c.parents.iter().any(|p| p.sha == current));
        if !force && !fast_forward {
            return Err(unprocessable("git/refs", "Update is not a fast forward"));
        }
        state.refs.insert(key, sha.to_string());
        Ok(git_ref(branch, sha))
    }

    async fn get_commit(&self, _repo: &RepoRef, sha: &str) -> Result<GitCommit, GitHostError> {
        let state = self.state.lock().unwrap();
        state
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| GitHostError::NotFound(format!("git/commits/{}", sha)))
    }

    async fn create_tree(&self, repo: &RepoRef, tree: &NewTree) -> Result<GitTree, GitHostError> {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        state.trees.push((repo.clone(), tree.clone()));
        Ok(GitTree {
            sha: format!("tree-{}", id),
        })
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        commit: &NewCommit,
    ) -> Result<GitCommit, GitHostError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_repos.contains(&repo.full_name()) {
            return Err(GitHostError::Http {
                url: "git/commits".to_string(),
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        let id = Self::next_id(&mut state);
        let created = GitCommit {
            sha: format!("commit-{}", id),
            tree: ShaRef {
                sha: commit.tree.clone(),
            },
            parents: commit
                .parents
                .iter()
                .map(|sha| ShaRef { sha: sha.clone() })
                .collect(),
        };
        state.commits.insert(created.sha.clone(), created.clone());
        state.new_commits.push((repo.clone(), commit.clone()));
        Ok(created)
    }

    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<String, GitHostError> {
        let mut state = self.state.lock().unwrap();
        state.content_fetches += 1;
        state
            .files
            .get(&(repo.full_name(), reference.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| GitHostError::NotFound(format!("contents/{}", path)))
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        pull_request: &NewPullRequest,
    ) -> Result<PullRequestRef, GitHostError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_pull_requests {
            return Err(unprocessable("pulls", "Validation Failed"));
        }
        if open_pull_request(&state, repo, &pull_request.head, &pull_request.base).is_some() {
            return Err(unprocessable(
                "pulls",
                &format!(
                    "Validation Failed: A pull request already exists for {}:{}.",
                    repo.owner, pull_request.head
                ),
            ));
        }
        state.pull_requests.push((repo.clone(), pull_request.clone()));
        let number = state.pull_requests.len() as u64;
        Ok(pull_request_ref(repo, number))
    }

    async fn find_pull_request(
        &self,
        repo: &RepoRef,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestRef>, GitHostError> {
        let state = self.state.lock().unwrap();
        Ok(open_pull_request(&state, repo, head, base)
            .map(|number| pull_request_ref(repo, number)))
    }

    async fn add_labels(
        &self,
        _repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), GitHostError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_labels {
            return Err(GitHostError::Http {
                url: format!("issues/{}/labels", number),
                status: 403,
                message: "Resource not accessible by integration".to_string(),
            });
        }
        state.labels.push((number, labels.to_vec()));
        Ok(())
    }
}
