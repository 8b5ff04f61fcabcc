use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flow_defs::{
    GitCommit, GitHostError, GitRef, GitTree, NewCommit, NewPullRequest, NewTree, PullRequestRef,
    RepoRef,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::GitHost;

const FLOW_USER_AGENT: &str = "flow/gitops";
pub const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct FileContent {
    content: String,
    encoding: String,
}

/// `GitHost` backed by the GitHub REST API, authenticated with a token.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_url(token, GITHUB_API_URL)
    }

    /// For GitHub Enterprise, e.g. `https://github.example.com/api/v3`.
    pub fn with_api_url(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        GitHubClient {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn repo_url(&self, repo: &RepoRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, repo.owner, repo.name, path
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("User-Agent", FLOW_USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", self.token))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, GitHostError> {
        let response = request
            .send()
            .await
            .map_err(|e| GitHostError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GitHostError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitHostError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GitHostError::Decode(format!("{}: {}", url, e)))
    }
}

/// GitHub puts a human readable reason in `message` and validation details in `errors`;
/// fall back to the raw body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let Some(message) = value["message"].as_str() else {
        return body.trim().to_string();
    };

    let details: Vec<&str> = value["errors"]
        .as_array()
        .map(|errors| errors.iter().filter_map(|e| e["message"].as_str()).collect())
        .unwrap_or_default();
    if details.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", message, details.join("; "))
    }
}

fn decode_file_content(file: FileContent) -> Result<String, GitHostError> {
    if file.encoding != "base64" {
        return Err(GitHostError::Decode(format!(
            "Unexpected encoding {}",
            file.encoding
        )));
    }
    let bytes = STANDARD
        .decode(file.content.replace('\n', ""))
        .map_err(|e| GitHostError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GitHostError::Decode(e.to_string()))
}

#[async_trait]
impl GitHost for GitHubClient {
    async fn get_ref(&self, repo: &RepoRef, branch: &str) -> Result<Option<GitRef>, GitHostError> {
        let url = self.repo_url(repo, &format!("git/ref/heads/{}", branch));
        match self.send(self.request(Method::GET, &url), &url).await {
            Ok(git_ref) => Ok(Some(git_ref)),
            Err(GitHostError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
    ) -> Result<GitRef, GitHostError> {
        let url = self.repo_url(repo, "git/refs");
        let body = json!({
            "ref": format!("refs/heads/{}", branch),
            "sha": sha,
        });
        self.send(self.request(Method::POST, &url).json(&body), &url)
            .await
    }

    async fn update_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<GitRef, GitHostError> {
        let url = self.repo_url(repo, &format!("git/refs/heads/{}", branch));
        let body = json!({
            "sha": sha,
            "force": force,
        });
        self.send(self.request(Method::PATCH, &url).json(&body), &url)
            .await
    }

    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<GitCommit, GitHostError> {
        let url = self.repo_url(repo, &format!("git/commits/{}", sha));
        self.send(self.request(Method::GET, &url), &url).await
    }

    async fn create_tree(&self, repo: &RepoRef, tree: &NewTree) -> Result<GitTree, GitHostError> {
        let url = self.repo_url(repo, "git/trees");
        self.send(self.request(Method::POST, &url).json(tree), &url)
            .await
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        commit: &NewCommit,
    ) -> Result<GitCommit, GitHostError> {
        let url = self.repo_url(repo, "git/commits");
        self.send(self.request(Method::POST, &url).json(commit), &url)
            .await
    }

    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<String, GitHostError> {
        let url = self.repo_url(repo, &format!("contents/{}", path));
        let request = self
            .request(Method::GET, &url)
            .query(&[("ref", reference)]);
        let file: FileContent = self.send(request, &url).await?;
        decode_file_content(file)
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        pull_request: &NewPullRequest,
    ) -> Result<PullRequestRef, GitHostError> {
        let url = self.repo_url(repo, "pulls");
        self.send(self.request(Method::POST, &url).json(pull_request), &url)
            .await
    }

    async fn find_pull_request(
        &self,
        repo: &RepoRef,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestRef>, GitHostError> {
        let url = self.repo_url(repo, "pulls");
        let head = format!("{}:{}", repo.owner, head);
        let request = self.request(Method::GET, &url).query(&[
            ("head", head.as_str()),
            ("base", base),
            ("state", "open"),
        ]);
        let open: Vec<PullRequestRef> = self.send(request, &url).await?;
        Ok(open.into_iter().next())
    }

    async fn add_labels(
        &self,
        repo: &RepoRef,
        number: u64,
        labels: &[String],
    ) -> Result<(), GitHostError> {
        let url = self.repo_url(repo, &format!("issues/{}/labels", number));
        let body = json!({ "labels": labels });
        let _: Value = self
            .send(self.request(Method::POST, &url).json(&body), &url)
            .await?;
        Ok(())
    }
}
