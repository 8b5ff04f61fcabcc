use serde::{Deserialize, Serialize};

pub const BLOB_MODE: &str = "100644";

/// Owner/name coordinates of a repository on the git host.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoRef {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub object: GitObject,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GitObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub object_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ShaRef {
    pub sha: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GitCommit {
    pub sha: String,
    pub tree: ShaRef,
    #[serde(default)]
    pub parents: Vec<ShaRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub content: String,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, content: impl Into<String>) -> Self {
        TreeEntry {
            path: path.into(),
            mode: BLOB_MODE.to_string(),
            entry_type: "blob".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewTree {
    pub base_tree: String,
    pub tree: Vec<TreeEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GitTree {
    pub sha: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    pub date: String, // RFC 3339
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewCommit {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: CommitAuthor,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
    pub maintainer_can_modify: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PullRequestRef {
    pub number: u64,
    pub html_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_git_ref_from_github_payload() {
        let payload = json!({
            "ref": "refs/heads/main",
            "node_id": "MDM6UmVmcmVmcy9oZWFkcy9mZWF0dXJlQQ==",
            "url": "https://api.github.com/repos/octocat/Hello-World/git/refs/heads/main",
            "object": {
                "type": "commit",
                "sha": "aa218f56b14c9653891f9e74264a383fa43fefbd",
                "url": "https://api.github.com/repos/octocat/Hello-World/git/commits/aa218f56b14c9653891f9e74264a383fa43fefbd"
            }
        });
        let git_ref: GitRef = serde_json::from_value(payload).unwrap();
        assert_eq!(git_ref.ref_name, "refs/heads/main");
        assert_eq!(git_ref.object.sha, "aa218f56b14c9653891f9e74264a383fa43fefbd");
        assert_eq!(git_ref.object.object_type, "commit");
    }

    #[test]
    fn test_tree_entry_serializes_type_key() {
        let entry = TreeEntry::blob("deploy.yaml", "image: app:v2\n");
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "path": "deploy.yaml",
                "mode": "100644",
                "type": "blob",
                "content": "image: app:v2\n"
            })
        );
    }
}
