use serde::{Deserialize, Serialize};

/// A deployable unit, identified by the container image it is built into.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    pub image: String,
    pub source_owner: String,
    pub source_name: String,
    pub manifest_owner: String,
    pub manifest_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_base_branch: Option<String>,
    #[serde(default)]
    pub rewrite_version: bool,
    #[serde(default)]
    pub rewrite_new_tag: bool,
    #[serde(default)]
    pub additional_rewrite_keys: Vec<String>,
    #[serde(default)]
    pub additional_rewrite_prefixes: Vec<String>,
    #[serde(default)]
    pub manifests: Vec<Manifest>,
}

/// One deployment target of an application.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub env: String,
    pub files: Vec<String>,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default, rename = "commitWithoutPR")]
    pub commit_without_pr: bool,
    #[serde(default)]
    pub show_source_owner: bool,
    #[serde(default)]
    pub show_source_name: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, rename = "prBody", skip_serializing_if = "Option::is_none")]
    pub pr_body: Option<String>,
    #[serde(default)]
    pub hide_release_diff: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default)]
    pub include_prefixes: Vec<String>,
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,
}

impl Filters {
    pub fn matches_any_include_prefix(&self, version: &str) -> bool {
        self.include_prefixes
            .iter()
            .any(|prefix| version.starts_with(prefix.as_str()))
    }

    pub fn matches_any_exclude_prefix(&self, version: &str) -> bool {
        self.exclude_prefixes
            .iter()
            .any(|prefix| version.starts_with(prefix.as_str()))
    }
}
