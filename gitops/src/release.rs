use std::collections::BTreeSet;

use flow_defs::{
    Application, Defaults, FlowConfig, GitAuthor, Manifest, RepoRef, DEFAULT_BASE_BRANCH,
};

use crate::rewrite::{rules_for_file, Change, RewriteRule};

/// Everything needed to commit and publish one manifest's rollout of a version.
#[derive(Debug, Clone)]
pub struct Release {
    pub env: String,
    pub version: String,
    pub repo: RepoRef,
    pub source: RepoRef,
    pub base_branch: String,
    pub commit_branch: String,
    pub author: GitAuthor,
    pub message: String,
    pub labels: Vec<String>,
    pub commit_without_pr: bool,
    pub hide_release_diff: bool,
    pub extra_body: Option<String>,
    pub changes: Vec<Change>,
}

impl Release {
    pub fn new(config: &FlowConfig, app: &Application, manifest: &Manifest, version: &str) -> Self {
        let base_branch = base_branch(&config.defaults, app, manifest);
        let commit_branch = if manifest.commit_without_pr {
            base_branch.clone()
        } else {
            branch_name(&config.defaults, app, manifest, version)
        };

        let mut release = Release {
            env: manifest.env.clone(),
            version: version.to_string(),
            repo: RepoRef::new(&app.manifest_owner, &app.manifest_name),
            source: RepoRef::new(&app.source_owner, &app.source_name),
            base_branch,
            commit_branch,
            author: config.git_author.clone(),
            message: commit_message(&config.defaults, app, manifest, version),
            labels: labels(app, manifest),
            commit_without_pr: manifest.commit_without_pr,
            hide_release_diff: manifest.hide_release_diff,
            extra_body: manifest.pr_body.clone().filter(|body| !body.is_empty()),
            changes: Vec::new(),
        };

        for file_path in &manifest.files {
            for rule in rules_for_file(app, file_path, version) {
                release.add_change(file_path, rule);
            }
        }

        release
    }

    pub fn add_change(&mut self, file_path: &str, rule: RewriteRule) {
        self.changes.push(Change {
            file_path: file_path.to_string(),
            rule,
        });
    }

    /// Pull request body; `previous_versions` are the values the rewrite replaced.
    pub fn body(&self, previous_versions: &BTreeSet<String>) -> String {
        let mut body = format!(
            "https://github.com/{}/{}/releases/tag/{}",
            self.source.owner, self.source.name, self.version
        );

        let compare_links: Vec<String> = previous_versions
            .iter()
            .filter(|previous| previous.as_str() != self.version)
            .map(|previous| {
                format!(
                    "https://github.com/{}/{}/compare/{}...{}",
                    self.source.owner, self.source.name, previous, self.version
                )
            })
            .collect();

        if !self.hide_release_diff && !compare_links.is_empty() {
            body += "\n\n### Diff from last release\n";
            body += &compare_links.join("\n");
        }

        if let Some(extra) = &self.extra_body {
            body += &format!("\n\n{}", extra);
        }

        body
    }
}

fn source_segment(app: &Application, manifest: &Manifest, separator: &str) -> Option<String> {
    if !manifest.show_source_name {
        return None;
    }
    if manifest.show_source_owner {
        Some(format!("{}{}{}", app.source_owner, separator, app.source_name))
    } else {
        Some(app.source_name.clone())
    }
}

/// `<prefix>/<env>[-[<owner>-]<name>]-<version>`
pub fn branch_name(
    defaults: &Defaults,
    app: &Application,
    manifest: &Manifest,
    version: &str,
) -> String {
    let mut branch = format!("{}/{}", defaults.branch_prefix, manifest.env);
    if let Some(source) = source_segment(app, manifest, "-") {
        branch += &format!("-{}", source);
    }
    branch += &format!("-{}", version);
    branch
}

/// `<verb> <env>[ [<owner>/]<name>] <version>`
pub fn commit_message(
    defaults: &Defaults,
    app: &Application,
    manifest: &Manifest,
    version: &str,
) -> String {
    let mut message = format!("{} {}", defaults.message_verb, manifest.env);
    if let Some(source) = source_segment(app, manifest, "/") {
        message += &format!(" {}", source);
    }
    message += &format!(" {}", version);
    message
}

/// Manifest override, then application override, then the global default, then `master`.
pub fn base_branch(defaults: &Defaults, app: &Application, manifest: &Manifest) -> String {
    [
        manifest.base_branch.as_deref(),
        app.manifest_base_branch.as_deref(),
        defaults.base_branch.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|branch| !branch.is_empty())
    .unwrap_or(DEFAULT_BASE_BRANCH)
    .to_string()
}

pub fn labels(app: &Application, manifest: &Manifest) -> Vec<String> {
    let mut labels = vec![app.source_name.clone(), manifest.env.clone()];
    labels.extend(manifest.labels.iter().cloned());
    labels
}
