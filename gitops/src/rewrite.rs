use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use flow_defs::{Application, GitHostError, RepoRef};
use regex::Regex;

use crate::GitHost;

/// Name of the capture group holding the value a rule replaces.
pub const OLD_VALUE_GROUP: &str = "old";
/// Optional group right after `old` that is removed along with it.
pub const DROPPED_SUFFIX_GROUP: &str = "dropped";
/// Comments that pin a `version:` line.
pub const DO_NOT_REWRITE_MARKERS: [&str; 2] = ["# do-not-rewrite", "# no-rewrite"];
const KUSTOMIZATION_FILE: &str = "kustomization.yaml";
// Image tags and versions: a word character followed by word characters, dots, dashes or plus.
const VALUE_PATTERN: &str = r"[A-Za-z0-9_][A-Za-z0-9_.+\-]*";
const DIGEST_PATTERN: &str = r"@sha256:[0-9a-f]+";

type Render = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One regex rewrite: every match of `pattern` has its `old` capture replaced by `render(old)`.
#[derive(Clone)]
pub struct RewriteRule {
    pub name: String,
    pub pattern: String,
    pub skip_markers: Vec<String>,
    render: Render,
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("skip_markers", &self.skip_markers)
            .finish()
    }
}

/// Result of applying a rule to one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub content: String,
    pub old_values: Vec<String>,
}

impl Applied {
    pub fn matched(&self) -> bool {
        !self.old_values.is_empty()
    }
}

impl RewriteRule {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        render: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        RewriteRule {
            name: name.into(),
            pattern: pattern.into(),
            skip_markers: Vec::new(),
            render: Arc::new(render),
        }
    }

    /// Leaves matches alone when their line contains any of `markers`.
    pub fn skipping_lines_with<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// `<image>:<tag>` references, e.g. `image: registry/app:v1.2.2`.
    ///
    /// A digest pin (`:v1@sha256:...`) is dropped, otherwise the runtime would keep the old image.
    pub fn image_tag(image: &str, version: &str) -> Self {
        let version = version.to_string();
        RewriteRule::new(
            "image-tag",
            format!(
                r#"(?m)(?:^|[\s"'=])({}):(?P<{}>{})(?P<{}>{})?"#,
                regex::escape(image),
                OLD_VALUE_GROUP,
                VALUE_PATTERN,
                DROPPED_SUFFIX_GROUP,
                DIGEST_PATTERN
            ),
            move |_| version.clone(),
        )
    }

    /// A YAML `key: value` pair; quotes around the value are kept.
    pub fn yaml_key(key: &str, version: &str) -> Self {
        let version = version.to_string();
        RewriteRule::new(
            format!("key:{}", key),
            format!(
                r#"(?m)(?:^|[\s{{,])({}):[ \t]*["']?(?P<{}>{})"#,
                regex::escape(key),
                OLD_VALUE_GROUP,
                VALUE_PATTERN
            ),
            move |_| version.clone(),
        )
    }

    /// The value following a literal `prefix`, e.g. `APP_VERSION=`.
    pub fn prefix(prefix: &str, version: &str) -> Self {
        let version = version.to_string();
        RewriteRule::new(
            format!("prefix:{}", prefix),
            format!(
                r"{}(?P<{}>{})",
                regex::escape(prefix),
                OLD_VALUE_GROUP,
                VALUE_PATTERN
            ),
            move |_| version.clone(),
        )
    }

    pub fn apply(&self, content: &str) -> Result<Applied, regex::Error> {
        let re = Regex::new(&self.pattern)?;

        let mut rewritten = String::with_capacity(content.len());
        let mut old_values = Vec::new();
        let mut last = 0;

        for captures in re.captures_iter(content) {
            let Some(old) = captures.name(OLD_VALUE_GROUP) else {
                continue;
            };
            if self.is_skipped_line(content, old.start()) {
                continue;
            }
            rewritten.push_str(&content[last..old.start()]);
            rewritten.push_str(&(self.render)(old.as_str()));
            last = captures
                .name(DROPPED_SUFFIX_GROUP)
                .map_or(old.end(), |dropped| dropped.end());
            old_values.push(old.as_str().to_string());
        }
        rewritten.push_str(&content[last..]);

        Ok(Applied {
            content: rewritten,
            old_values,
        })
    }

    fn is_skipped_line(&self, content: &str, offset: usize) -> bool {
        if self.skip_markers.is_empty() {
            return false;
        }
        let start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
        let end = content[offset..]
            .find('\n')
            .map_or(content.len(), |i| offset + i);
        let line = &content[start..end];
        self.skip_markers
            .iter()
            .any(|marker| line.contains(marker.as_str()))
    }
}

/// A rule bound to the file it rewrites.
#[derive(Debug, Clone)]
pub struct Change {
    pub file_path: String,
    pub rule: RewriteRule,
}

/// Rules for one file, in the order they are applied.
pub fn rules_for_file(app: &Application, file_path: &str, version: &str) -> Vec<RewriteRule> {
    let mut rules = vec![RewriteRule::image_tag(&app.image, version)];

    if app.rewrite_version {
        rules.push(
            RewriteRule::yaml_key("version", version).skipping_lines_with(DO_NOT_REWRITE_MARKERS),
        );
    }

    if app.rewrite_new_tag && file_path.contains(KUSTOMIZATION_FILE) {
        rules.push(RewriteRule::yaml_key("newTag", version));
    }

    for key in &app.additional_rewrite_keys {
        rules.push(RewriteRule::yaml_key(key, version));
    }

    for prefix in &app.additional_rewrite_prefixes {
        rules.push(RewriteRule::prefix(prefix, version));
    }

    rules
}

/// Rewritten file contents plus every distinct value that was replaced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RewriteOutcome {
    pub files: BTreeMap<String, String>,
    pub old_values: BTreeSet<String>,
}

impl RewriteOutcome {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Applies `changes` to the files as they are on `reference`.
///
/// Each path is fetched once, the first time a change touches it. Only paths whose content
/// actually changed end up in the outcome. Missing files and rules that fail to compile are
/// logged and skipped; any other fetch error is returned.
pub async fn rewrite_files(
    host: &dyn GitHost,
    repo: &RepoRef,
    reference: &str,
    changes: &[Change],
) -> Result<RewriteOutcome, GitHostError> {
    let mut contents: HashMap<&str, Option<String>> = HashMap::new();
    let mut touched: HashSet<&str> = HashSet::new();
    let mut old_values = BTreeSet::new();

    for change in changes {
        let path = change.file_path.as_str();
        if !contents.contains_key(path) {
            let original = match host.get_file_content(repo, path, reference).await {
                Ok(content) => Some(content),
                Err(GitHostError::NotFound(_)) => {
                    log::warn!(
                        "{} does not exist on {} of {}, skipping",
                        path,
                        reference,
                        repo.full_name()
                    );
                    None
                }
                Err(e) => return Err(e),
            };
            contents.insert(path, original);
        }

        let Some(Some(current)) = contents.get_mut(path) else {
            continue;
        };

        match change.rule.apply(current) {
            Ok(applied) if applied.matched() && applied.content != *current => {
                log::debug!(
                    "{}: rule {} replaced {:?}",
                    path,
                    change.rule.name,
                    applied.old_values
                );
                *current = applied.content;
                old_values.extend(applied.old_values);
                touched.insert(path);
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "{}: rule {} has an invalid pattern {:?}: {}",
                    path,
                    change.rule.name,
                    change.rule.pattern,
                    e
                );
            }
        }
    }

    let files = contents
        .into_iter()
        .filter(|(path, _)| touched.contains(path))
        .filter_map(|(path, content)| content.map(|c| (path.to_string(), c)))
        .collect();

    Ok(RewriteOutcome { files, old_values })
}
