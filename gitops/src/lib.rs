mod commit;
#[cfg(test)]
mod fake;
mod filter;
mod flow;
mod github;
mod host;
mod notify;
mod outcome;
mod pull_request;
mod release;
mod rewrite;

pub use commit::{commit_release, commit_release_with_retry, CommitOutcome};
pub use filter::should_process;
pub use flow::Flow;
pub use github::{GitHubClient, GITHUB_API_URL};
pub use host::GitHost;
pub use notify::{build_notification, format_message, LogNotifier, Notifier, WebhookNotifier};
pub use outcome::{DirectCommit, PullRequest, PullRequests};
pub use pull_request::{publish_pull_request, PublishedPullRequest};
pub use release::{base_branch, branch_name, commit_message, labels, Release};
pub use rewrite::{rewrite_files, rules_for_file, Change, RewriteOutcome, RewriteRule};

pub use tokio_util::sync::CancellationToken;
