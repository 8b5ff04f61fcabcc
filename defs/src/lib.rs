mod application;
mod config;
mod errors;
mod gitprovider;
mod notification;

pub use application::{Application, Filters, Manifest};
pub use config::{
    Credentials, Defaults, FlowConfig, GitAuthor, RetryConfig, DEFAULT_BASE_BRANCH,
    DEFAULT_BRANCH_PREFIX, DEFAULT_MESSAGE_VERB, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY_SECONDS,
};
pub use errors::{CommitStage, FlowError, GitHostError};
pub use gitprovider::{
    CommitAuthor, GitCommit, GitObject, GitRef, GitTree, NewCommit, NewPullRequest, NewTree,
    PullRequestRef, RepoRef, ShaRef, TreeEntry, BLOB_MODE,
};
pub use notification::ReleaseNotification;
