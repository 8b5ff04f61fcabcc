use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitHostError {
    #[error("{0} was not found")]
    NotFound(String),

    #[error("Request to {url} failed with status {status}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Could not reach the git host: {0}")]
    Transport(String),

    #[error("Unexpected response from the git host: {0}")]
    Decode(String),
}

/// Where in the commit sequence a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStage {
    RefResolving,
    ContentFetching,
    TreeBuilding,
    CommitCreating,
    RefUpdating,
}

impl fmt::Display for CommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            CommitStage::RefResolving => "resolving ref",
            CommitStage::ContentFetching => "fetching content",
            CommitStage::TreeBuilding => "building tree",
            CommitStage::CommitCreating => "creating commit",
            CommitStage::RefUpdating => "updating ref",
        };
        f.write_str(stage)
    }
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("No application found for image {0}")]
    ApplicationNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No manifest file matched any rewrite rule on {branch}")]
    NoChanges { branch: String },

    #[error("Commit failed while {stage}: {source}")]
    Commit {
        stage: CommitStage,
        #[source]
        source: GitHostError,
    },

    #[error("Failed to open pull request: {0}")]
    PullRequest(#[source] GitHostError),

    #[error("Failed to send notification: {0}")]
    Notification(String),

    #[error("Processing was cancelled")]
    Cancelled,
}

impl FlowError {
    pub fn commit(stage: CommitStage, source: GitHostError) -> Self {
        FlowError::Commit { stage, source }
    }
}
