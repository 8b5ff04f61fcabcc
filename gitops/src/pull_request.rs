use flow_defs::{FlowError, GitHostError, NewPullRequest, PullRequestRef};

use crate::release::Release;
use crate::GitHost;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPullRequest {
    pub number: u64,
    pub url: String,
    /// Non-fatal problems, e.g. labels that could not be attached.
    pub warnings: Vec<String>,
}

fn already_exists(error: &GitHostError) -> bool {
    matches!(
        error,
        GitHostError::Http { status: 422, message, .. } if message.contains("already exists")
    )
}

async fn open_or_reuse(
    host: &dyn GitHost,
    release: &Release,
    new_pull_request: &NewPullRequest,
) -> Result<PullRequestRef, GitHostError> {
    let error = match host.create_pull_request(&release.repo, new_pull_request).await {
        Ok(created) => {
            log::info!(
                "Opened pull request #{} for {}: {}",
                created.number,
                release.env,
                created.html_url
            );
            return Ok(created);
        }
        Err(e) if already_exists(&e) => e,
        Err(e) => return Err(e),
    };

    // A rerun of the same event pushed onto a branch that already has its pull request.
    match host
        .find_pull_request(&release.repo, &release.commit_branch, &release.base_branch)
        .await?
    {
        Some(existing) => {
            log::info!(
                "Pull request #{} for {} is already open: {}",
                existing.number,
                release.env,
                existing.html_url
            );
            Ok(existing)
        }
        None => Err(error),
    }
}

/// Opens a pull request from the release's commit branch into its base branch and labels it.
/// An already open pull request for the same branches is reused.
pub async fn publish_pull_request(
    host: &dyn GitHost,
    release: &Release,
    body: String,
) -> Result<PublishedPullRequest, FlowError> {
    let new_pull_request = NewPullRequest {
        title: release.message.clone(),
        head: release.commit_branch.clone(),
        base: release.base_branch.clone(),
        body,
        maintainer_can_modify: true,
    };

    let created = open_or_reuse(host, release, &new_pull_request)
        .await
        .map_err(FlowError::PullRequest)?;

    let mut warnings = Vec::new();
    if !release.labels.is_empty() {
        if let Err(e) = host
            .add_labels(&release.repo, created.number, &release.labels)
            .await
        {
            log::warn!("Error adding labels to #{}: {}", created.number, e);
            warnings.push(format!("Failed to add labels: {}", e));
        }
    }

    Ok(PublishedPullRequest {
        number: created.number,
        url: created.html_url,
        warnings,
    })
}
