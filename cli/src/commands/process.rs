use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use flow_defs::{Credentials, FlowConfig};
use gitops::{
    CancellationToken, Flow, GitHost, GitHubClient, LogNotifier, Notifier, PullRequests,
    WebhookNotifier,
};
use serde_json::json;

pub async fn handle_process(config_path: &Path, image: &str, version: &str) -> Result<()> {
    let config = FlowConfig::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let credentials = Credentials::from_env()?;

    let host: Arc<dyn GitHost> = match &credentials.github_api_url {
        Some(url) => Arc::new(GitHubClient::with_api_url(&credentials.github_token, url)),
        None => Arc::new(GitHubClient::new(&credentials.github_token)),
    };
    let notifier: Arc<dyn Notifier> = match &credentials.slack_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url)),
        None => Arc::new(LogNotifier),
    };
    let flow = Flow::new(Arc::new(config), host, notifier);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, finishing the current manifest");
            on_signal.cancel();
        }
    });

    let pull_requests = flow
        .process_event_with_cancel(image, version, &cancel)
        .await?;

    println!("{}", summary(&pull_requests));
    if !pull_requests.all_succeeded() {
        bail!("Some manifests failed for {}:{}", image, version);
    }
    Ok(())
}

fn summary(pull_requests: &PullRequests) -> String {
    let results: Vec<_> = pull_requests
        .iter()
        .map(|pr| match &pr.outcome {
            Ok(published) => json!({
                "env": pr.env,
                "url": published.url,
                "warnings": published.warnings,
            }),
            Err(e) => json!({
                "env": pr.env,
                "error": e.to_string(),
            }),
        })
        .collect();
    let direct_commits: Vec<_> = pull_requests
        .direct_commits()
        .iter()
        .map(|commit| {
            json!({
                "env": commit.env,
                "branch": commit.branch,
                "sha": commit.sha,
            })
        })
        .collect();

    json!({
        "pullRequests": results,
        "directCommits": direct_commits,
    })
    .to_string()
}
