use std::sync::Arc;

use flow_defs::{Application, FlowConfig, FlowError, Manifest};
use flow_utils::RetryPolicy;
use tokio_util::sync::CancellationToken;

use crate::commit::commit_release_with_retry;
use crate::filter::should_process;
use crate::notify::{build_notification, Notifier};
use crate::outcome::{DirectCommit, PullRequests};
use crate::pull_request::publish_pull_request;
use crate::release::Release;
use crate::GitHost;

/// Turns `(image, version)` events into manifest commits and pull requests.
///
/// Holds no per-event state, so one `Flow` can serve concurrent events.
pub struct Flow {
    config: Arc<FlowConfig>,
    host: Arc<dyn GitHost>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
}

impl Flow {
    pub fn new(
        config: Arc<FlowConfig>,
        host: Arc<dyn GitHost>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let retry = RetryPolicy::new(config.retry.attempts, config.retry.delay());
        Flow {
            config,
            host,
            notifier,
            retry,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Processes one event and sends its notification.
    ///
    /// A failed notification is logged; the results are still returned.
    pub async fn process_event(
        &self,
        image: &str,
        version: &str,
    ) -> Result<PullRequests, FlowError> {
        self.process_event_with_cancel(image, version, &CancellationToken::new())
            .await
    }

    /// Like `process_event`; once `cancel` fires, remaining manifests are reported as cancelled.
    /// Commits and pull requests that already exist are left in place.
    pub async fn process_event_with_cancel(
        &self,
        image: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> Result<PullRequests, FlowError> {
        let app = self.config.application_by_image(image)?;
        log::info!("Processing {}:{} for application {}", image, version, app.name);

        let pull_requests = self.process(app, version, cancel).await;
        if pull_requests.is_noop() {
            log::info!(
                "No manifest of {} takes version {}, nothing to notify",
                app.name,
                version
            );
            return Ok(pull_requests);
        }

        let notification = build_notification(app, image, version, &pull_requests);
        if let Err(e) = self.notifier.notify(&notification).await {
            log::error!("Error notifying about {}:{}: {}", image, version, e);
        }
        Ok(pull_requests)
    }

    /// Runs every manifest of `app` in order; a failing manifest does not stop the others.
    pub async fn process(
        &self,
        app: &Application,
        version: &str,
        cancel: &CancellationToken,
    ) -> PullRequests {
        let mut pull_requests = PullRequests::new();

        for manifest in &app.manifests {
            if !should_process(manifest, version) {
                log::debug!("Skipping {} of {} for version {}", manifest.env, app.name, version);
                continue;
            }
            if cancel.is_cancelled() {
                log::warn!("Cancelled before {} of {}", manifest.env, app.name);
                pull_requests.push_failed(&manifest.env, FlowError::Cancelled);
                continue;
            }
            self.process_manifest(app, manifest, version, &mut pull_requests)
                .await;
        }

        pull_requests
    }

    async fn process_manifest(
        &self,
        app: &Application,
        manifest: &Manifest,
        version: &str,
        pull_requests: &mut PullRequests,
    ) {
        let release = Release::new(&self.config, app, manifest, version);
        let host = self.host.as_ref();

        let committed = match commit_release_with_retry(host, &release, &self.retry).await {
            Ok(committed) => committed,
            Err(e) => {
                log::error!("Error committing {} of {}: {}", manifest.env, app.name, e);
                pull_requests.push_failed(&manifest.env, e);
                return;
            }
        };

        if release.commit_without_pr {
            log::info!(
                "Committed {} directly to {} ({})",
                manifest.env,
                committed.branch,
                committed.sha
            );
            pull_requests.push_direct_commit(DirectCommit {
                env: manifest.env.clone(),
                branch: committed.branch,
                sha: committed.sha,
            });
            return;
        }

        let body = release.body(&committed.previous_versions);
        match publish_pull_request(host, &release, body).await {
            Ok(published) => pull_requests.push_opened(&manifest.env, published),
            Err(e) => {
                log::error!("Error submitting PR for {} of {}: {}", manifest.env, app.name, e);
                pull_requests.push_failed(&manifest.env, e);
            }
        }
    }
}
