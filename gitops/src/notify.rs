use async_trait::async_trait;
use flow_defs::{Application, FlowError, ReleaseNotification};
use reqwest::Client;
use serde_json::json;

use crate::outcome::PullRequests;

/// Delivers the per-event status message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &ReleaseNotification) -> Result<(), FlowError>;
}

pub fn build_notification(
    app: &Application,
    image: &str,
    version: &str,
    pull_requests: &PullRequests,
) -> ReleaseNotification {
    ReleaseNotification {
        app_name: app.name.clone(),
        image: image.to_string(),
        version: version.to_string(),
        is_success: pull_requests.all_succeeded(),
        details: pull_requests.format_details(),
    }
}

pub fn format_message(notification: &ReleaseNotification) -> String {
    let status = if notification.is_success {
        ":white_check_mark:"
    } else {
        ":warning:"
    };
    format!(
        "{} *{}* `{}:{}`\n{}",
        status,
        notification.app_name,
        notification.image,
        notification.version,
        notification.details
    )
}

/// Writes the notification to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &ReleaseNotification) -> Result<(), FlowError> {
        if notification.is_success {
            log::info!("{}", format_message(notification));
        } else {
            log::warn!("{}", format_message(notification));
        }
        Ok(())
    }
}

/// Posts `{"text": ...}` to a Slack-compatible incoming webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        WebhookNotifier {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &ReleaseNotification) -> Result<(), FlowError> {
        let payload = json!({
            "text": format_message(notification),
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FlowError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FlowError::Notification(format!(
                "webhook responded with {}",
                response.status()
            )));
        }
        log::debug!("Notification sent for {}", notification.app_name);
        Ok(())
    }
}
