use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Application, FlowError};

pub const DEFAULT_BASE_BRANCH: &str = "master";
pub const DEFAULT_BRANCH_PREFIX: &str = "release";
pub const DEFAULT_MESSAGE_VERB: &str = "Release";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 3;

/// Process-wide configuration: the application catalog plus global defaults.
/// Built once at startup and shared read-only afterwards.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowConfig {
    pub git_author: GitAuthor,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub applications: Vec<Application>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct GitAuthor {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    #[serde(default = "default_message_verb")]
    pub message_verb: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            base_branch: None,
            branch_prefix: default_branch_prefix(),
            message_verb: default_message_verb(),
        }
    }
}

fn default_branch_prefix() -> String {
    DEFAULT_BRANCH_PREFIX.to_string()
}

fn default_message_verb() -> String {
    DEFAULT_MESSAGE_VERB.to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

impl FlowConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FlowError> {
        let config: FlowConfig =
            serde_yaml::from_str(yaml).map_err(|e| FlowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| FlowError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        let mut images = HashSet::new();
        for app in &self.applications {
            if app.image.is_empty() {
                return Err(FlowError::Config(format!(
                    "application {} has an empty image",
                    app.name
                )));
            }
            if !images.insert(app.image.as_str()) {
                return Err(FlowError::Config(format!(
                    "image {} is configured by more than one application",
                    app.image
                )));
            }
            for manifest in &app.manifests {
                if manifest.env.is_empty() {
                    return Err(FlowError::Config(format!(
                        "application {} has a manifest without env",
                        app.name
                    )));
                }
                if manifest.files.is_empty() {
                    return Err(FlowError::Config(format!(
                        "manifest {} of application {} has no files",
                        manifest.env, app.name
                    )));
                }
            }
        }
        if self.retry.attempts == 0 {
            return Err(FlowError::Config("retry.attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn application_by_image(&self, image: &str) -> Result<&Application, FlowError> {
        self.applications
            .iter()
            .find(|app| app.image == image)
            .ok_or_else(|| FlowError::ApplicationNotFound(image.to_string()))
    }
}

/// Secrets and endpoints read from the process environment.
#[derive(Clone)]
pub struct Credentials {
    pub github_token: String,
    pub github_api_url: Option<String>,
    pub slack_webhook_url: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Result<Self, FlowError> {
        let github_token = env::var("FLOW_GITHUB_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                FlowError::Config("FLOW_GITHUB_TOKEN environment variable not set".into())
            })?;
        Ok(Credentials {
            github_token,
            github_api_url: non_empty_var("FLOW_GITHUB_API_URL"),
            slack_webhook_url: non_empty_var("FLOW_SLACK_WEBHOOK_URL"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
