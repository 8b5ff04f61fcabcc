use serde::{Deserialize, Serialize};

/// Status of one processed event, handed to the notifier.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ReleaseNotification {
    pub app_name: String,
    pub image: String,
    pub version: String,
    pub is_success: bool,
    pub details: String, // One block per environment
}
