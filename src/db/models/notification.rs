//! Notification models: direct messages, audience campaigns and
//! aggregate statistics.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// Notification delivery states. The transition is monotonic:
/// a SENT notification never goes back to DRAFT.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Draft,
    Sent,
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::Sent => write!(f, "SENT"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub sender_id: String,
    /// Recipient for direct notifications; None for campaigns.
    pub user_id: Option<String>,
    /// Audience for campaigns; None for direct notifications.
    pub target_audience: Option<String>,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub status: String,
    pub created_at: String,
    pub sent_at: Option<String>,
    pub read: i64,
    pub read_at: Option<String>,
    pub sent_count: i64,
    pub opened_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub sender_id: String,
    pub user_id: Option<String>,
    pub target_audience: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(default = "default_notification_type")]
    pub notification_type: String,
}

fn default_notification_type() -> String {
    "GENERAL".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub user_id: String,
}

/// Aggregate statistics folded from the full notification set.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatistics {
    pub total: i64,
    pub sent: i64,
    pub opened: i64,
    pub by_type: HashMap<String, i64>,
    pub by_audience: HashMap<String, i64>,
}
