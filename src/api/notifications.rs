//! Notification endpoints: direct messages, audience campaigns,
//! read tracking and aggregate statistics.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    MarkReadRequest, Notification, NotificationStatistics, NotificationStatus,
    SendNotificationRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::ApiResponse;
use super::validation::validate_required;

async fn fetch_notification(state: &AppState, id: &str) -> Result<Notification, ApiError> {
    sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))
}

fn validate_request(req: &SendNotificationRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&req.title, "Title") {
        errors.add("title", e);
    }
    if let Err(e) = validate_required(&req.message, "Message") {
        errors.add("message", e);
    }
    if req.user_id.is_none() && req.target_audience.is_none() {
        errors.add("userId", "Either a recipient or a target audience is required");
    }
    errors.finish()
}

/// Verify the sender exists in the user directory
async fn check_sender(state: &AppState, sender_id: &str) -> Result<(), ApiError> {
    let sender: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(sender_id)
        .fetch_optional(&state.db)
        .await?;
    if sender.is_none() {
        return Err(ApiError::not_found("Sender not found"));
    }
    Ok(())
}

async fn insert_notification(
    state: &AppState,
    req: &SendNotificationRequest,
    status: NotificationStatus,
) -> Result<Notification, ApiError> {
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let (sent_at, sent_count) = match status {
        NotificationStatus::Sent => (Some(now.clone()), 1),
        NotificationStatus::Draft => (None, 0),
    };

    sqlx::query(
        r#"
        INSERT INTO notifications
            (id, sender_id, user_id, target_audience, title, message, notification_type,
             status, created_at, sent_at, read, read_at, sent_count, opened_count)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, 0)
        "#,
    )
    .bind(&id)
    .bind(&req.sender_id)
    .bind(&req.user_id)
    .bind(&req.target_audience)
    .bind(&req.title)
    .bind(&req.message)
    .bind(&req.notification_type)
    .bind(status.to_string())
    .bind(&now)
    .bind(&sent_at)
    .bind(sent_count)
    .execute(&state.db)
    .await?;

    fetch_notification(state, &id).await
}

// -------------------------------------------------------------------------
// Creation and delivery
// -------------------------------------------------------------------------

/// Create and immediately send a notification
///
/// POST /notifications/send
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendNotificationRequest>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    validate_request(&req)?;
    check_sender(&state, &req.sender_id).await?;

    let notification = insert_notification(&state, &req, NotificationStatus::Sent).await?;

    tracing::info!(
        notification_id = %notification.id,
        notification_type = %notification.notification_type,
        "Notification sent"
    );

    Ok(Json(ApiResponse::new(
        "Notification sent successfully",
        notification,
    )))
}

/// Create a draft without sending it
///
/// POST /notifications
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Notification>>), ApiError> {
    validate_request(&req)?;
    check_sender(&state, &req.sender_id).await?;

    let notification = insert_notification(&state, &req, NotificationStatus::Draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Notification created", notification)),
    ))
}

/// Re-deliver a notification to its existing recipient set. Stamps a new
/// sent_at and bumps sent_count; drafts become SENT.
///
/// POST /notifications/:id/resend
pub async fn resend_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    fetch_notification(&state, &id).await?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "UPDATE notifications SET status = 'SENT', sent_at = ?, sent_count = sent_count + 1 WHERE id = ?",
    )
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let notification = fetch_notification(&state, &id).await?;
    Ok(Json(ApiResponse::new(
        "Notification resent",
        notification,
    )))
}

/// Delete a notification
///
/// DELETE /notifications/:id
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Notification not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// -------------------------------------------------------------------------
// Inbox and read tracking
// -------------------------------------------------------------------------

/// List campaigns: notifications broadcast to a target audience
///
/// GET /notifications/campaigns
pub async fn get_campaigns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let campaigns = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE target_audience IS NOT NULL ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::new("Campaigns retrieved", campaigns)))
}

/// A user's inbox
///
/// GET /notifications/user/:user_id
pub async fn get_user_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::new("Success", notifications)))
}

/// A user's unread notifications
///
/// GET /notifications/user/:user_id/unread
pub async fn get_unread_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? AND read = 0 ORDER BY created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::new("Success", notifications)))
}

/// Mark a notification read. Only the addressed recipient's call flips
/// the read state; every matching call increments opened_count.
///
/// POST /notifications/:id/read
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = fetch_notification(&state, &id).await?;

    if notification.user_id.as_deref() == Some(req.user_id.as_str()) {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE notifications SET read = 1, read_at = ?, opened_count = opened_count + 1 WHERE id = ?",
        )
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await?;
    }

    let notification = fetch_notification(&state, &id).await?;
    Ok(Json(ApiResponse::new(
        "Notification marked as read",
        notification,
    )))
}

/// Bulk-mark a user's unread set as read
///
/// POST /notifications/user/:user_id/read-all
pub async fn mark_all_as_read(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE notifications SET read = 1, read_at = ? WHERE user_id = ? AND read = 0",
    )
    .bind(&now)
    .bind(&user_id)
    .execute(&state.db)
    .await?;

    tracing::debug!(user_id = %user_id, updated = result.rows_affected(), "Marked all as read");

    Ok(Json(ApiResponse::message("All notifications marked as read")))
}

// -------------------------------------------------------------------------
// Statistics
// -------------------------------------------------------------------------

/// Audience bucket for direct (single-recipient) notifications.
const DIRECT_AUDIENCE: &str = "DIRECT";

/// Fold the full notification set into aggregate statistics. Recomputed
/// from a full scan on each call; the set is small.
fn fold_statistics(notifications: &[Notification]) -> NotificationStatistics {
    let mut stats = NotificationStatistics {
        total: notifications.len() as i64,
        ..Default::default()
    };

    for n in notifications {
        if n.status == NotificationStatus::Sent.to_string() {
            stats.sent += 1;
        }
        if n.read != 0 {
            stats.opened += 1;
        }

        *stats
            .by_type
            .entry(n.notification_type.clone())
            .or_insert(0) += 1;

        let audience = n
            .target_audience
            .clone()
            .unwrap_or_else(|| DIRECT_AUDIENCE.to_string());
        *stats.by_audience.entry(audience).or_insert(0) += 1;
    }

    stats
}

/// Aggregate statistics over all notifications
///
/// GET /notifications/statistics
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<NotificationStatistics>>, ApiError> {
    let notifications = sqlx::query_as::<_, Notification>("SELECT * FROM notifications")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        "Statistics retrieved",
        fold_statistics(&notifications),
    )))
}
