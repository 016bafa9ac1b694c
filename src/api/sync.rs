//! Sync ledger endpoints: audit entries for external synchronization
//! attempts and their retries.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{CreateSyncRecordRequest, SyncRecord, SyncStatus, UpdateSyncStatusRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::ApiResponse;
use super::validation::validate_required;

async fn fetch_record(state: &AppState, id: &str) -> Result<SyncRecord, ApiError> {
    sqlx::query_as::<_, SyncRecord>("SELECT * FROM sync_records WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Sync record not found"))
}

/// List all sync records
///
/// GET /api/sync
pub async fn list_sync_records(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SyncRecord>>>, ApiError> {
    let records = sqlx::query_as::<_, SyncRecord>(
        "SELECT * FROM sync_records ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::new("Success", records)))
}

/// Get a sync record by id
///
/// GET /api/sync/:id
pub async fn get_sync_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SyncRecord>>, ApiError> {
    let record = fetch_record(&state, &id).await?;
    Ok(Json(ApiResponse::new("Success", record)))
}

/// List sync records in a given state
///
/// GET /api/sync/status/:status
pub async fn get_sync_records_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> Result<Json<ApiResponse<Vec<SyncRecord>>>, ApiError> {
    let status: SyncStatus = status
        .parse()
        .map_err(|e: String| ApiError::validation_field("status", e))?;

    let records = sqlx::query_as::<_, SyncRecord>(
        "SELECT * FROM sync_records WHERE status = ? ORDER BY created_at DESC",
    )
    .bind(status.to_string())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::new("Success", records)))
}

/// Record a new synchronization attempt, starting as PENDING
///
/// POST /api/sync
pub async fn create_sync_record(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSyncRecordRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SyncRecord>>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&req.entity_type, "Entity type") {
        errors.add("entityType", e);
    }
    if let Err(e) = validate_required(&req.operation, "Operation") {
        errors.add("operation", e);
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO sync_records (id, entity_type, operation, status, sync_details, created_at)
        VALUES (?, ?, ?, 'PENDING', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.entity_type)
    .bind(&req.operation)
    .bind(&req.details)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let record = fetch_record(&state, &id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Sync record created", record)),
    ))
}

/// Overwrite the outcome of a synchronization attempt
///
/// PUT /api/sync/:id/status
pub async fn update_sync_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSyncStatusRequest>,
) -> Result<Json<ApiResponse<SyncRecord>>, ApiError> {
    fetch_record(&state, &id).await?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query("UPDATE sync_records SET status = ?, error_message = ?, synced_at = ? WHERE id = ?")
        .bind(req.status.to_string())
        .bind(&req.error_message)
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await?;

    let record = fetch_record(&state, &id).await?;
    Ok(Json(ApiResponse::new("Sync status updated", record)))
}

/// Queue a record for another attempt: back to PENDING with the error
/// cleared, whatever state it was in.
///
/// POST /api/sync/:id/retry
pub async fn retry_sync(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SyncRecord>>, ApiError> {
    fetch_record(&state, &id).await?;

    sqlx::query("UPDATE sync_records SET status = 'PENDING', error_message = NULL WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    let record = fetch_record(&state, &id).await?;

    tracing::info!(sync_id = %id, "Sync record queued for retry");

    Ok(Json(ApiResponse::new("Sync record queued for retry", record)))
}

/// Delete a sync record
///
/// DELETE /api/sync/:id
pub async fn delete_sync_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM sync_records WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Sync record not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;
    use crate::config::Config;
    use crate::db;

    async fn test_state() -> Arc<AppState> {
        let pool = db::test_pool().await;
        Arc::new(AppState::new(Config::default(), pool))
    }

    async fn create_record(state: &Arc<AppState>) -> SyncRecord {
        let (_, response) = create_sync_record(
            State(state.clone()),
            Json(CreateSyncRecordRequest {
                entity_type: "USER".to_string(),
                operation: "EXPORT".to_string(),
                details: Some("nightly export".to_string()),
            }),
        )
        .await
        .unwrap();
        response.0.data.unwrap()
    }

    #[tokio::test]
    async fn new_records_start_pending() {
        let state = test_state().await;
        let record = create_record(&state).await;
        assert_eq!(record.status, "PENDING");
        assert!(record.error_message.is_none());
        assert!(record.synced_at.is_none());
    }

    #[tokio::test]
    async fn status_update_stamps_synced_at() {
        let state = test_state().await;
        let record = create_record(&state).await;

        let response = update_sync_status(
            State(state),
            Path(record.id),
            Json(UpdateSyncStatusRequest {
                status: SyncStatus::Failed,
                error_message: Some("upstream timeout".to_string()),
            }),
        )
        .await
        .unwrap();

        let updated = response.0.data.unwrap();
        assert_eq!(updated.status, "FAILED");
        assert_eq!(updated.error_message.as_deref(), Some("upstream timeout"));
        assert!(updated.synced_at.is_some());
    }

    #[tokio::test]
    async fn retry_resets_any_status_to_pending() {
        let state = test_state().await;

        // Retry applies to FAILED and SUCCESS records alike
        for outcome in [SyncStatus::Failed, SyncStatus::Success] {
            let record = create_record(&state).await;
            update_sync_status(
                State(state.clone()),
                Path(record.id.clone()),
                Json(UpdateSyncStatusRequest {
                    status: outcome,
                    error_message: Some("boom".to_string()),
                }),
            )
            .await
            .unwrap();

            let response = retry_sync(State(state.clone()), Path(record.id))
                .await
                .unwrap();
            let retried = response.0.data.unwrap();
            assert_eq!(retried.status, "PENDING");
            assert!(retried.error_message.is_none());
        }
    }

    #[tokio::test]
    async fn retry_unknown_record_is_not_found() {
        let state = test_state().await;
        let err = retry_sync(State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn status_filter_rejects_unknown_states() {
        let state = test_state().await;
        let err = get_sync_records_by_status(State(state), Path("EXPLODED".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn status_filter_returns_matching_records() {
        let state = test_state().await;
        let record = create_record(&state).await;
        update_sync_status(
            State(state.clone()),
            Path(record.id),
            Json(UpdateSyncStatusRequest {
                status: SyncStatus::Success,
                error_message: None,
            }),
        )
        .await
        .unwrap();
        create_record(&state).await;

        let response = get_sync_records_by_status(State(state), Path("pending".to_string()))
            .await
            .unwrap();
        let records = response.0.data.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "PENDING");
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let state = test_state().await;
        let record = create_record(&state).await;

        let status = delete_sync_record(State(state.clone()), Path(record.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_sync_record(State(state), Path(record.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
