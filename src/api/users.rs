//! User directory endpoints: profiles and activation status.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{UpdateStatusRequest, UpdateUserRequest, User, UserResponse};
use crate::AppState;

use super::error::ApiError;
use super::response::ApiResponse;
use super::validation::validate_email;

async fn fetch_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// List all users
///
/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    let responses: Vec<UserResponse> = users.into_iter().map(|u| u.into()).collect();
    Ok(Json(ApiResponse::new("Users retrieved", responses)))
}

/// Get a user by id
///
/// GET /users/:user_id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = fetch_user(&state, &user_id).await?;
    Ok(Json(ApiResponse::new("User found", user.into())))
}

/// Update profile fields; absent fields are left untouched
///
/// PUT /users/:user_id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let existing = fetch_user(&state, &user_id).await?;

    if let Some(ref email) = req.email {
        if let Err(e) = validate_email(email) {
            return Err(ApiError::validation_field("email", e));
        }
    }

    let full_name = req.full_name.unwrap_or(existing.full_name);
    let email = req.email.unwrap_or(existing.email);
    let tax_number = req.tax_number.or(existing.tax_number);
    let company_name = req.company_name.or(existing.company_name);

    sqlx::query(
        "UPDATE users SET full_name = ?, email = ?, tax_number = ?, company_name = ? WHERE id = ?",
    )
    .bind(&full_name)
    .bind(&email)
    .bind(&tax_number)
    .bind(&company_name)
    .bind(&user_id)
    .execute(&state.db)
    .await?;

    let user = fetch_user(&state, &user_id).await?;
    Ok(Json(ApiResponse::new("User updated", user.into())))
}

/// Toggle the active flag; users are never hard-deleted
///
/// PATCH /users/:user_id/status
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let active = req
        .active
        .ok_or_else(|| ApiError::bad_request("Active status is required"))?;

    let result = sqlx::query("UPDATE users SET active = ? WHERE id = ?")
        .bind(if active { 1 } else { 0 })
        .bind(&user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    let user = fetch_user(&state, &user_id).await?;
    Ok(Json(ApiResponse::new("User status updated", user.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth;
    use crate::api::error::ErrorCode;
    use crate::config::Config;
    use crate::db;

    async fn test_state_with_user(username: &str) -> (Arc<AppState>, String) {
        let pool = db::test_pool().await;
        auth::ensure_admin_user(&pool, username, "initial-password")
            .await
            .unwrap();
        let (id,): (String,) = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&pool)
            .await
            .unwrap();
        (Arc::new(AppState::new(Config::default(), pool)), id)
    }

    #[tokio::test]
    async fn get_unknown_user_is_not_found() {
        let (state, _) = test_state_with_user("clerk").await;
        let err = get_user(State(state), Path("no-such-id".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let (state, id) = test_state_with_user("clerk").await;

        let response = update_user(
            State(state.clone()),
            Path(id.clone()),
            Json(UpdateUserRequest {
                full_name: Some("Senior Clerk".to_string()),
                email: None,
                tax_number: Some("TIN-9999".to_string()),
                company_name: None,
            }),
        )
        .await
        .unwrap();

        let user = response.0.data.unwrap();
        assert_eq!(user.full_name, "Senior Clerk");
        assert_eq!(user.email, "admin@taxlearn.local");
        assert_eq!(user.tax_number.as_deref(), Some("TIN-9999"));
    }

    #[tokio::test]
    async fn status_requires_active_flag() {
        let (state, id) = test_state_with_user("clerk").await;

        let err = update_user_status(
            State(state.clone()),
            Path(id.clone()),
            Json(UpdateStatusRequest { active: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);

        let response = update_user_status(
            State(state),
            Path(id),
            Json(UpdateStatusRequest {
                active: Some(false),
            }),
        )
        .await
        .unwrap();
        assert!(!response.0.data.unwrap().active);
    }

    #[tokio::test]
    async fn listing_omits_password_hashes() {
        let (state, _) = test_state_with_user("clerk").await;
        let response = list_users(State(state)).await.unwrap();
        let json = serde_json::to_value(&response.0).unwrap();
        for user in json["data"].as_array().unwrap() {
            assert!(user.get("passwordHash").is_none());
            assert!(user.get("password_hash").is_none());
        }
    }
}
