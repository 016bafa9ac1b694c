//! Course catalog and enrollment endpoints.
//!
//! The catalog itself is seeded at startup and has no mutation path;
//! only enrollments and their progress change at runtime.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    Course, CourseResponse, EnrollRequest, EnrollResponse, Enrollment, EnrollmentWithCourse,
    UpdateProgressRequest,
};
use crate::AppState;

use super::error::ApiError;
use super::response::ApiResponse;
use super::validation::validate_progress;

/// List the course catalog
///
/// GET /api/courses
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CourseResponse>>>, ApiError> {
    let courses = sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY title")
        .fetch_all(&state.db)
        .await?;

    let responses: Vec<CourseResponse> = courses.into_iter().map(|c| c.into()).collect();
    Ok(Json(ApiResponse::new("Success", responses)))
}

/// Get a course by id
///
/// GET /api/courses/:id
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CourseResponse>>, ApiError> {
    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    Ok(Json(ApiResponse::new("Success", course.into())))
}

/// Enroll a user in a course. Every call creates a fresh enrollment row;
/// re-enrolling is not rejected.
///
/// POST /api/courses/enroll
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EnrollResponse>>), ApiError> {
    let course: Option<(String,)> = sqlx::query_as("SELECT id FROM courses WHERE id = ?")
        .bind(&req.course_id)
        .fetch_optional(&state.db)
        .await?;
    if course.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO enrollments (id, user_id, course_id, enrolled_at, progress, status)
        VALUES (?, ?, ?, ?, 0.0, 'ENROLLED')
        "#,
    )
    .bind(&id)
    .bind(&req.user_id)
    .bind(&req.course_id)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(user_id = %req.user_id, course_id = %req.course_id, "User enrolled");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Successfully enrolled in course",
            EnrollResponse { enrollment_id: id },
        )),
    ))
}

/// Persist a progress update against its enrollment
///
/// PUT /api/courses/progress
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<ApiResponse<Enrollment>>, ApiError> {
    if let Err(e) = validate_progress(req.progress) {
        return Err(ApiError::validation_field("progress", e));
    }

    let result = sqlx::query("UPDATE enrollments SET progress = ? WHERE id = ?")
        .bind(req.progress)
        .bind(&req.enrollment_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Enrollment not found"));
    }

    let enrollment = sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = ?")
        .bind(&req.enrollment_id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(ApiResponse::new("Progress updated", enrollment)))
}

/// List a user's enrollments with the course metadata joined in
///
/// GET /api/courses/enrollments/:user_id
pub async fn get_user_enrollments(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<EnrollmentWithCourse>>>, ApiError> {
    let enrollments = sqlx::query_as::<_, Enrollment>(
        "SELECT * FROM enrollments WHERE user_id = ? ORDER BY enrolled_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    let mut responses = Vec::new();
    for enrollment in enrollments {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
            .bind(&enrollment.course_id)
            .fetch_optional(&state.db)
            .await?;

        responses.push(EnrollmentWithCourse {
            id: enrollment.id,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            enrolled_at: enrollment.enrolled_at,
            progress: enrollment.progress,
            status: enrollment.status,
            course: course.map(|c| c.into()),
        });
    }

    Ok(Json(ApiResponse::new("Success", responses)))
}
