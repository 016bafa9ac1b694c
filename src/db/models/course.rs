//! Course catalog and enrollment models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Course row as stored. The `modules` column holds a JSON array of
/// module titles in display order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub duration_hours: i64,
    pub modules: String,
    pub published: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub duration_hours: i64,
    pub modules: Vec<String>,
    pub published: bool,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        let modules = serde_json::from_str(&course.modules).unwrap_or_default();
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            category: course.category,
            difficulty: course.difficulty,
            duration_hours: course.duration_hours,
            modules,
            published: course.published != 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub enrolled_at: String,
    pub progress: f64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub user_id: String,
    pub course_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    pub enrollment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub enrollment_id: String,
    pub progress: f64,
}

/// Enrollment row joined with its course metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentWithCourse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub enrolled_at: String,
    pub progress: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseResponse>,
}
