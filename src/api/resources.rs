//! Resource library endpoints: search, access counters, uploads.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DownloadResponse, Resource, ResourceSearchQuery, UploadResourceRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::response::ApiResponse;
use super::validation::validate_required;

/// List all resources
///
/// GET /api/resources
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Resource>>>, ApiError> {
    let resources =
        sqlx::query_as::<_, Resource>("SELECT * FROM resources ORDER BY uploaded_at DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(ApiResponse::new("Success", resources)))
}

/// Search by substring and/or category. Both filters are optional and
/// combine with AND semantics; the substring match is case-insensitive
/// over title and description, the category match is exact.
///
/// GET /api/resources/search?query&category
pub async fn search_resources(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResourceSearchQuery>,
) -> Result<Json<ApiResponse<Vec<Resource>>>, ApiError> {
    let resources =
        sqlx::query_as::<_, Resource>("SELECT * FROM resources ORDER BY uploaded_at DESC")
            .fetch_all(&state.db)
            .await?;

    let results = filter_resources(resources, &params);
    Ok(Json(ApiResponse::new("Success", results)))
}

fn filter_resources(resources: Vec<Resource>, params: &ResourceSearchQuery) -> Vec<Resource> {
    let needle = params
        .query
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);
    let category = params.category.as_deref().filter(|c| !c.is_empty());

    resources
        .into_iter()
        .filter(|r| {
            let text_match = needle.as_deref().map_or(true, |q| {
                r.title.to_lowercase().contains(q) || r.description.to_lowercase().contains(q)
            });
            let category_match = category.map_or(true, |c| r.category == c);
            text_match && category_match
        })
        .collect()
}

/// Fetch a single resource, counting the view
///
/// GET /api/resources/:id
pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Resource>>, ApiError> {
    let result = sqlx::query("UPDATE resources SET views = views + 1 WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Resource not found"));
    }

    let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(ApiResponse::new("Success", resource)))
}

/// Count a download and hand back the stored file URL
///
/// POST /api/resources/:id/download
pub async fn download_resource(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DownloadResponse>>, ApiError> {
    let result = sqlx::query("UPDATE resources SET downloads = downloads + 1 WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Resource not found"));
    }

    let (file_url,): (String,) = sqlx::query_as("SELECT file_url FROM resources WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        "Download started",
        DownloadResponse {
            download_url: file_url,
        },
    )))
}

/// Upload a new resource with zeroed counters
///
/// POST /api/resources/upload
pub async fn upload_resource(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadResourceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&req.title, "Title") {
        errors.add("title", e);
    }
    if let Err(e) = validate_required(&req.description, "Description") {
        errors.add("description", e);
    }
    errors.finish()?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO resources
            (id, title, description, resource_type, file_url, category, audience, views, downloads, uploaded_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.resource_type)
    .bind(&req.file_url)
    .bind(&req.category)
    .bind(&req.audience)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(title = %resource.title, "Resource uploaded");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Resource uploaded successfully", resource)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;
    use crate::config::Config;
    use crate::db;

    async fn test_state() -> Arc<AppState> {
        let pool = db::test_pool().await;
        db::seed_catalog(&pool).await.unwrap();
        Arc::new(AppState::new(Config::default(), pool))
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_title_and_description() {
        let state = test_state().await;

        let response = search_resources(
            State(state),
            Query(ResourceSearchQuery {
                query: Some("vat".to_string()),
                category: None,
            }),
        )
        .await
        .unwrap();

        let results = response.0.data.unwrap();
        assert!(!results.is_empty());
        for r in &results {
            let haystack = format!("{} {}", r.title, r.description).to_lowercase();
            assert!(haystack.contains("vat"));
        }
    }

    #[tokio::test]
    async fn search_combines_query_and_category() {
        let state = test_state().await;

        // "tax" matches both seeds; the category narrows to one
        let response = search_resources(
            State(state),
            Query(ResourceSearchQuery {
                query: Some("tax".to_string()),
                category: Some("INCOME_TAX".to_string()),
            }),
        )
        .await
        .unwrap();

        let results = response.0.data.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "tax-filing-tutorial");
    }

    #[tokio::test]
    async fn empty_filters_return_everything() {
        let state = test_state().await;
        let response = search_resources(State(state), Query(ResourceSearchQuery::default()))
            .await
            .unwrap();
        assert_eq!(response.0.data.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn download_increments_counter_and_returns_url() {
        let state = test_state().await;

        let response = download_resource(State(state.clone()), Path("vat-handbook".to_string()))
            .await
            .unwrap();
        assert_eq!(
            response.0.data.unwrap().download_url,
            "/resources/vat-handbook.pdf"
        );

        let (downloads,): (i64,) =
            sqlx::query_as("SELECT downloads FROM resources WHERE id = 'vat-handbook'")
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(downloads, 891);
    }

    #[tokio::test]
    async fn download_unknown_resource_is_not_found() {
        let state = test_state().await;
        let err = download_resource(State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn viewing_a_resource_counts_views() {
        let state = test_state().await;
        let response = get_resource(State(state), Path("tax-filing-tutorial".to_string()))
            .await
            .unwrap();
        assert_eq!(response.0.data.unwrap().views, 3201);
    }

    #[tokio::test]
    async fn upload_starts_with_zero_counters() {
        let state = test_state().await;

        let (status, response) = upload_resource(
            State(state),
            Json(UploadResourceRequest {
                title: "Corporate Tax FAQ".to_string(),
                description: "Frequently asked questions on corporate tax.".to_string(),
                resource_type: "PDF".to_string(),
                file_url: "/resources/corp-faq.pdf".to_string(),
                category: "CORPORATE".to_string(),
                audience: "BUSINESS".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let resource = response.0.data.unwrap();
        assert_eq!(resource.views, 0);
        assert_eq!(resource.downloads, 0);
    }

    #[tokio::test]
    async fn upload_requires_title() {
        let state = test_state().await;
        let err = upload_resource(
            State(state),
            Json(UploadResourceRequest {
                title: "  ".to_string(),
                description: "desc".to_string(),
                resource_type: "PDF".to_string(),
                file_url: "/resources/x.pdf".to_string(),
                category: "VAT".to_string(),
                audience: "ALL".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
}
