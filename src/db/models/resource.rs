//! Resource library models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub resource_type: String,
    pub file_url: String,
    pub category: String,
    pub audience: String,
    pub views: i64,
    pub downloads: i64,
    pub uploaded_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResourceRequest {
    pub title: String,
    pub description: String,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default = "default_file_url")]
    pub file_url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_resource_type() -> String {
    "PDF".to_string()
}

fn default_file_url() -> String {
    "/resources/default.pdf".to_string()
}

fn default_category() -> String {
    "VAT".to_string()
}

fn default_audience() -> String {
    "ALL".to_string()
}

/// Query parameters for resource search
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResourceSearchQuery {
    pub query: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub download_url: String,
}
