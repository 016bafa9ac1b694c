//! Course completion certificate models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: String,
    /// Display identifier printed on the certificate, globally unique.
    pub certificate_id: String,
    pub user_id: String,
    pub course_id: String,
    pub issued_at: String,
    pub valid_until: String,
    pub download_url: String,
    pub verified: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCertificateRequest {
    pub user_id: String,
    pub course_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyCertificateResponse {
    pub valid: bool,
    pub certificate: Option<Certificate>,
}
