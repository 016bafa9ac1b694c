//! Certificate issuing and verification endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Certificate, GenerateCertificateRequest, VerifyCertificateResponse};
use crate::AppState;

use super::error::ApiError;
use super::response::ApiResponse;

/// Build a display identifier like `TAX-CERT-2026-3f9ab2c1`. The uuid
/// fragment keeps concurrent issuance collision-free.
fn make_certificate_id(uuid: &Uuid) -> String {
    let fragment = &uuid.simple().to_string()[..8];
    format!("TAX-CERT-{}-{}", Utc::now().year(), fragment)
}

/// List a user's certificates
///
/// GET /api/certificates/user/:user_id
pub async fn get_user_certificates(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Certificate>>>, ApiError> {
    let certificates = sqlx::query_as::<_, Certificate>(
        "SELECT * FROM certificates WHERE user_id = ? ORDER BY issued_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::new("Success", certificates)))
}

/// Issue a certificate for a (user, course) pair. Certificates are
/// immutable once issued and valid for one year.
///
/// POST /api/certificates/generate
pub async fn generate_certificate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateCertificateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Certificate>>), ApiError> {
    let uuid = Uuid::new_v4();
    let id = uuid.to_string();
    let certificate_id = make_certificate_id(&uuid);
    let issued_at = Utc::now();
    let valid_until = issued_at + Duration::days(365);

    sqlx::query(
        r#"
        INSERT INTO certificates
            (id, certificate_id, user_id, course_id, issued_at, valid_until, download_url, verified)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(&id)
    .bind(&certificate_id)
    .bind(&req.user_id)
    .bind(&req.course_id)
    .bind(issued_at.to_rfc3339())
    .bind(valid_until.to_rfc3339())
    .bind(format!("/certificates/{}.pdf", certificate_id))
    .execute(&state.db)
    .await?;

    let certificate = sqlx::query_as::<_, Certificate>("SELECT * FROM certificates WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(certificate_id = %certificate.certificate_id, user_id = %req.user_id, "Certificate issued");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Certificate generated successfully",
            certificate,
        )),
    ))
}

/// Verify a certificate by display id. Unknown ids are a negative
/// verification result, not an error.
///
/// GET /api/certificates/verify/:certificate_id
pub async fn verify_certificate(
    State(state): State<Arc<AppState>>,
    Path(certificate_id): Path<String>,
) -> Result<Json<ApiResponse<VerifyCertificateResponse>>, ApiError> {
    let certificate =
        sqlx::query_as::<_, Certificate>("SELECT * FROM certificates WHERE certificate_id = ?")
            .bind(&certificate_id)
            .fetch_optional(&state.db)
            .await?;

    Ok(Json(ApiResponse::new(
        "Verification complete",
        VerifyCertificateResponse {
            valid: certificate.is_some(),
            certificate,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db;

    async fn test_state() -> Arc<AppState> {
        let pool = db::test_pool().await;
        db::seed_catalog(&pool).await.unwrap();
        Arc::new(AppState::new(Config::default(), pool))
    }

    #[tokio::test]
    async fn generated_certificate_is_valid_for_a_year() {
        let state = test_state().await;

        let (status, response) = generate_certificate(
            State(state),
            Json(GenerateCertificateRequest {
                user_id: "user-1".to_string(),
                course_id: "vat-fundamentals".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let cert = response.0.data.unwrap();
        assert!(cert.certificate_id.starts_with("TAX-CERT-"));
        assert_eq!(cert.verified, 1);

        let issued = chrono::DateTime::parse_from_rfc3339(&cert.issued_at).unwrap();
        let until = chrono::DateTime::parse_from_rfc3339(&cert.valid_until).unwrap();
        assert_eq!((until - issued).num_days(), 365);
    }

    #[tokio::test]
    async fn display_ids_are_unique_per_issue() {
        let state = test_state().await;
        let mut ids = std::collections::HashSet::new();
        for _ in 0..5 {
            let (_, response) = generate_certificate(
                State(state.clone()),
                Json(GenerateCertificateRequest {
                    user_id: "user-1".to_string(),
                    course_id: "vat-fundamentals".to_string(),
                }),
            )
            .await
            .unwrap();
            ids.insert(response.0.data.unwrap().certificate_id);
        }
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn verify_known_certificate() {
        let state = test_state().await;
        let response = verify_certificate(State(state), Path("TAX-CERT-2024-001".to_string()))
            .await
            .unwrap();
        let result = response.0.data.unwrap();
        assert!(result.valid);
        assert!(result.certificate.is_some());
    }

    #[tokio::test]
    async fn verify_unknown_certificate_is_negative_not_error() {
        let state = test_state().await;
        let response = verify_certificate(State(state), Path("TAX-CERT-0000-none".to_string()))
            .await
            .unwrap();
        let result = response.0.data.unwrap();
        assert!(!result.valid);
        assert!(result.certificate.is_none());
    }

    #[tokio::test]
    async fn user_certificates_are_scoped_to_the_user() {
        let state = test_state().await;
        let response = get_user_certificates(State(state), Path("sample-user".to_string()))
            .await
            .unwrap();
        let certs = response.0.data.unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].certificate_id, "TAX-CERT-2024-001");
    }
}
