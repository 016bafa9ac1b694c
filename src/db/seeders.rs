//! Database seeders for the built-in catalog.
//!
//! The course catalog, the starter resource library and a sample
//! certificate are seeded at startup. Seeding is idempotent: existing
//! rows are left untouched so access counters survive restarts.

use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

/// Seed the course catalog, starter resources and a sample certificate.
pub async fn seed_catalog(pool: &SqlitePool) -> Result<()> {
    info!("Seeding course catalog and resource library...");

    // Format: (id, title, description, category, difficulty, duration_hours, modules)
    let courses: Vec<(&str, &str, &str, &str, &str, i64, &str)> = vec![
        (
            "vat-fundamentals",
            "VAT Fundamentals for Beginners",
            "Learn basic VAT concepts, registration, and filing procedures.",
            "VAT",
            "BEGINNER",
            4,
            r#"["Introduction to VAT","VAT Registration Process","Filing VAT Returns"]"#,
        ),
        (
            "income-tax-calculation",
            "Income Tax Calculation",
            "Complete guide to calculating and filing income tax returns.",
            "INCOME_TAX",
            "INTERMEDIATE",
            6,
            r#"["Understanding Tax Brackets","Deductions and Allowances"]"#,
        ),
    ];

    for (id, title, description, category, difficulty, duration_hours, modules) in courses {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO courses
                (id, title, description, category, difficulty, duration_hours, modules, published)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(difficulty)
        .bind(duration_hours)
        .bind(modules)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();

    // Format: (id, title, description, type, file_url, category, audience, views, downloads, uploaded_at)
    let resources: Vec<(&str, &str, &str, &str, &str, &str, &str, i64, i64, String)> = vec![
        (
            "vat-handbook",
            "VAT Compliance Handbook 2024",
            "Complete guide to VAT compliance for small and medium businesses.",
            "PDF",
            "/resources/vat-handbook.pdf",
            "VAT",
            "ALL",
            1250,
            890,
            (now - Duration::days(30)).to_rfc3339(),
        ),
        (
            "tax-filing-tutorial",
            "How to File Tax Returns Online",
            "Step-by-step video tutorial for online tax filing.",
            "VIDEO",
            "/resources/tax-filing.mp4",
            "INCOME_TAX",
            "TAXPAYER",
            3200,
            1500,
            (now - Duration::days(15)).to_rfc3339(),
        ),
    ];

    for (id, title, description, rtype, file_url, category, audience, views, downloads, uploaded_at) in
        resources
    {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO resources
                (id, title, description, resource_type, file_url, category, audience, views, downloads, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(rtype)
        .bind(file_url)
        .bind(category)
        .bind(audience)
        .bind(views)
        .bind(downloads)
        .bind(uploaded_at)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO certificates
            (id, certificate_id, user_id, course_id, issued_at, valid_until, download_url, verified)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind("sample-certificate")
    .bind("TAX-CERT-2024-001")
    .bind("sample-user")
    .bind("vat-fundamentals")
    .bind((now - Duration::days(10)).to_rfc3339())
    .bind((now + Duration::days(355)).to_rfc3339())
    .bind("/certificates/TAX-CERT-2024-001.pdf")
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = db::test_pool().await;

        seed_catalog(&pool).await.unwrap();
        seed_catalog(&pool).await.unwrap();

        let (courses,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(courses, 2);

        let (resources,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resources")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(resources, 2);
    }

    #[tokio::test]
    async fn seeding_preserves_counters() {
        let pool = db::test_pool().await;
        seed_catalog(&pool).await.unwrap();

        sqlx::query("UPDATE resources SET downloads = downloads + 5 WHERE id = 'vat-handbook'")
            .execute(&pool)
            .await
            .unwrap();

        seed_catalog(&pool).await.unwrap();

        let (downloads,): (i64,) =
            sqlx::query_as("SELECT downloads FROM resources WHERE id = 'vat-handbook'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(downloads, 895);
    }
}
