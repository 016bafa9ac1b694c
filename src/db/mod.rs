mod models;
mod seeders;

pub use models::*;
pub use seeders::seed_catalog;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("taxlearn.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    // Seed the course catalog, sample resources and certificates
    seeders::seed_catalog(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Users and sessions
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    // Migration 002: Course catalog and enrollments
    let has_courses_table: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='courses'")
            .fetch_optional(pool)
            .await?;
    if has_courses_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/002_courses.sql")).await?;
    }

    // Migration 003: Resource library and certificates
    let has_resources_table: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='resources'")
            .fetch_optional(pool)
            .await?;
    if has_resources_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/003_resources.sql")).await?;
    }

    // Migration 004: Notifications
    let has_notifications_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='notifications'",
    )
    .fetch_optional(pool)
    .await?;
    if has_notifications_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/004_notifications.sql")).await?;
    }

    // Migration 005: Sync ledger
    let has_sync_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='sync_records'",
    )
    .fetch_optional(pool)
    .await?;
    if has_sync_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/005_sync_records.sql")).await?;
    }

    info!("Migrations completed");
    Ok(())
}

/// In-memory pool with migrations applied, for tests. A single connection
/// keeps every query on the same in-memory database.
#[cfg(test)]
pub async fn test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    run_migrations(&pool).await.expect("migrations failed");
    pool
}
