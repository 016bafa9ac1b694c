pub mod auth;
mod certificates;
mod courses;
pub mod error;
mod notifications;
mod resources;
pub mod response;
mod sync;
mod users;
mod validation;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/me", get(auth::current_user));

    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/:user_id", get(users::get_user))
        .route("/:user_id", put(users::update_user))
        .route("/:user_id/status", patch(users::update_user_status));

    let course_routes = Router::new()
        .route("/", get(courses::list_courses))
        .route("/enroll", post(courses::enroll))
        .route("/progress", put(courses::update_progress))
        .route("/enrollments/:user_id", get(courses::get_user_enrollments))
        .route("/:id", get(courses::get_course));

    let resource_routes = Router::new()
        .route("/", get(resources::list_resources))
        .route("/search", get(resources::search_resources))
        .route("/upload", post(resources::upload_resource))
        .route("/:id", get(resources::get_resource))
        .route("/:id/download", post(resources::download_resource));

    let certificate_routes = Router::new()
        .route("/user/:user_id", get(certificates::get_user_certificates))
        .route("/generate", post(certificates::generate_certificate))
        .route(
            "/verify/:certificate_id",
            get(certificates::verify_certificate),
        );

    let notification_routes = Router::new()
        .route("/", post(notifications::create_notification))
        .route("/send", post(notifications::send_notification))
        .route("/campaigns", get(notifications::get_campaigns))
        .route("/statistics", get(notifications::get_statistics))
        .route("/user/:user_id", get(notifications::get_user_notifications))
        .route(
            "/user/:user_id/unread",
            get(notifications::get_unread_notifications),
        )
        .route(
            "/user/:user_id/read-all",
            post(notifications::mark_all_as_read),
        )
        .route("/:id/read", post(notifications::mark_as_read))
        .route("/:id/resend", post(notifications::resend_notification))
        .route("/:id", delete(notifications::delete_notification));

    let sync_routes = Router::new()
        .route("/", get(sync::list_sync_records))
        .route("/", post(sync::create_sync_record))
        .route("/status/:status", get(sync::get_sync_records_by_status))
        .route("/:id", get(sync::get_sync_record))
        .route("/:id", delete(sync::delete_sync_record))
        .route("/:id/status", put(sync::update_sync_status))
        .route("/:id/retry", post(sync::retry_sync));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/resources", resource_routes)
        .nest("/api/certificates", certificate_routes)
        .nest("/api/sync", sync_routes)
        // The legacy frontend consumes these two without the /api prefix
        .nest("/users", user_routes)
        .nest("/notifications", notification_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
