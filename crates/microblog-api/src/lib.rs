pub mod admin;
pub mod analytics;
pub mod error;
pub mod export;
pub mod flash;
pub mod health;
pub mod names;
pub mod pages;
pub mod render;
pub mod reports;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Every route of the application, bound to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::dashboard))
        .route("/dashboard", get(pages::dashboard))
        .route("/register", get(pages::register_form).post(pages::register))
        .route("/post/new", get(pages::new_post_form).post(pages::new_post))
        .route("/user/{username}", get(pages::user_profile))
        .route("/admin", get(admin::admin_dashboard))
        .route("/admin/create_empty_db", get(admin::create_empty_db))
        .route("/admin/populate_db", get(admin::populate_db))
        .route("/admin/export_users", get(admin::export_users))
        .route("/admin/delete_user/{username}", post(admin::delete_user))
        .route("/views/users", get(reports::users))
        .route("/views/posts", get(reports::posts))
        .route("/views/user/{username}", get(reports::user))
        .route("/analytics/dashboard", get(analytics::dashboard))
        .route("/analytics/export", get(analytics::export))
        .route("/analytics/user_report", get(analytics::user_report))
        .route("/names", get(names::index).post(names::add))
        .route("/names/download", get(names::download))
        .route("/names/confirm-clear", get(names::confirm_clear_form).post(names::confirm_clear))
        .route("/health", get(health::health))
        .with_state(state)
}
