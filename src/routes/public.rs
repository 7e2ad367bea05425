use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no bearer token: the catalogue of departments and courses, login,
/// and the health probe.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers. Returns "ok" without touching the store.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Exchanges credentials for a one-hour bearer token.
        .route("/auth/login", post(handlers::login))
        // GET /departments, GET /departments/{id}
        .route("/departments", get(handlers::list_departments))
        .route("/departments/{id}", get(handlers::get_department))
        // GET /courses, GET /courses/{id}
        // Mutations on the same paths live in the admin router.
        .route("/courses", get(handlers::list_courses))
        .route("/courses/{id}", get(handlers::get_course))
}
