use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get},
};

/// Authenticated Router Module
///
/// Student-scoped routes. A Student token may only address its own `{id}`; an Admin token
/// may address any. The handlers enforce that with `Requirement::SelfOrAdmin` before any
/// lookup, so a foreign id is 403 even when it does not exist.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PUT /students/{id}
        // Read the detailed record, or change name and affiliation.
        .route(
            "/students/{id}",
            get(handlers::get_student).put(handlers::update_student),
        )
        // GET/POST /students/{id}/courses
        // List enrollments, or enroll in a course. A duplicate enrollment is 409.
        .route(
            "/students/{id}/courses",
            get(handlers::list_student_courses).post(handlers::enroll_student),
        )
        // DELETE /students/{id}/courses/{course_id}
        .route(
            "/students/{id}/courses/{course_id}",
            delete(handlers::unenroll_student),
        )
}
