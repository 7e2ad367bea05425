use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Catalogue mutations, the student registry and grading. Every handler here checks
/// `Requirement::Admin` first; a Student token gets 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /courses, PUT/DELETE /courses/{id}
        // Deleting a course also removes its enrollments.
        .route("/courses", post(handlers::create_course))
        .route(
            "/courses/{id}",
            put(handlers::update_course).delete(handlers::delete_course),
        )
        // GET/POST /students
        .route(
            "/students",
            get(handlers::list_students).post(handlers::create_student),
        )
        // DELETE /students/{id}
        .route("/students/{id}", delete(handlers::delete_student))
        // PUT /students/{id}/courses/{course_id}
        // Records or clears the grade of an existing enrollment.
        .route(
            "/students/{id}/courses/{course_id}",
            put(handlers::update_enrollment_grade),
        )
}
