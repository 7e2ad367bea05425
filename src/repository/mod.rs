use crate::{
    error::StoreError,
    models::{
        CourseRecord, CourseRequest, CreateStudentRequest, Department, EnrollmentRecord,
        StudentRecord, UpdateStudentRequest,
    },
};
use async_trait::async_trait;
use std::sync::Arc;

mod in_memory;
mod postgres;

pub use in_memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers and services only ever see
/// `Arc<dyn Repository>`, so the Postgres store and the in-memory store are interchangeable.
///
/// Implementations must enforce the relational rules of the schema themselves:
/// - unique `departments.name`, `courses.code`, `students.student_number`, and the
///   `(student_id, course_id)` enrollment key (`StoreError::UniqueViolation`);
/// - existing referents for every foreign key (`StoreError::ForeignKeyViolation`);
/// - `credits > 0` (`StoreError::CheckViolation`);
/// - cascades: deleting a course or student removes its enrollments, deleting a department
///   removes its courses and nulls the affiliation of its students.
///
/// Mutations report "row absent" as `Ok(false)` rather than an error.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Departments ---
    // Ordered by id.
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError>;
    async fn get_department(&self, id: i32) -> Result<Option<Department>, StoreError>;
    async fn delete_department(&self, id: i32) -> Result<bool, StoreError>;

    // --- Courses ---
    // Ordered by code.
    async fn list_courses(&self) -> Result<Vec<CourseRecord>, StoreError>;
    async fn get_course(&self, id: i32) -> Result<Option<CourseRecord>, StoreError>;
    /// Inserts a course and returns the identifier assigned by the store.
    async fn insert_course(&self, course: &CourseRequest) -> Result<i32, StoreError>;
    async fn update_course(&self, id: i32, course: &CourseRequest) -> Result<bool, StoreError>;
    async fn delete_course(&self, id: i32) -> Result<bool, StoreError>;

    // --- Students ---
    // Ordered by id.
    async fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError>;
    async fn get_student(&self, id: i32) -> Result<Option<StudentRecord>, StoreError>;
    /// Inserts a student with `total_credits = 0` and returns the assigned identifier.
    async fn insert_student(&self, student: &CreateStudentRequest) -> Result<i32, StoreError>;
    async fn update_student(
        &self,
        id: i32,
        student: &UpdateStudentRequest,
    ) -> Result<bool, StoreError>;
    async fn delete_student(&self, id: i32) -> Result<bool, StoreError>;

    // --- Enrollments ---
    // Ordered by course id.
    async fn list_enrollments(&self, student_id: i32) -> Result<Vec<EnrollmentRecord>, StoreError>;
    async fn get_enrollment(
        &self,
        student_id: i32,
        course_id: i32,
    ) -> Result<Option<EnrollmentRecord>, StoreError>;
    /// Inserts an enrollment with no grade. The composite key is the authoritative duplicate
    /// guard: a second insert for the same pair fails with `UniqueViolation`.
    async fn insert_enrollment(&self, student_id: i32, course_id: i32) -> Result<(), StoreError>;
    async fn set_grade(
        &self,
        student_id: i32,
        course_id: i32,
        grade: Option<&str>,
    ) -> Result<bool, StoreError>;
    async fn delete_enrollment(&self, student_id: i32, course_id: i32) -> Result<bool, StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
