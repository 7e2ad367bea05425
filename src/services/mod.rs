//! Entity services and the enrollment manager.
//!
//! Each service wraps the shared repository and owns the decision logic for its entity:
//! existence and reference checks, translating store constraint violations into
//! validation/conflict outcomes, and reloading the detailed view after a write. Handlers pull
//! them out of `AppState` through `FromRef`.

mod course;
mod department;
mod enrollment;
mod student;

pub use course::CourseService;
pub use department::DepartmentService;
pub use enrollment::EnrollmentService;
pub use student::StudentService;
