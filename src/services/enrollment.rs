use crate::{
    error::{AppError, StoreError},
    models::EnrollmentView,
    repository::RepositoryState,
};

/// EnrollmentService
///
/// Lifecycle of the student-course join rows. A student's `total_credits` is not recomputed
/// by any of these operations.
#[derive(Clone)]
pub struct EnrollmentService {
    repo: RepositoryState,
}

impl EnrollmentService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// The student's enrollments ordered by course id. An unknown student yields an empty list.
    pub async fn list_for_student(&self, student_id: i32) -> Result<Vec<EnrollmentView>, AppError> {
        let enrollments = self.repo.list_enrollments(student_id).await?;
        Ok(enrollments.into_iter().map(EnrollmentView::from).collect())
    }

    /// enroll
    ///
    /// Checks run in the order student (404), course (400), duplicate (409). The duplicate
    /// pre-check only gives a fast answer; the composite-key constraint in the store is what
    /// stops two concurrent identical requests, and its violation is reported the same way.
    pub async fn enroll(&self, student_id: i32, course_id: i32) -> Result<EnrollmentView, AppError> {
        if self.repo.get_student(student_id).await?.is_none() {
            return Err(AppError::NotFound("student"));
        }
        if self.repo.get_course(course_id).await?.is_none() {
            return Err(AppError::validation("course not found"));
        }
        if self.repo.get_enrollment(student_id, course_id).await?.is_some() {
            return Err(AppError::conflict("already enrolled"));
        }

        self.repo
            .insert_enrollment(student_id, course_id)
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(_) => AppError::conflict("already enrolled"),
                StoreError::ForeignKeyViolation(_) => AppError::validation("course not found"),
                other => other.into(),
            })?;
        tracing::info!(student_id, course_id, "student enrolled");

        self.reload(student_id, course_id).await
    }

    /// update_grade
    ///
    /// Overwrites the grade. `None`, an empty string, or whitespace clears it.
    pub async fn update_grade(
        &self,
        student_id: i32,
        course_id: i32,
        grade: Option<String>,
    ) -> Result<EnrollmentView, AppError> {
        let grade = grade
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if !self.repo.set_grade(student_id, course_id, grade).await? {
            return Err(AppError::NotFound("enrollment"));
        }
        tracing::info!(student_id, course_id, grade = ?grade, "grade recorded");

        self.reload(student_id, course_id).await
    }

    pub async fn unenroll(&self, student_id: i32, course_id: i32) -> Result<(), AppError> {
        if !self.repo.delete_enrollment(student_id, course_id).await? {
            return Err(AppError::NotFound("enrollment"));
        }
        tracing::info!(student_id, course_id, "student unenrolled");
        Ok(())
    }

    async fn reload(&self, student_id: i32, course_id: i32) -> Result<EnrollmentView, AppError> {
        self.repo
            .get_enrollment(student_id, course_id)
            .await?
            .map(EnrollmentView::from)
            .ok_or_else(|| AppError::internal("enrollment could not be loaded"))
    }
}
