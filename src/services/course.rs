use crate::{
    error::{AppError, StoreError},
    models::{CourseDetails, CourseRequest, CourseSummary},
    repository::RepositoryState,
};

/// CourseService
///
/// Course CRUD with the credits rule and the department reference check. Deleting a course
/// removes its enrollments through the store's cascade.
#[derive(Clone)]
pub struct CourseService {
    repo: RepositoryState,
}

impl CourseService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// All courses ordered by code.
    pub async fn list(&self) -> Result<Vec<CourseSummary>, AppError> {
        let courses = self.repo.list_courses().await?;
        Ok(courses.into_iter().map(CourseSummary::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<CourseDetails, AppError> {
        self.repo
            .get_course(id)
            .await?
            .map(CourseDetails::from)
            .ok_or(AppError::NotFound("course"))
    }

    /// create
    ///
    /// Rejects non-positive credits and unknown departments before touching the store, then
    /// inserts and returns the reloaded detailed view.
    pub async fn create(&self, request: CourseRequest) -> Result<CourseDetails, AppError> {
        validate_credits(request.credits)?;
        self.ensure_department(request.department_id).await?;

        let id = self
            .repo
            .insert_course(&request)
            .await
            .map_err(translate_write_error)?;
        tracing::info!(course_id = id, code = %request.code, "course created");

        self.reload(id, "created course could not be loaded").await
    }

    /// update
    ///
    /// Overwrites code, title, credits and department. Checks run in the order credits,
    /// existence, department.
    pub async fn update(&self, id: i32, request: CourseRequest) -> Result<CourseDetails, AppError> {
        validate_credits(request.credits)?;
        if self.repo.get_course(id).await?.is_none() {
            return Err(AppError::NotFound("course"));
        }
        self.ensure_department(request.department_id).await?;

        let updated = self
            .repo
            .update_course(id, &request)
            .await
            .map_err(translate_write_error)?;
        if !updated {
            // Deleted between the existence check and the write.
            return Err(AppError::NotFound("course"));
        }
        tracing::info!(course_id = id, "course updated");

        self.reload(id, "updated course could not be loaded").await
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.repo.delete_course(id).await? {
            return Err(AppError::NotFound("course"));
        }
        tracing::info!(course_id = id, "course deleted");
        Ok(())
    }

    async fn ensure_department(&self, department_id: i32) -> Result<(), AppError> {
        match self.repo.get_department(department_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::validation("department not found")),
        }
    }

    async fn reload(&self, id: i32, missing: &'static str) -> Result<CourseDetails, AppError> {
        self.repo
            .get_course(id)
            .await?
            .map(CourseDetails::from)
            .ok_or_else(|| AppError::internal(missing))
    }
}

fn validate_credits(credits: i32) -> Result<(), AppError> {
    if credits <= 0 {
        return Err(AppError::validation("credits must be > 0"));
    }
    Ok(())
}

fn translate_write_error(err: StoreError) -> AppError {
    match err {
        StoreError::UniqueViolation(_) => AppError::validation("course code already exists"),
        StoreError::ForeignKeyViolation(_) => AppError::validation("department not found"),
        StoreError::CheckViolation(_) => AppError::validation("credits must be > 0"),
        other => other.into(),
    }
}
