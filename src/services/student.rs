use crate::{
    error::{AppError, StoreError},
    models::{CreateStudentRequest, StudentDetails, StudentSummary, UpdateStudentRequest},
    repository::RepositoryState,
};

/// StudentService
///
/// Student records with an optional department affiliation. `student_number` and
/// `total_credits` are fixed at creation; updates touch only the name and the affiliation.
#[derive(Clone)]
pub struct StudentService {
    repo: RepositoryState,
}

impl StudentService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// All students ordered by id.
    pub async fn list(&self) -> Result<Vec<StudentSummary>, AppError> {
        let students = self.repo.list_students().await?;
        Ok(students.into_iter().map(StudentSummary::from).collect())
    }

    /// The detailed view, with every enrollment mapped through its course.
    pub async fn get(&self, id: i32) -> Result<StudentDetails, AppError> {
        self.load_details(id)
            .await?
            .ok_or(AppError::NotFound("student"))
    }

    pub async fn create(&self, request: CreateStudentRequest) -> Result<StudentDetails, AppError> {
        self.ensure_department(request.department_id).await?;

        let id = self
            .repo
            .insert_student(&request)
            .await
            .map_err(translate_write_error)?;
        tracing::info!(student_id = id, student_number = %request.student_number, "student created");

        self.load_details(id)
            .await?
            .ok_or_else(|| AppError::internal("created student could not be loaded"))
    }

    pub async fn update(
        &self,
        id: i32,
        request: UpdateStudentRequest,
    ) -> Result<StudentDetails, AppError> {
        if self.repo.get_student(id).await?.is_none() {
            return Err(AppError::NotFound("student"));
        }
        self.ensure_department(request.department_id).await?;

        let updated = self
            .repo
            .update_student(id, &request)
            .await
            .map_err(translate_write_error)?;
        if !updated {
            return Err(AppError::NotFound("student"));
        }
        tracing::info!(student_id = id, "student updated");

        self.load_details(id)
            .await?
            .ok_or_else(|| AppError::internal("updated student could not be loaded"))
    }

    /// Removes the student; the store cascades the deletion to its enrollments.
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.repo.delete_student(id).await? {
            return Err(AppError::NotFound("student"));
        }
        tracing::info!(student_id = id, "student deleted");
        Ok(())
    }

    async fn ensure_department(&self, department_id: Option<i32>) -> Result<(), AppError> {
        let Some(department_id) = department_id else {
            return Ok(());
        };
        match self.repo.get_department(department_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::validation("department not found")),
        }
    }

    async fn load_details(&self, id: i32) -> Result<Option<StudentDetails>, AppError> {
        let Some(student) = self.repo.get_student(id).await? else {
            return Ok(None);
        };
        let enrollments = self.repo.list_enrollments(id).await?;
        Ok(Some(StudentDetails::from_parts(student, enrollments)))
    }
}

fn translate_write_error(err: StoreError) -> AppError {
    match err {
        StoreError::UniqueViolation(_) => AppError::validation("student number already exists"),
        StoreError::ForeignKeyViolation(_) => AppError::validation("department not found"),
        other => other.into(),
    }
}
