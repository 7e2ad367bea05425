use crate::{error::AppError, models::DepartmentView, repository::RepositoryState};

/// DepartmentService
///
/// Read-only access to departments; they are managed by the schema migration.
#[derive(Clone)]
pub struct DepartmentService {
    repo: RepositoryState,
}

impl DepartmentService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// All departments ordered by id.
    pub async fn list(&self) -> Result<Vec<DepartmentView>, AppError> {
        let departments = self.repo.list_departments().await?;
        Ok(departments.into_iter().map(DepartmentView::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<DepartmentView, AppError> {
        self.repo
            .get_department(id)
            .await?
            .map(DepartmentView::from)
            .ok_or(AppError::NotFound("department"))
    }
}
