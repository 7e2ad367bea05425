use super::Repository;
use crate::{
    error::StoreError,
    models::{
        CourseRecord, CourseRequest, CreateStudentRequest, Department, EnrollmentRecord,
        StudentRecord, UpdateStudentRequest,
    },
};
use async_trait::async_trait;
use sqlx::PgPool;

// Shared projections. Every course/student/enrollment read goes through one of these so the
// column list always matches the `FromRow` record it is decoded into.
const COURSE_SELECT: &str = r#"
    SELECT c.id, c.code, c.title, c.credits, c.department_id, d.name AS department_name
    FROM courses c
    JOIN departments d ON d.id = c.department_id
"#;

const STUDENT_SELECT: &str = r#"
    SELECT s.id, s.student_number, s.name, s.total_credits, s.department_id,
           d.name AS department_name
    FROM students s
    LEFT JOIN departments d ON d.id = s.department_id
"#;

const ENROLLMENT_SELECT: &str = r#"
    SELECT e.student_id, e.course_id, c.code AS course_code, c.title AS course_title,
           c.credits, e.grade
    FROM enrollments e
    JOIN courses c ON c.id = e.course_id
"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL. Constraint
/// enforcement (uniqueness, foreign keys, cascades, `credits > 0`) is left to the schema in
/// `migrations/`; driver errors are classified into `StoreError` by SQLSTATE.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Classifies a driver error and logs it. Constraint violations are expected outcomes
/// (duplicate enrollment, unknown department) and only logged at debug.
fn log_failure(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        let err = StoreError::from(e);
        match &err {
            StoreError::Backend(_) => {
                tracing::error!(operation, error = %err, "postgres query failed")
            }
            _ => tracing::debug!(operation, error = %err, "postgres constraint rejected write"),
        }
        err
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        sqlx::query_as::<_, Department>(
            "SELECT id, name, building, budget FROM departments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(log_failure("list_departments"))
    }

    async fn get_department(&self, id: i32) -> Result<Option<Department>, StoreError> {
        sqlx::query_as::<_, Department>(
            "SELECT id, name, building, budget FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_failure("get_department"))
    }

    /// delete_department
    ///
    /// Courses cascade (ON DELETE CASCADE), student affiliations are nulled (ON DELETE SET NULL).
    async fn delete_department(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(log_failure("delete_department"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_courses(&self) -> Result<Vec<CourseRecord>, StoreError> {
        let query = format!("{COURSE_SELECT} ORDER BY c.code");
        sqlx::query_as::<_, CourseRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(log_failure("list_courses"))
    }

    async fn get_course(&self, id: i32) -> Result<Option<CourseRecord>, StoreError> {
        let query = format!("{COURSE_SELECT} WHERE c.id = $1");
        sqlx::query_as::<_, CourseRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_failure("get_course"))
    }

    async fn insert_course(&self, course: &CourseRequest) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            r#"INSERT INTO courses (code, title, credits, department_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(&course.code)
        .bind(&course.title)
        .bind(course.credits)
        .bind(course.department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(log_failure("insert_course"))
    }

    async fn update_course(&self, id: i32, course: &CourseRequest) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"UPDATE courses
               SET code = $2, title = $3, credits = $4, department_id = $5
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(&course.code)
        .bind(&course.title)
        .bind(course.credits)
        .bind(course.department_id)
        .execute(&self.pool)
        .await
        .map_err(log_failure("update_course"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_course(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(log_failure("delete_course"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let query = format!("{STUDENT_SELECT} ORDER BY s.id");
        sqlx::query_as::<_, StudentRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(log_failure("list_students"))
    }

    async fn get_student(&self, id: i32) -> Result<Option<StudentRecord>, StoreError> {
        let query = format!("{STUDENT_SELECT} WHERE s.id = $1");
        sqlx::query_as::<_, StudentRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_failure("get_student"))
    }

    async fn insert_student(&self, student: &CreateStudentRequest) -> Result<i32, StoreError> {
        sqlx::query_scalar::<_, i32>(
            r#"INSERT INTO students (student_number, name, total_credits, department_id)
               VALUES ($1, $2, 0, $3)
               RETURNING id"#,
        )
        .bind(&student.student_number)
        .bind(&student.name)
        .bind(student.department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(log_failure("insert_student"))
    }

    async fn update_student(
        &self,
        id: i32,
        student: &UpdateStudentRequest,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE students SET name = $2, department_id = $3 WHERE id = $1")
            .bind(id)
            .bind(&student.name)
            .bind(student.department_id)
            .execute(&self.pool)
            .await
            .map_err(log_failure("update_student"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_student(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(log_failure("delete_student"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_enrollments(&self, student_id: i32) -> Result<Vec<EnrollmentRecord>, StoreError> {
        let query = format!("{ENROLLMENT_SELECT} WHERE e.student_id = $1 ORDER BY e.course_id");
        sqlx::query_as::<_, EnrollmentRecord>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await
            .map_err(log_failure("list_enrollments"))
    }

    async fn get_enrollment(
        &self,
        student_id: i32,
        course_id: i32,
    ) -> Result<Option<EnrollmentRecord>, StoreError> {
        let query = format!("{ENROLLMENT_SELECT} WHERE e.student_id = $1 AND e.course_id = $2");
        sqlx::query_as::<_, EnrollmentRecord>(&query)
            .bind(student_id)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_failure("get_enrollment"))
    }

    /// insert_enrollment
    ///
    /// No `ON CONFLICT`: a second insert for the same pair fails on the primary key (23505),
    /// which surfaces as `StoreError::UniqueViolation`.
    async fn insert_enrollment(&self, student_id: i32, course_id: i32) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO enrollments (student_id, course_id, grade) VALUES ($1, $2, NULL)")
            .bind(student_id)
            .bind(course_id)
            .execute(&self.pool)
            .await
            .map_err(log_failure("insert_enrollment"))?;
        Ok(())
    }

    async fn set_grade(
        &self,
        student_id: i32,
        course_id: i32,
        grade: Option<&str>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE enrollments SET grade = $3 WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(grade)
        .execute(&self.pool)
        .await
        .map_err(log_failure("set_grade"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_enrollment(&self, student_id: i32, course_id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM enrollments WHERE student_id = $1 AND course_id = $2")
            .bind(student_id)
            .bind(course_id)
            .execute(&self.pool)
            .await
            .map_err(log_failure("delete_enrollment"))?;
        Ok(result.rows_affected() > 0)
    }
}
