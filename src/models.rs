use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity ---

/// Role
///
/// The two roles a credential can carry. Serialized verbatim ("Admin" / "Student") both in
/// the token's `role` claim and in the login response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Role {
    Admin,
    Student,
}

// --- Store Records (Mapped to Database) ---

/// Department
///
/// A row of the `departments` table. Departments are seeded by the schema migration and are
/// read-only over HTTP.
#[derive(Debug, Clone, PartialEq, FromRow, Default)]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub building: String,
    pub budget: f64,
}

/// CourseRecord
///
/// A `courses` row joined with the name of its owning department.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Default)]
pub struct CourseRecord {
    pub id: i32,
    pub code: String,
    pub title: String,
    pub credits: i32,
    pub department_id: i32,
    pub department_name: String,
}

/// StudentRecord
///
/// A `students` row with its (optional) department affiliation resolved. Both department
/// columns are NULL when the student is unaffiliated.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Default)]
pub struct StudentRecord {
    pub id: i32,
    pub student_number: String,
    pub name: String,
    pub total_credits: i32,
    pub department_id: Option<i32>,
    pub department_name: Option<String>,
}

/// EnrollmentRecord
///
/// An `enrollments` row (composite key student_id + course_id) joined with the course it
/// references.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Default)]
pub struct EnrollmentRecord {
    pub student_id: i32,
    pub course_id: i32,
    pub course_code: String,
    pub course_title: String,
    pub credits: i32,
    pub grade: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "admin@dkit.ie")]
    pub email: String,
    pub password: String,
}

/// CourseRequest
///
/// Full replacement payload shared by POST /courses and PUT /courses/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseRequest {
    #[schema(example = "CS-101")]
    pub code: String,
    pub title: String,
    /// Must be strictly positive.
    pub credits: i32,
    pub department_id: i32,
}

/// CreateStudentRequest
///
/// Input payload for POST /students. `totalCredits` is not accepted; it always starts at 0.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateStudentRequest {
    #[schema(example = "00128")]
    pub student_number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub department_id: Option<i32>,
}

/// UpdateStudentRequest
///
/// Input payload for PUT /students/{id}. Only the name and the affiliation are mutable;
/// omitting `departmentId` clears the affiliation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateStudentRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub department_id: Option<i32>,
}

/// EnrollRequest
///
/// Input payload for POST /students/{id}/courses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EnrollRequest {
    pub course_id: i32,
}

/// GradeRequest
///
/// Input payload for PUT /students/{id}/courses/{courseId}. A missing or blank grade clears
/// the recorded grade.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GradeRequest {
    #[ts(optional)]
    pub grade: Option<String>,
}

// --- Response Schemas (Output) ---

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub access_token: String,
    /// Token lifetime in seconds (3600).
    pub expires_in: i64,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub student_id: Option<i32>,
}

/// DepartmentView
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DepartmentView {
    pub id: i32,
    pub name: String,
}

impl From<Department> for DepartmentView {
    fn from(department: Department) -> Self {
        Self {
            id: department.id,
            name: department.name,
        }
    }
}

/// CourseSummary
///
/// One row of GET /courses, flattened with the department name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseSummary {
    pub id: i32,
    pub code: String,
    pub title: String,
    pub credits: i32,
    pub department_id: i32,
    pub department_name: String,
}

impl From<CourseRecord> for CourseSummary {
    fn from(record: CourseRecord) -> Self {
        Self {
            id: record.id,
            code: record.code,
            title: record.title,
            credits: record.credits,
            department_id: record.department_id,
            department_name: record.department_name,
        }
    }
}

/// CourseDetails
///
/// Detailed course view with the owning department nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseDetails {
    pub id: i32,
    pub code: String,
    pub title: String,
    pub credits: i32,
    pub department: DepartmentView,
}

impl From<CourseRecord> for CourseDetails {
    fn from(record: CourseRecord) -> Self {
        Self {
            id: record.id,
            code: record.code,
            title: record.title,
            credits: record.credits,
            department: DepartmentView {
                id: record.department_id,
                name: record.department_name,
            },
        }
    }
}

/// StudentSummary
///
/// One row of GET /students. Department fields are omitted when the student is unaffiliated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudentSummary {
    pub id: i32,
    pub student_number: String,
    pub name: String,
    pub total_credits: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub department_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub department_name: Option<String>,
}

impl From<StudentRecord> for StudentSummary {
    fn from(record: StudentRecord) -> Self {
        Self {
            id: record.id,
            student_number: record.student_number,
            name: record.name,
            total_credits: record.total_credits,
            department_id: record.department_id,
            department_name: record.department_name,
        }
    }
}

/// EnrollmentView
///
/// An enrollment as seen from the student side, mapped through the course it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EnrollmentView {
    pub course_id: i32,
    pub course_code: String,
    pub course_title: String,
    pub credits: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub grade: Option<String>,
}

impl From<EnrollmentRecord> for EnrollmentView {
    fn from(record: EnrollmentRecord) -> Self {
        Self {
            course_id: record.course_id,
            course_code: record.course_code,
            course_title: record.course_title,
            credits: record.credits,
            grade: record.grade,
        }
    }
}

/// StudentDetails
///
/// Detailed student view: optional department plus every enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StudentDetails {
    pub id: i32,
    pub student_number: String,
    pub name: String,
    pub total_credits: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub department: Option<DepartmentView>,
    pub enrollments: Vec<EnrollmentView>,
}

impl StudentDetails {
    /// Assembles the detailed view from a student row and its enrollment rows.
    pub fn from_parts(record: StudentRecord, enrollments: Vec<EnrollmentRecord>) -> Self {
        let department = match (record.department_id, record.department_name) {
            (Some(id), Some(name)) => Some(DepartmentView { id, name }),
            _ => None,
        };

        Self {
            id: record.id,
            student_number: record.student_number,
            name: record.name,
            total_credits: record.total_credits,
            department,
            enrollments: enrollments.into_iter().map(EnrollmentView::from).collect(),
        }
    }
}
