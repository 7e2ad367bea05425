use crate::{
    auth::{Identity, TokenIssuer},
    credentials::CredentialTable,
    error::AppError,
    extract::{AppJson, AppPath},
    models::{
        CourseDetails, CourseRequest, CourseSummary, CreateStudentRequest, DepartmentView,
        EnrollRequest, EnrollmentView, GradeRequest, LoginRequest, LoginResponse,
        StudentDetails, StudentSummary, UpdateStudentRequest,
    },
    policy::{self, Requirement},
    services::{CourseService, DepartmentService, EnrollmentService, StudentService},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

// --- Authentication ---

/// login
///
/// [Public Route] Exchanges an email/password pair for a signed bearer token valid for one
/// hour. Wrong password and unknown email are indistinguishable (401).
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(tokens): State<TokenIssuer>,
    State(credentials): State<CredentialTable>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let issued = tokens.authenticate(&credentials, &payload.email, &payload.password)?;
    Ok(Json(issued.into()))
}

// --- Departments ---

/// list_departments
#[utoipa::path(
    get,
    path = "/departments",
    responses((status = 200, description = "All departments", body = [DepartmentView]))
)]
pub async fn list_departments(
    State(departments): State<DepartmentService>,
) -> Result<Json<Vec<DepartmentView>>, AppError> {
    Ok(Json(departments.list().await?))
}

/// get_department
#[utoipa::path(
    get,
    path = "/departments/{id}",
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department", body = DepartmentView),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_department(
    State(departments): State<DepartmentService>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<DepartmentView>, AppError> {
    Ok(Json(departments.get(id).await?))
}

// --- Courses ---

/// list_courses
///
/// [Public Route] Every course, ordered by code, flattened with its department name.
#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "All courses", body = [CourseSummary]))
)]
pub async fn list_courses(
    State(courses): State<CourseService>,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    Ok(Json(courses.list().await?))
}

/// get_course
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = CourseDetails),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_course(
    State(courses): State<CourseService>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<CourseDetails>, AppError> {
    Ok(Json(courses.get(id).await?))
}

/// create_course
///
/// [Admin Route] Creates a course. Non-positive credits, an unknown department or a
/// duplicate code are all 400.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CourseRequest,
    responses(
        (status = 201, description = "Created", body = CourseDetails),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer" = []))
)]
pub async fn create_course(
    identity: Identity,
    State(courses): State<CourseService>,
    AppJson(payload): AppJson<CourseRequest>,
) -> Result<(StatusCode, Json<CourseDetails>), AppError> {
    policy::authorize(&identity, Requirement::Admin)?;
    let course = courses.create(payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// update_course
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    request_body = CourseRequest,
    responses(
        (status = 200, description = "Updated", body = CourseDetails),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer" = []))
)]
pub async fn update_course(
    identity: Identity,
    State(courses): State<CourseService>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<CourseRequest>,
) -> Result<Json<CourseDetails>, AppError> {
    policy::authorize(&identity, Requirement::Admin)?;
    Ok(Json(courses.update(id, payload).await?))
}

/// delete_course
///
/// [Admin Route] Removes the course together with every enrollment that references it.
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_course(
    identity: Identity,
    State(courses): State<CourseService>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    policy::authorize(&identity, Requirement::Admin)?;
    courses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Students ---

/// list_students
#[utoipa::path(
    get,
    path = "/students",
    responses(
        (status = 200, description = "All students", body = [StudentSummary]),
        (status = 403, description = "Admin only")
    ),
    security(("bearer" = []))
)]
pub async fn list_students(
    identity: Identity,
    State(students): State<StudentService>,
) -> Result<Json<Vec<StudentSummary>>, AppError> {
    policy::authorize(&identity, Requirement::Admin)?;
    Ok(Json(students.list().await?))
}

/// get_student
///
/// [Authenticated Route] A student may read only their own record. The policy runs before
/// the lookup, so a foreign id is 403 whether or not it exists.
#[utoipa::path(
    get,
    path = "/students/{id}",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student", body = StudentDetails),
        (status = 403, description = "Not this student"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer" = []))
)]
pub async fn get_student(
    identity: Identity,
    State(students): State<StudentService>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<StudentDetails>, AppError> {
    policy::authorize(&identity, Requirement::SelfOrAdmin(id))?;
    Ok(Json(students.get(id).await?))
}

/// create_student
#[utoipa::path(
    post,
    path = "/students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Created", body = StudentDetails),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer" = []))
)]
pub async fn create_student(
    identity: Identity,
    State(students): State<StudentService>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentDetails>), AppError> {
    policy::authorize(&identity, Requirement::Admin)?;
    let student = students.create(payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// update_student
#[utoipa::path(
    put,
    path = "/students/{id}",
    params(("id" = i32, Path, description = "Student id")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Updated", body = StudentDetails),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not this student"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer" = []))
)]
pub async fn update_student(
    identity: Identity,
    State(students): State<StudentService>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentDetails>, AppError> {
    policy::authorize(&identity, Requirement::SelfOrAdmin(id))?;
    Ok(Json(students.update(id, payload).await?))
}

/// delete_student
#[utoipa::path(
    delete,
    path = "/students/{id}",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_student(
    identity: Identity,
    State(students): State<StudentService>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    policy::authorize(&identity, Requirement::Admin)?;
    students.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Enrollments ---

/// list_student_courses
#[utoipa::path(
    get,
    path = "/students/{id}/courses",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 200, description = "Enrollments", body = [EnrollmentView]),
        (status = 403, description = "Not this student")
    ),
    security(("bearer" = []))
)]
pub async fn list_student_courses(
    identity: Identity,
    State(enrollments): State<EnrollmentService>,
    AppPath(student_id): AppPath<i32>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    policy::authorize(&identity, Requirement::SelfOrAdmin(student_id))?;
    Ok(Json(enrollments.list_for_student(student_id).await?))
}

/// enroll_student
///
/// [Authenticated Route] Enrolls the student in a course. Unknown student is 404, unknown
/// course 400 and an existing enrollment 409.
#[utoipa::path(
    post,
    path = "/students/{id}/courses",
    params(("id" = i32, Path, description = "Student id")),
    request_body = EnrollRequest,
    responses(
        (status = 200, description = "Enrolled", body = EnrollmentView),
        (status = 400, description = "Course not found"),
        (status = 403, description = "Not this student"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Already enrolled")
    ),
    security(("bearer" = []))
)]
pub async fn enroll_student(
    identity: Identity,
    State(enrollments): State<EnrollmentService>,
    AppPath(student_id): AppPath<i32>,
    AppJson(payload): AppJson<EnrollRequest>,
) -> Result<Json<EnrollmentView>, AppError> {
    policy::authorize(&identity, Requirement::SelfOrAdmin(student_id))?;
    Ok(Json(enrollments.enroll(student_id, payload.course_id).await?))
}

/// update_enrollment_grade
#[utoipa::path(
    put,
    path = "/students/{id}/courses/{course_id}",
    params(
        ("id" = i32, Path, description = "Student id"),
        ("course_id" = i32, Path, description = "Course id")
    ),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Grade recorded", body = EnrollmentView),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Enrollment not found")
    ),
    security(("bearer" = []))
)]
pub async fn update_enrollment_grade(
    identity: Identity,
    State(enrollments): State<EnrollmentService>,
    AppPath((student_id, course_id)): AppPath<(i32, i32)>,
    AppJson(payload): AppJson<GradeRequest>,
) -> Result<Json<EnrollmentView>, AppError> {
    policy::authorize(&identity, Requirement::Admin)?;
    let enrollment = enrollments
        .update_grade(student_id, course_id, payload.grade)
        .await?;
    Ok(Json(enrollment))
}

/// unenroll_student
#[utoipa::path(
    delete,
    path = "/students/{id}/courses/{course_id}",
    params(
        ("id" = i32, Path, description = "Student id"),
        ("course_id" = i32, Path, description = "Course id")
    ),
    responses(
        (status = 204, description = "Unenrolled"),
        (status = 403, description = "Not this student"),
        (status = 404, description = "Enrollment not found")
    ),
    security(("bearer" = []))
)]
pub async fn unenroll_student(
    identity: Identity,
    State(enrollments): State<EnrollmentService>,
    AppPath((student_id, course_id)): AppPath<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    policy::authorize(&identity, Requirement::SelfOrAdmin(student_id))?;
    enrollments.unenroll(student_id, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
