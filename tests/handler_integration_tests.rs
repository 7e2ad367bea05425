use async_trait::async_trait;
use axum::{
    Json,
    body::Body,
    extract::{FromRef, FromRequest, State},
    http::{Request, StatusCode, header},
    response::IntoResponse,
};
use serde_json::Value;
use std::sync::Arc;
use university_api::{
    AppConfig, AppError, AppState, CourseService, CredentialTable, DepartmentService,
    EnrollmentService, InMemoryRepository, RepositoryState, StudentService,
    auth::{Identity, TokenIssuer},
    error::StoreError,
    extract::{AppJson, AppPath},
    handlers,
    models::{
        CourseRecord, CourseRequest, CreateStudentRequest, Department, EnrollRequest,
        EnrollmentRecord, GradeRequest, LoginRequest, Role, StudentRecord, UpdateStudentRequest,
    },
    repository::Repository,
};

// --- Mock Repositories ---

/// Every call fails as if the database were unreachable.
struct UnavailableRepo;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Backend("connection refused".to_string()))
}

#[async_trait]
impl Repository for UnavailableRepo {
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        down()
    }
    async fn get_department(&self, _id: i32) -> Result<Option<Department>, StoreError> {
        down()
    }
    async fn delete_department(&self, _id: i32) -> Result<bool, StoreError> {
        down()
    }
    async fn list_courses(&self) -> Result<Vec<CourseRecord>, StoreError> {
        down()
    }
    async fn get_course(&self, _id: i32) -> Result<Option<CourseRecord>, StoreError> {
        down()
    }
    async fn insert_course(&self, _course: &CourseRequest) -> Result<i32, StoreError> {
        down()
    }
    async fn update_course(&self, _id: i32, _course: &CourseRequest) -> Result<bool, StoreError> {
        down()
    }
    async fn delete_course(&self, _id: i32) -> Result<bool, StoreError> {
        down()
    }
    async fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        down()
    }
    async fn get_student(&self, _id: i32) -> Result<Option<StudentRecord>, StoreError> {
        down()
    }
    async fn insert_student(&self, _student: &CreateStudentRequest) -> Result<i32, StoreError> {
        down()
    }
    async fn update_student(
        &self,
        _id: i32,
        _student: &UpdateStudentRequest,
    ) -> Result<bool, StoreError> {
        down()
    }
    async fn delete_student(&self, _id: i32) -> Result<bool, StoreError> {
        down()
    }
    async fn list_enrollments(&self, _student_id: i32) -> Result<Vec<EnrollmentRecord>, StoreError> {
        down()
    }
    async fn get_enrollment(
        &self,
        _student_id: i32,
        _course_id: i32,
    ) -> Result<Option<EnrollmentRecord>, StoreError> {
        down()
    }
    async fn insert_enrollment(&self, _student_id: i32, _course_id: i32) -> Result<(), StoreError> {
        down()
    }
    async fn set_grade(
        &self,
        _student_id: i32,
        _course_id: i32,
        _grade: Option<&str>,
    ) -> Result<bool, StoreError> {
        down()
    }
    async fn delete_enrollment(&self, _student_id: i32, _course_id: i32) -> Result<bool, StoreError> {
        down()
    }
}

/// Accepts course writes but never finds the written row again.
struct LossyRepo;

#[async_trait]
impl Repository for LossyRepo {
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        Ok(vec![])
    }
    async fn get_department(&self, id: i32) -> Result<Option<Department>, StoreError> {
        Ok(Some(Department {
            id,
            ..Department::default()
        }))
    }
    async fn delete_department(&self, _id: i32) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn list_courses(&self) -> Result<Vec<CourseRecord>, StoreError> {
        Ok(vec![])
    }
    async fn get_course(&self, _id: i32) -> Result<Option<CourseRecord>, StoreError> {
        Ok(None)
    }
    async fn insert_course(&self, _course: &CourseRequest) -> Result<i32, StoreError> {
        Ok(77)
    }
    async fn update_course(&self, _id: i32, _course: &CourseRequest) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn delete_course(&self, _id: i32) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(vec![])
    }
    async fn get_student(&self, _id: i32) -> Result<Option<StudentRecord>, StoreError> {
        Ok(None)
    }
    async fn insert_student(&self, _student: &CreateStudentRequest) -> Result<i32, StoreError> {
        Ok(77)
    }
    async fn update_student(
        &self,
        _id: i32,
        _student: &UpdateStudentRequest,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn delete_student(&self, _id: i32) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn list_enrollments(&self, _student_id: i32) -> Result<Vec<EnrollmentRecord>, StoreError> {
        Ok(vec![])
    }
    async fn get_enrollment(
        &self,
        _student_id: i32,
        _course_id: i32,
    ) -> Result<Option<EnrollmentRecord>, StoreError> {
        Ok(None)
    }
    async fn insert_enrollment(&self, _student_id: i32, _course_id: i32) -> Result<(), StoreError> {
        Ok(())
    }
    async fn set_grade(
        &self,
        _student_id: i32,
        _course_id: i32,
        _grade: Option<&str>,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }
    async fn delete_enrollment(&self, _student_id: i32, _course_id: i32) -> Result<bool, StoreError> {
        Ok(false)
    }
}

// --- Helpers ---

fn state_with(repo: RepositoryState) -> AppState {
    AppState::new(repo, AppConfig::default())
}

fn seeded_state() -> AppState {
    state_with(Arc::new(InMemoryRepository::seeded()))
}

fn admin() -> Identity {
    Identity::admin("admin@dkit.ie")
}

fn student(id: i32) -> Identity {
    Identity::student(format!("student{id}@dkit.ie"), id)
}

fn courses(state: &AppState) -> State<CourseService> {
    State(CourseService::from_ref(state))
}

fn students(state: &AppState) -> State<StudentService> {
    State(StudentService::from_ref(state))
}

fn enrollments(state: &AppState) -> State<EnrollmentService> {
    State(EnrollmentService::from_ref(state))
}

async fn error_body(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// --- Authentication ---

#[tokio::test]
async fn test_login_handler_returns_student_binding() {
    let state = seeded_state();
    let Json(response) = handlers::login(
        State(TokenIssuer::from_ref(&state)),
        State(CredentialTable::from_ref(&state)),
        AppJson(LoginRequest {
            email: "student12345@dkit.ie".to_string(),
            password: "Student123!".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.role, Role::Student);
    assert_eq!(response.student_id, Some(2));
    assert_eq!(response.expires_in, 3600);
    assert!(state.tokens.verify(&response.access_token).is_ok());
}

#[tokio::test]
async fn test_login_handler_rejects_bad_password() {
    let state = seeded_state();
    let err = handlers::login(
        State(TokenIssuer::from_ref(&state)),
        State(CredentialTable::from_ref(&state)),
        AppJson(LoginRequest {
            email: "admin@dkit.ie".to_string(),
            password: "nope".to_string(),
        }),
    )
    .await
    .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

// --- Catalogue ---

#[tokio::test]
async fn test_get_department_not_found_body() {
    let state = seeded_state();
    let err = handlers::get_department(State(DepartmentService::from_ref(&state)), AppPath(999))
        .await
        .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "department not found");
}

#[tokio::test]
async fn test_create_course_returns_201() {
    let state = seeded_state();
    let (status, Json(course)) = handlers::create_course(
        admin(),
        courses(&state),
        AppJson(CourseRequest {
            code: "BIO-150".to_string(),
            title: "Genetics".to_string(),
            credits: 4,
            department_id: 1,
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course.department.name, "Biology");
}

#[tokio::test]
async fn test_student_cannot_mutate_courses() {
    let state = seeded_state();
    let request = CourseRequest {
        code: "CS-999".to_string(),
        title: "Hack".to_string(),
        credits: 1,
        department_id: 2,
    };

    let err = handlers::create_course(student(1), courses(&state), AppJson(request.clone()))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Forbidden);

    let err = handlers::update_course(student(1), courses(&state), AppPath(4), AppJson(request))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Forbidden);

    let err = handlers::delete_course(student(1), courses(&state), AppPath(4))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Forbidden);

    // Nothing changed.
    assert_eq!(state.repo.list_courses().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_course_validation_body() {
    let state = seeded_state();
    let err = handlers::create_course(
        admin(),
        courses(&state),
        AppJson(CourseRequest {
            code: "BIO-0".to_string(),
            title: "Nothing".to_string(),
            credits: 0,
            department_id: 1,
        }),
    )
    .await
    .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "credits must be > 0");
}

#[tokio::test]
async fn test_delete_course_returns_204_then_404() {
    let state = seeded_state();

    let status = handlers::delete_course(admin(), courses(&state), AppPath(5))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = handlers::delete_course(admin(), courses(&state), AppPath(5))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

// --- Students ---

#[tokio::test]
async fn test_student_reads_own_record_only() {
    let state = seeded_state();

    let Json(own) = handlers::get_student(student(1), students(&state), AppPath(1))
        .await
        .unwrap();
    assert_eq!(own.enrollments.len(), 1);

    let err = handlers::get_student(student(2), students(&state), AppPath(1))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Forbidden);
}

#[tokio::test]
async fn test_policy_runs_before_existence_check() {
    let state = seeded_state();

    // A foreign, nonexistent id is still 403 for a student.
    let err = handlers::get_student(student(1), students(&state), AppPath(999))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Forbidden);

    // For an admin the same id is 404.
    let err = handlers::get_student(admin(), students(&state), AppPath(999))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::NotFound("student"));
}

#[tokio::test]
async fn test_student_updates_own_record() {
    let state = seeded_state();
    let Json(updated) = handlers::update_student(
        student(2),
        students(&state),
        AppPath(2),
        AppJson(UpdateStudentRequest {
            name: "Shankar".to_string(),
            department_id: Some(1),
        }),
    )
    .await
    .unwrap();

    assert_eq!(updated.department.map(|d| d.name), Some("Biology".to_string()));
}

#[tokio::test]
async fn test_student_registry_is_admin_only() {
    let state = seeded_state();

    assert_eq!(
        handlers::list_students(student(1), students(&state))
            .await
            .unwrap_err(),
        AppError::Forbidden
    );
    assert_eq!(
        handlers::delete_student(student(1), students(&state), AppPath(1))
            .await
            .unwrap_err(),
        AppError::Forbidden
    );

    let Json(all) = handlers::list_students(admin(), students(&state))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let (status, Json(created)) = handlers::create_student(
        admin(),
        students(&state),
        AppJson(CreateStudentRequest {
            student_number: "98765".to_string(),
            name: "Tanaka".to_string(),
            department_id: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.total_credits, 0);

    let status = handlers::delete_student(admin(), students(&state), AppPath(created.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// --- Enrollments ---

#[tokio::test]
async fn test_student_enrolls_and_unenrolls_self() {
    let state = seeded_state();

    let Json(enrolled) = handlers::enroll_student(
        student(1),
        enrollments(&state),
        AppPath(1),
        AppJson(EnrollRequest { course_id: 5 }),
    )
    .await
    .unwrap();
    assert_eq!(enrolled.course_id, 5);
    assert!(enrolled.grade.is_none());

    let Json(listed) = handlers::list_student_courses(student(1), enrollments(&state), AppPath(1))
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);

    let status = handlers::unenroll_student(student(1), enrollments(&state), AppPath((1, 4)))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_duplicate_enrollment_is_409() {
    let state = seeded_state();
    let err = handlers::enroll_student(
        admin(),
        enrollments(&state),
        AppPath(1),
        AppJson(EnrollRequest { course_id: 4 }),
    )
    .await
    .unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_student_cannot_touch_foreign_enrollments() {
    let state = seeded_state();

    assert_eq!(
        handlers::list_student_courses(student(2), enrollments(&state), AppPath(1))
            .await
            .unwrap_err(),
        AppError::Forbidden
    );
    assert_eq!(
        handlers::enroll_student(
            student(2),
            enrollments(&state),
            AppPath(1),
            AppJson(EnrollRequest { course_id: 5 }),
        )
        .await
        .unwrap_err(),
        AppError::Forbidden
    );
    assert_eq!(
        handlers::unenroll_student(student(2), enrollments(&state), AppPath((1, 4)))
            .await
            .unwrap_err(),
        AppError::Forbidden
    );
    assert!(state.repo.get_enrollment(1, 4).await.unwrap().is_some());
}

#[tokio::test]
async fn test_grading_is_admin_only() {
    let state = seeded_state();
    let grade = GradeRequest {
        grade: Some("C".to_string()),
    };

    assert_eq!(
        handlers::update_enrollment_grade(
            student(1),
            enrollments(&state),
            AppPath((1, 4)),
            AppJson(grade.clone()),
        )
        .await
        .unwrap_err(),
        AppError::Forbidden
    );

    let Json(graded) =
        handlers::update_enrollment_grade(admin(), enrollments(&state), AppPath((1, 4)), AppJson(grade))
            .await
            .unwrap();
    assert_eq!(graded.grade.as_deref(), Some("C"));
}

// --- Store failures ---

#[tokio::test]
async fn test_store_failure_is_500_without_detail() {
    let state = state_with(Arc::new(UnavailableRepo));
    let err = handlers::list_courses(courses(&state)).await.unwrap_err();

    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(!body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_forbidden_does_not_touch_store() {
    // The policy answers before the unreachable store is consulted.
    let state = state_with(Arc::new(UnavailableRepo));
    let err = handlers::get_student(student(1), students(&state), AppPath(2))
        .await
        .unwrap_err();

    assert_eq!(err, AppError::Forbidden);
}

#[tokio::test]
async fn test_missing_row_after_write_is_internal() {
    let state = state_with(Arc::new(LossyRepo));
    let err = handlers::create_course(
        admin(),
        courses(&state),
        AppJson(CourseRequest {
            code: "CS-500".to_string(),
            title: "Compilers".to_string(),
            credits: 5,
            department_id: 2,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- Extractor rejections ---

async fn rejected_course_body(content_type: Option<&str>, body: &'static str) -> AppError {
    let mut builder = Request::builder().method("POST").uri("/courses");
    if let Some(value) = content_type {
        builder = builder.header(header::CONTENT_TYPE, value);
    }
    let request = builder.body(Body::from(body)).unwrap();

    match AppJson::<CourseRequest>::from_request(request, &()).await {
        Ok(AppJson(parsed)) => panic!("body was accepted: {parsed:?}"),
        Err(err) => err,
    }
}

#[tokio::test]
async fn test_body_rejections_are_validation_errors() {
    let cases = [
        (Some("application/json"), r#"{"code":"X","title":"t","departmentId":2}"#),
        (Some("application/json"), r#"{"code":"X","title":"t","credits":"four","departmentId":2}"#),
        (Some("application/json"), "{"),
        (None, r#"{"code":"X","title":"t","credits":4,"departmentId":2}"#),
    ];

    for (content_type, body) in cases {
        let err = rejected_course_body(content_type, body).await;
        assert!(matches!(err, AppError::Validation(_)), "{body}: {err:?}");

        let (status, json) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_well_formed_body_is_extracted() {
    let request = Request::builder()
        .method("POST")
        .uri("/courses")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"code":"CS-500","title":"Compilers","credits":5,"departmentId":2}"#,
        ))
        .unwrap();

    let AppJson(course) = AppJson::<CourseRequest>::from_request(request, &())
        .await
        .unwrap();
    assert_eq!(course.code, "CS-500");
    assert_eq!(course.credits, 5);
}

#[tokio::test]
async fn test_path_rejection_is_validation_error() {
    let app = axum::Router::new().route(
        "/courses/{id}",
        axum::routing::get(|AppPath(id): AppPath<i32>| async move { id.to_string() }),
    );

    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .uri("/courses/abc")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "validation_error");
}
