use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod services;

pub mod routes;
use auth::{Identity, TokenIssuer};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credentials::CredentialTable;
pub use error::AppError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use services::{CourseService, DepartmentService, EnrollmentService, StudentService};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI document
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    modifiers(&BearerAddon),
    paths(
        handlers::login,
        handlers::list_departments, handlers::get_department,
        handlers::list_courses, handlers::get_course, handlers::create_course,
        handlers::update_course, handlers::delete_course,
        handlers::list_students, handlers::get_student, handlers::create_student,
        handlers::update_student, handlers::delete_student,
        handlers::list_student_courses, handlers::enroll_student,
        handlers::update_enrollment_grade, handlers::unenroll_student
    ),
    components(
        schemas(
            models::Role, models::LoginRequest, models::LoginResponse, models::DepartmentView,
            models::CourseRequest, models::CourseSummary, models::CourseDetails,
            models::CreateStudentRequest, models::UpdateStudentRequest, models::StudentSummary,
            models::StudentDetails, models::EnrollRequest, models::GradeRequest,
            models::EnrollmentView,
        )
    ),
    tags(
        (name = "university-api", description = "University records API")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the protected paths.
struct BearerAddon;

impl Modify for BearerAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// AppState
///
/// The single shared container for the store, the configuration and the token issuer.
/// Handlers pull only the part they need through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Store handle shared by every service.
    pub repo: RepositoryState,
    /// The loaded, immutable configuration (includes the credential table).
    pub config: AppConfig,
    /// Signing and verification keys derived from the configured secret.
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self {
            repo,
            config,
            tokens,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for CredentialTable {
    fn from_ref(app_state: &AppState) -> CredentialTable {
        app_state.config.credentials.clone()
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(app_state: &AppState) -> TokenIssuer {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for DepartmentService {
    fn from_ref(app_state: &AppState) -> DepartmentService {
        DepartmentService::new(app_state.repo.clone())
    }
}

impl FromRef<AppState> for CourseService {
    fn from_ref(app_state: &AppState) -> CourseService {
        CourseService::new(app_state.repo.clone())
    }
}

impl FromRef<AppState> for StudentService {
    fn from_ref(app_state: &AppState) -> StudentService {
        StudentService::new(app_state.repo.clone())
    }
}

impl FromRef<AppState> for EnrollmentService {
    fn from_ref(app_state: &AppState) -> EnrollmentService {
        EnrollmentService::new(app_state.repo.clone())
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless it carries a valid bearer token. Extracting
/// `Identity` does the verification; the handler extracts it again to apply the policy.
async fn auth_middleware(_identity: Identity, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, the authentication route layers and the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with method, URI and the `x-request-id` set above, so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
