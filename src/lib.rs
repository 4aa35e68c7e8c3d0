use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod models;
pub mod pages;
pub mod password;
pub mod repository;

// Access-level segregated routers (public, authenticated, admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use errors::{AppError, AppResult};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// Request bodies may carry a 10 MiB cover image plus the multipart framing and text fields.
pub const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json` and browsable
/// through the Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::create_user_api, handlers::register_admin,
        handlers::login, handlers::logout, handlers::get_session, handlers::refresh_session,
        handlers::list_users, handlers::get_my_image, handlers::get_user_image,
        handlers::update_profile, handlers::list_posts, handlers::get_post,
        handlers::create_post, handlers::update_post, handlers::delete_post,
        handlers::list_all_comments, handlers::list_comments, handlers::add_comment,
        handlers::delete_comment, handlers::get_site_stats
    ),
    components(
        schemas(
            models::Role, models::PublicUser, models::Post, models::Comment,
            models::AuthorSummary, models::PostSummary, models::CommentView, models::PostView,
            models::RegisterUserRequest, models::RegisterAdminRequest, models::LoginRequest,
            models::CreateCommentRequest, models::SessionUser, models::SessionResponse,
            models::ImageResponse, models::ProfileUpdateResponse, models::SiteStats,
        )
    ),
    tags(
        (name = "blog-portal", description = "Blog publishing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request. Cheap to clone: the repository is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    pub config: AppConfig,
}

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

/// auth_middleware
///
/// Runs the `AuthUser` extractor before the handler. Its rejection (401) short-circuits
/// the request, so nothing in `authenticated_routes` runs for anonymous callers.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Unknown `/api/*` paths answer with a JSON 404 instead of falling through to the client.
async fn api_not_found() -> AppError {
    AppError::NotFound("Route not found.".to_string())
}

/// api_router
///
/// The JSON API, relative to its `/api` mount point.
fn api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .nest("/admin", admin::admin_routes())
        .fallback(api_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

/// create_router
///
/// Assembles the API, the docs and (when `STATIC_DIR` is set) the guarded client pages,
/// then wraps everything in the cookie, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router(&state))
        .with_state(state.clone());

    if let Some(static_dir) = state.config.static_dir.as_deref() {
        tracing::info!(static_dir, "serving client pages");
        router = router.merge(pages::page_routes(state.clone(), static_dir));
    }

    router
        .layer(CookieManagerLayer::new())
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
/// Span factory for `TraceLayer`: every log line of a request carries its `x-request-id`.
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
