use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
    routing::get,
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

// Core: identity, credentials, tokens, persistence, services.
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod stats;
pub mod token;

pub mod routes;
use routes::{blogs, users};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credentials::{CredentialError, CredentialStore};
pub use error::ServiceError;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use services::{BlogService, LoginService, UserService};
pub use token::TokenService;

/// ApiDoc
///
/// OpenAPI document for every endpoint, served at `/api-docs/openapi.json`
/// and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_blogs, handlers::get_blog, handlers::create_blog,
        handlers::update_blog, handlers::delete_blog, handlers::get_blog_stats,
        handlers::register_user, handlers::get_users, handlers::login,
    ),
    components(
        schemas(
            models::BlogResponse, models::BlogOwner, models::UserSummary, models::BlogSummary,
            models::UserResponse, models::NewBlogRequest, models::UpdateBlogRequest,
            models::RegisterUserRequest, models::LoginRequest, models::LoginResponse,
            stats::BlogStats, error::ErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "bloglist", description = "Blog list API")
    )
)]
struct ApiDoc;

/// Registers the `bearer` scheme referenced by the authenticated endpoints.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// AppState
///
/// Everything a request may need, built once at startup and cloned per request.
/// The services share the same repository handle; the token service holds the
/// keys derived from the configured secret.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub tokens: TokenService,
    pub blogs: BlogService,
    pub users: UserService,
    pub login: LoginService,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the services to `repo`, using the secret and hash cost from `config`.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Result<Self, CredentialError> {
        let tokens = TokenService::new(&config.secret);
        let credentials = CredentialStore::new(config.hash_cost)?;
        Ok(Self {
            blogs: BlogService::new(repo.clone()),
            users: UserService::new(repo.clone(), credentials.clone()),
            login: LoginService::new(repo.clone(), credentials, tokens.clone()),
            repo,
            tokens,
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers and the identity middleware pull only the component they use.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for BlogService {
    fn from_ref(app_state: &AppState) -> BlogService {
        app_state.blogs.clone()
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(app_state: &AppState) -> UserService {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for LoginService {
    fn from_ref(app_state: &AppState) -> LoginService {
        app_state.login.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles all routes, runs the identity resolver in front of every one of
/// them, and wraps the result in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "ok" }))
        .merge(blogs::blog_routes())
        .merge(users::user_routes())
        .fallback(handlers::unknown_endpoint)
        // Identity resolution: a bad bearer token stops the request here with 401;
        // otherwise the acting user (or none) is attached for the handler.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_identity,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
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
/// Span for each request carrying method, URI and the `x-request-id` set above,
/// so every log line of one request can be correlated.
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
