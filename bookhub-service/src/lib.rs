pub mod authz;
pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimit},
    security_headers::{security_headers_middleware, API_DOCS_PREFIX},
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{
    AuthzPipeline, OwnershipAuthorizer, Role, RoutePolicy, TokenAuthenticator,
};
use crate::config::{BookhubConfig, SwaggerMode};
use crate::middleware::{authorize, metrics_middleware, RouteGate};
use crate::services::{AccountStore, AuthService, Database, JwtService, OwnershipStore};
use service_core::error::AppError;

/// Resource name reported by the review ownership gate.
const REVIEW_RESOURCE: &str = "Review";

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::metrics::metrics,
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::authors::list_authors,
        handlers::authors::get_author,
        handlers::authors::create_author,
        handlers::authors::update_author,
        handlers::authors::delete_author,
        handlers::categories::list_categories,
        handlers::categories::get_category,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::books::list_books,
        handlers::books::get_book,
        handlers::books::create_book,
        handlers::books::update_book,
        handlers::books::delete_book,
        handlers::reviews::list_book_reviews,
        handlers::reviews::create_review,
        handlers::reviews::update_review,
        handlers::reviews::delete_review,
    ),
    components(
        schemas(
            authz::Role,
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::SignUpRequest,
            dtos::auth::SignInRequest,
            dtos::catalog::AuthorRequest,
            dtos::catalog::CategoryRequest,
            dtos::catalog::BookRequest,
            dtos::catalog::CreateReviewRequest,
            dtos::catalog::UpdateReviewRequest,
            models::AccountResponse,
            models::Author,
            models::Category,
            models::Book,
            models::BookDetail,
            models::Review,
            models::ReviewWithUser,
            services::TokenResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Account registration and sign-in"),
        (name = "Authors", description = "Author management"),
        (name = "Categories", description = "Category management"),
        (name = "Books", description = "Book catalog"),
        (name = "Reviews", description = "Book reviews"),
        (name = "Operations", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BookhubConfig>,
    pub db: Database,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub pipeline: AuthzPipeline,
    pub signin_rate_limiter: IpRateLimit,
    pub signup_rate_limiter: IpRateLimit,
    pub ip_rate_limiter: IpRateLimit,
}

impl AppState {
    /// Wire the services together. Accounts and ownership records are read
    /// through the given stores; catalog data goes through `db`.
    pub fn new(
        config: BookhubConfig,
        db: Database,
        accounts: Arc<dyn AccountStore>,
        ownership: Arc<dyn OwnershipStore>,
    ) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;

        let auth_service =
            AuthService::new(accounts, jwt.clone(), config.security.allow_admin_signup);

        let pipeline = AuthzPipeline::new(
            TokenAuthenticator::new(jwt.clone()),
            OwnershipAuthorizer::new(ownership, REVIEW_RESOURCE),
        );

        let limits = &config.rate_limit;
        let limit = |attempts, window| {
            IpRateLimit::new(
                create_ip_rate_limiter(attempts, window),
                limits.trust_forwarded_for,
            )
        };
        let signin_rate_limiter = limit(limits.signin_attempts, limits.signin_window_seconds);
        let signup_rate_limiter = limit(limits.signup_attempts, limits.signup_window_seconds);
        let ip_rate_limiter = limit(limits.global_ip_limit, limits.global_ip_window_seconds);

        Ok(Self {
            config: Arc::new(config),
            db,
            jwt,
            auth_service,
            pipeline,
            signin_rate_limiter,
            signup_rate_limiter,
            ip_rate_limiter,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let gate = |policy: RoutePolicy| {
        from_fn_with_state(RouteGate::new(state.pipeline.clone(), policy), authorize)
    };

    let signin_route = Router::new()
        .route("/auth/signin", post(handlers::sign_in))
        .layer(from_fn_with_state(
            state.signin_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let signup_route = Router::new()
        .route("/auth/signup", post(handlers::sign_up))
        .layer(from_fn_with_state(
            state.signup_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/authors", get(handlers::list_authors))
        .route("/authors/:id", get(handlers::get_author))
        .route("/categories", get(handlers::list_categories))
        .route("/categories/:id", get(handlers::get_category))
        .route("/books", get(handlers::list_books))
        .route("/books/:id", get(handlers::get_book))
        .route("/reviews/book/:bookId", get(handlers::list_book_reviews));

    let admin_routes = Router::new()
        .route("/authors", post(handlers::create_author))
        .route(
            "/authors/:id",
            put(handlers::update_author).delete(handlers::delete_author),
        )
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route("/books", post(handlers::create_book))
        .route(
            "/books/:id",
            put(handlers::update_book).delete(handlers::delete_book),
        )
        .route_layer(gate(RoutePolicy::role(Role::Admin)));

    let member_routes = Router::new()
        .route("/reviews", post(handlers::create_review))
        .route_layer(gate(RoutePolicy::authenticated()));

    let owner_routes = Router::new()
        .route(
            "/reviews/:id",
            put(handlers::update_review).delete(handlers::delete_review),
        )
        .route_layer(gate(RoutePolicy::owner()));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(signin_route)
        .merge(signup_route)
        .merge(admin_routes)
        .merge(member_routes)
        .merge(owner_routes);

    let openapi_url = format!("{}/openapi.json", API_DOCS_PREFIX);
    app = match state.config.swagger {
        SwaggerMode::Public => {
            app.merge(SwaggerUi::new(API_DOCS_PREFIX).url(openapi_url, ApiDoc::openapi()))
        }
        // The document stays reachable for tooling even without the UI.
        SwaggerMode::Disabled => {
            app.route(&openapi_url, get(|| async { Json(ApiDoc::openapi()) }))
        }
    };

    app.with_state(state.clone())
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn welcome() -> &'static str {
    "Welcome"
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "Operations"
)]
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Response {
    let database_up = state.db.health_check().await.is_ok();

    let (status, health, postgres) = if database_up {
        (StatusCode::OK, "healthy", "up")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "down")
    };

    (
        status,
        Json(serde_json::json!({
            "status": health,
            "service": state.config.service_name,
            "version": state.config.service_version,
            "environment": format!("{:?}", state.config.environment),
            "checks": {
                "postgres": postgres,
            }
        })),
    )
        .into_response()
}
