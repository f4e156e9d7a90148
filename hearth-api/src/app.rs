/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use hearth_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = hearth_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health
/// └── /api/
///     ├── /events                      GET, POST
///     │   └── /:id                     GET, PUT, DELETE
///     │       ├── /register            POST
///     │       ├── /registrations       GET
///     │       └── /analytics           GET
///     ├── /registrations               GET
///     │   └── /:id                     GET, PUT, DELETE
///     │       └── /check-in            POST, DELETE
///     ├── /books, /videos, /articles   GET, POST
///     │   └── /:id                     GET, PUT, DELETE
///     ├── /exec-positions              GET, POST
///     │   └── /:id                     GET, PUT, DELETE
///     │       └── /applications        GET, POST
///     ├── /applications                GET
///     │   └── /:id                     GET, PUT, DELETE
///     ├── /accounts                    POST
///     │   ├── /login                   POST
///     │   └── /:id                     GET, PUT, DELETE
///     └── /analytics                   GET
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
///
/// Unknown paths answer 404 and known paths with the wrong verb answer 405,
/// both in the error envelope.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{
        accounts, analytics, applications, articles, books, events, exec_positions, health,
        registrations, videos,
    };

    let event_routes = Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/:id/register", post(events::register_for_event))
        .route("/:id/registrations", get(events::list_event_registrations))
        .route("/:id/analytics", get(events::event_analytics));

    let registration_routes = Router::new()
        .route("/", get(registrations::list_registrations))
        .route(
            "/:id",
            get(registrations::get_registration)
                .put(registrations::update_registration)
                .delete(registrations::delete_registration),
        )
        .route(
            "/:id/check-in",
            post(registrations::check_in).delete(registrations::undo_check_in),
        );

    let book_routes = Router::new()
        .route("/", get(books::list_books).post(books::create_book))
        .route(
            "/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        );

    let video_routes = Router::new()
        .route("/", get(videos::list_videos).post(videos::create_video))
        .route(
            "/:id",
            get(videos::get_video)
                .put(videos::update_video)
                .delete(videos::delete_video),
        );

    let article_routes = Router::new()
        .route("/", get(articles::list_articles).post(articles::create_article))
        .route(
            "/:id",
            get(articles::get_article)
                .put(articles::update_article)
                .delete(articles::delete_article),
        );

    let position_routes = Router::new()
        .route(
            "/",
            get(exec_positions::list_positions).post(exec_positions::create_position),
        )
        .route(
            "/:id",
            get(exec_positions::get_position)
                .put(exec_positions::update_position)
                .delete(exec_positions::delete_position),
        )
        .route(
            "/:id/applications",
            get(exec_positions::list_position_applications).post(exec_positions::apply),
        );

    let application_routes = Router::new()
        .route("/", get(applications::list_applications))
        .route(
            "/:id",
            get(applications::get_application)
                .put(applications::update_application)
                .delete(applications::delete_application),
        );

    let account_routes = Router::new()
        .route("/", post(accounts::signup))
        .route("/login", post(accounts::login))
        .route(
            "/:id",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        );

    let api_routes = Router::new()
        .nest("/events", event_routes)
        .nest("/registrations", registration_routes)
        .nest("/books", book_routes)
        .nest("/videos", video_routes)
        .nest("/articles", article_routes)
        .nest("/exec-positions", position_routes)
        .nest("/applications", application_routes)
        .nest("/accounts", account_routes)
        .route("/analytics", get(analytics::summary));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Configure CORS based on environment
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
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
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

async fn method_not_allowed() -> axum::response::Response {
    use axum::{http::StatusCode, response::IntoResponse, Json};

    let body = crate::error::ErrorResponse {
        success: false,
        error: "Method not allowed".to_string(),
        details: None,
    };
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}
