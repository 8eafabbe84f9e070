//! Personal website API
//!
//! A REST backend exchanging Basic credentials for short-lived tokens and
//! serving likes, posts and a hash list stored in Firestore. It also
//! triggers site builds and Firestore backups.

mod api;
mod auth;
mod build;
mod config;
mod db;
mod errors;
mod filter;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use build::BuildService;
use config::Config;
use db::Repository;

/// Methods advertised in `Access-Control-Allow-Methods`.
const ALLOWED_METHODS: &str = "POST, PUT, GET, OPTIONS, DELETE";
/// Headers advertised in `Access-Control-Allow-Headers`.
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub builds: Arc<BuildService>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting web API");
    tracing::info!(environment = %config.environment, "Loaded configuration");
    tracing::info!("Firestore project: {}", config.gcloud_project_id);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if secrets are not configured
    if config.api_username.is_empty() || config.api_password.is_empty() {
        tracing::warn!("API credentials not configured (API_USERNAME/API_PASSWORD). Every /auth call will be rejected!");
    }
    if config.token_secret.is_empty() {
        tracing::warn!("No token secret configured (TOKEN_SECRET). Tokens can be neither issued nor validated!");
    }
    if config.build_service_endpoint.is_empty() {
        tracing::warn!("No build service endpoint configured. POST /builds will fail!");
    }

    // Initialize document store
    let repo = Arc::new(db::init_repository(&config)?);
    let builds = Arc::new(BuildService::new(&config)?);

    // Create application state
    let state = AppState {
        repo,
        builds,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let origin = state.config.allowed_origin.clone();

    // CORS configuration; answers preflight requests before routing
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(origin.clone())
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::POST,
            Method::PUT,
            Method::GET,
            Method::OPTIONS,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Clone secret for the auth layer
    let token_secret: Arc<str> = Arc::from(state.config.token_secret.as_str());

    // Token-protected routes
    let api_routes = Router::new()
        .route("/hello", get(api::hello))
        // Likes
        .route("/likes", get(api::list_likes).post(api::create_like))
        .route("/likes/{id}", get(api::get_like).delete(api::delete_like))
        // Posts
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route(
            "/posts/{id}",
            get(api::get_post)
                .post(api::update_post)
                .put(api::update_post)
                .delete(api::delete_post),
        )
        // Hashes
        .route("/hashes", get(api::get_hashes).post(api::update_hashes))
        // Builds and backups
        .route("/builds", post(api::trigger_build))
        .route("/backups", post(api::create_backup))
        // Apply token auth middleware
        .route_layer(middleware::from_fn(move |req, next| {
            auth::jwt_auth_layer(token_secret.clone(), req, next)
        }));

    // Credential exchange and health check (no token required)
    let public_routes = Router::new()
        .route("/auth", post(api::issue_auth_token))
        .route("/health", get(health_check));

    Router::new()
        .merge(api_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            origin,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(middleware::from_fn(api::request_id_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
