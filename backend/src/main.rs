//! Blog Backend
//!
//! A small REST backend managing blog posts in memory, with an optional
//! username/password login gate in front of every post route.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod query;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{CredentialStore, SessionIssuer};
use config::{Config, LogFormat};
use store::PostStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostStore>,
    pub credentials: Arc<CredentialStore>,
    /// Present only in the authenticated variant.
    pub sessions: Option<Arc<SessionIssuer>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the state described by `config`.
    pub fn from_config(config: Config) -> Self {
        let posts = if config.seed_posts {
            PostStore::seeded()
        } else {
            PostStore::new()
        };

        let sessions = config.auth_enabled.then(|| {
            let issuer = match &config.token_secret {
                Some(secret) => SessionIssuer::new(secret, config.token_ttl_secs),
                None => {
                    tracing::warn!(
                        "No token secret configured (BLOG_TOKEN_SECRET). Tokens will not survive a restart!"
                    );
                    SessionIssuer::with_random_secret(config.token_ttl_secs)
                }
            };
            Arc::new(issuer)
        });

        Self {
            posts: Arc::new(posts),
            credentials: Arc::new(CredentialStore::new()),
            sessions,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Blog Backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.auth_enabled {
        tracing::info!("Authentication enabled: /register and /login are mounted");
    } else {
        tracing::warn!("Authentication disabled (BLOG_AUTH_ENABLED). Post routes are open!");
    }

    // Create application state
    let state = AppState::from_config(config);
    tracing::info!("Post store initialized with {} posts", state.posts.list().await.len());
    let bind_addr = state.config.bind_addr;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let mut api_routes = Router::new()
        .route("/posts", get(api::list_posts))
        .route("/posts", post(api::create_post))
        .route("/posts/search", get(api::search_posts))
        .route("/posts/{id}", put(api::update_post))
        .route("/posts/{id}", delete(api::delete_post));

    let mut account_routes = Router::new();

    if let Some(sessions) = state.sessions.clone() {
        // Apply bearer auth middleware
        api_routes = api_routes.layer(middleware::from_fn(move |req, next| {
            auth::bearer_auth_layer(sessions.clone(), req, next)
        }));

        account_routes = account_routes
            .route("/register", post(api::register))
            .route("/login", post(api::login));
    }

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(account_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
