pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use progress_core::Scheduler;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::rate_limit::RateLimiter;
use crate::services::sessions::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub scheduler: Arc<Scheduler>,
    pub sessions: Arc<SessionStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub trust_forwarded_for: bool,
    pub review_limit: u32,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db: Arc::new(db),
            scheduler: Arc::new(Scheduler::new(config.intervals.clone())),
            sessions: Arc::new(SessionStore::new(config.session_idle_timeout)),
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max_requests,
                config.rate_limit_window,
            )),
            trust_forwarded_for: config.trust_forwarded_for,
            review_limit: config.review_limit,
        }
    }
}

/// Build the full router.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Learner routes
        .route("/api/learners/me", get(routes::learners::me))
        // Progress routes
        .route("/api/progress/due", get(routes::progress::due))
        .route("/api/progress/summary", get(routes::progress::summary))
        // Review session routes
        .route(
            "/api/review/session",
            post(routes::review::start)
                .get(routes::review::current)
                .delete(routes::review::end),
        )
        .route("/api/review/answer", post(routes::review::answer))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/learners/register", post(routes::learners::register))
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    tracing::info!(
        intervals = ?config.intervals.as_slice(),
        "Review intervals loaded"
    );

    let addr = config.bind_addr();
    let app = build_router(AppState::new(db, &config));

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
