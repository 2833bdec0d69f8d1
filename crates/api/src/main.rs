//! Cyber Command API Server

use game::{
    MissionRegistry, MissionTicker, PgIdentity, PgProgressStore, SessionWatch, TickerConfig,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

mod auth;
mod error;
mod routes;
mod state;


use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cyber_command=debug".parse()?)
                .add_directive("api=debug".parse()?)
                .add_directive("game=debug".parse()?),
        )
        .init();

    info!("🎮 Starting Cyber Command API");

    // Load configuration
    let config = common::Config::from_env();

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let watch = SessionWatch::new();
    let identity = Arc::new(PgIdentity::new(
        pool.clone(),
        config.auth_secret.clone(),
        config.session_ttl_hours,
        watch.clone(),
    ));
    let store = Arc::new(PgProgressStore::new(pool));
    let missions = Arc::new(MissionRegistry::new());

    // Start the mission ticker
    let ticker = MissionTicker::new(
        missions.clone(),
        TickerConfig {
            max_idle: chrono::Duration::minutes(config.mission_idle_minutes.max(1)),
            ..TickerConfig::default()
        },
        watch.subscribe(),
    );
    tokio::spawn(ticker.run());
    info!(
        "⏱️ Mission ticker running (idle missions dropped after {} minutes)",
        config.mission_idle_minutes
    );

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), identity, store, missions));

    // Serve the game frontend, falling back to index.html for client routing
    let static_service = ServeDir::new("static")
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new("static/index.html"));

    let app = routes::api_router(state)
        .fallback_service(static_service)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
