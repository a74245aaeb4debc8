//! satoshi-signal HTTP Server
//!
//! Axum-based REST API over the recommendation engine, the profile book and
//! the narrative advisor. Market data is refreshed by a background task.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signal_core::{JsonFileStore, LiveMarketProvider, MarketFeed, NarrativeAdvisor, ProfileService};

use crate::config::ServerConfig;
use crate::handlers::{
    analyze, create_profile, delete_profile, edit_active, execute_buy, health_check,
    list_profiles, market, navigate, recommendation, recommendation_advice, reset_period,
    select_profile, simulate,
};
use crate::state::AppState;

/// All routes over `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_check))

        // Market & engine
        .route("/api/market", get(market))
        .route("/api/recommendation", get(recommendation))
        .route("/api/recommendation/advice", post(recommendation_advice))
        .route("/api/analyze", post(analyze))
        .route("/api/lab", post(simulate))

        // Profiles
        .route("/api/profiles", get(list_profiles).post(create_profile))
        .route("/api/profiles/active", patch(edit_active))
        .route("/api/profiles/{id}/select", post(select_profile))
        .route("/api/profiles/{id}", delete(delete_profile))
        .route("/api/buy", post(execute_buy))
        .route("/api/period/reset", post(reset_period))

        // Navigation
        .route("/api/screen", post(navigate))

        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    // Market data
    let provider = Arc::new(LiveMarketProvider::from_env()?);
    let feed = Arc::new(MarketFeed::new(provider));
    let initial = feed.load().await;
    if initial.is_mock {
        tracing::warn!("⚠ Live market data unavailable - serving fallback snapshot");
    } else {
        tracing::info!("✓ Market data loaded");
    }

    // Profiles
    let store = Arc::new(JsonFileStore::new(&config.store_path));
    let profiles = Arc::new(ProfileService::open(store).await?);
    tracing::info!("✓ Profile store at {}", config.store_path.display());

    // Narrator
    let narrator = signal_runtime::narrator_from_env()?;
    tracing::info!("✓ Narrator: {}", narrator.name());
    let advisor = NarrativeAdvisor::new(narrator);

    // Background polling
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = tokio::spawn(feed.clone().run(config.poll_every, shutdown_rx));

    let state = AppState {
        feed,
        profiles,
        advisor,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 satoshi-signal server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                     - Health check");
    tracing::info!("  GET    /api/market                 - Market snapshot");
    tracing::info!("  GET    /api/recommendation         - Today's buy");
    tracing::info!("  POST   /api/recommendation/advice  - Buy + AI insight");
    tracing::info!("  POST   /api/analyze                - Prompt relay");
    tracing::info!("  POST   /api/lab                    - Simulation lab");
    tracing::info!("  GET    /api/profiles               - Profile book");
    tracing::info!("  POST   /api/buy                    - Record a buy");
    tracing::info!("");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    poller.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
