mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{close_pool, create_pool, ensure_schema};
use crate::interview::orchestrator::Interviewer;
use crate::llm_client::provider::{ProviderCredentials, ProviderFactory, ProviderRole};
use crate::llm_client::ChatCompletionsTransport;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AI Interviewer API v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_target());

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize LLM providers; a missing key only fails the calls that need it
    let transport = ChatCompletionsTransport::new(Duration::from_secs(config.llm_timeout_secs))?;
    let providers = ProviderFactory::new(ProviderCredentials::from_config(&config), Arc::new(transport));
    for role in [ProviderRole::QuestionsAndReference, ProviderRole::Evaluation] {
        if providers.is_configured(role) {
            info!("LLM provider for {role} initialized (model: {})", role.model());
        } else {
            warn!(
                "{} is not set; {role} calls will fail until it is configured",
                role.credential_setting()
            );
        }
    }

    let state = AppState {
        db: db.clone(),
        interviewer: Interviewer::new(providers),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the interview frontend origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(&db).await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
