//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use tc_core::{Orchestrator, ServerConfig, SessionManager};

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, sessions: Arc<SessionManager>) -> Self {
        Self {
            orchestrator,
            sessions,
        }
    }
}

/// Build the application router with its layers
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state, config.max_upload_bytes);

    // HOST may be a name such as localhost or a bare IPv6 literal
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}:{}: {}", config.host, config.port, e))?;
    info!("Travel Companion listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
