// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard HTTP server built on axum.
//!
//! Sets up routes, the static media file route, and shared state.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use relato_config::model::DashboardConfig;
use relato_core::traits::ActivityStore;
use relato_core::RelatoError;

use crate::handlers::{self, DashboardState};

/// Builds the dashboard router over the given store.
///
/// Routes:
/// - GET /            static HTML report
/// - GET /api/report  JSON report
/// - GET /health      liveness probe
/// - GET /media/*     stored photo files
pub fn build_router(store: Arc<dyn ActivityStore + Send + Sync>) -> Router {
    let media_root = store.media_root();
    let state = DashboardState { store };

    Router::new()
        .route("/", get(handlers::get_index))
        .route("/api/report", get(handlers::get_report))
        .route("/health", get(handlers::get_health))
        .nest_service("/media", ServeDir::new(media_root))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds to the configured host:port and serves the dashboard until the
/// task is cancelled or the listener fails.
pub async fn start_server(
    config: &DashboardConfig,
    store: Arc<dyn ActivityStore + Send + Sync>,
) -> Result<(), RelatoError> {
    let app = build_router(store);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelatoError::Internal(format!("failed to bind dashboard to {addr}: {e}")))?;

    tracing::info!("dashboard listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| RelatoError::Internal(format!("dashboard server error: {e}")))?;

    Ok(())
}
