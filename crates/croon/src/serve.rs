//! HTTP transport: streamable MCP at `/mcp` and a liveness check at `/health`.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handler::SongHandler;

#[derive(Clone)]
pub struct HealthState {
    pub upstream: Arc<str>,
    pub start_time: Instant,
}

/// Liveness only. The upstream is not contacted.
pub async fn handle_health(State(state): State<HealthState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "upstream": &*state.upstream,
    }))
}

/// Build the application router. `cancel` stops open MCP streams on shutdown.
pub fn router(handler: SongHandler, cancel: CancellationToken) -> Router {
    let health = HealthState {
        upstream: Arc::from(handler.adapter().upstream_url()),
        start_time: Instant::now(),
    };

    let mcp = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            cancellation_token: cancel,
            ..Default::default()
        },
    );

    Router::new()
        .nest_service("/mcp", mcp)
        .route("/health", get(handle_health))
        .with_state(health)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until SIGINT or SIGTERM.
pub async fn run(handler: SongHandler, addr: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let app = router(handler, cancel.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("croon listening on {}", addr);
    info!("   MCP (Streamable): POST http://{}/mcp", addr);
    info!("   Health: GET http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            cancel.cancel();
        })
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let terminate = async {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
