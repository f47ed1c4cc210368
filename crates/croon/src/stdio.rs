//! MCP over stdin/stdout, for clients that launch croon as a subprocess.

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing::info;

use crate::handler::SongHandler;

/// Serve until the client closes stdin.
pub async fn run(handler: SongHandler) -> Result<()> {
    let service = handler
        .serve(stdio())
        .await
        .context("Failed to start stdio MCP service")?;

    info!("stdio MCP server running");

    service
        .waiting()
        .await
        .context("stdio MCP service ended abnormally")?;

    info!("stdio MCP server shut down");
    Ok(())
}
