// Keep-alive endpoint.
//
// A process supervisor pings `GET /` to decide whether the bot is still
// alive. It carries no state and knows nothing about Discord.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;

pub const ALIVE_RESPONSE: &str = "Bot is running!";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { ALIVE_RESPONSE }))
}

/// Serve the keep-alive router until the process exits.
pub async fn serve(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind keep-alive endpoint on {}", addr))?;

    tracing::info!("Keep-alive endpoint listening on {}", addr);
    axum::serve(listener, router())
        .await
        .context("Keep-alive endpoint stopped")
}
