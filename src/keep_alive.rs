//! Liveness responder for hosts that ping the bot over HTTP to keep it awake.

use axum::{Router, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

const ALIVE: &str = "I'm alive";

pub fn router() -> Router {
    Router::new()
        .route("/", get(|| async { ALIVE }))
        .route("/health", get(|| async { "OK" }))
}

/// Serves [`router`] on `listener` until the process exits.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    info!("Keep-alive endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await
}

/// Binds every interface on `port`.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await
}
