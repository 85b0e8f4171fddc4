//! Jianhua · Chinese Reading Companion Backend
//!
//! - Axum HTTP + WebSocket API for the "为什么要简化汉字" reading app
//! - One selection engine per WebSocket session (deep read, skim, vocabulary hunt)
//! - Optional OpenAI-compatible model for analysis, grading, form comparison, tutoring
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   OPENAI_API_KEY    : enables the model if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_MODEL      : default "gpt-4o-mini"
//!   AGENT_CONFIG_PATH : path to TOML config (prompts + reading timings)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod collaborator;
mod config;
mod content;
mod debate;
mod domain;
mod engine;
mod error;
mod logic;
mod openai;
mod pinyin;
mod protocol;
mod routes;
mod state;
mod telemetry;
mod util;

#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "jianhua_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "jianhua_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "jianhua_backend", "Shutdown signal received");
}
