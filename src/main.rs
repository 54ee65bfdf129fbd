//! CoursePilot · LMS Course-Management Chat Backend
//!
//! - Axum HTTP + WebSocket API
//! - LLM completion oracle (OpenAI-compatible, via environment variables)
//! - LMS platform collaborator (course/file/quiz endpoints)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   ORACLE_API_KEY     : enables the completion oracle if present
//!   ORACLE_BASE_URL    : default "https://api.groq.com/openai/v1"
//!   ORACLE_MODEL       : default "llama-3.1-8b-instant"
//!   PLATFORM_BASE_URL  : enables the LMS collaborator if present
//!   PLATFORM_TOKEN     : bearer token passed through to the LMS
//!   AGENT_CONFIG_PATH  : path to TOML config (system prompt overrides)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod classify;
mod draft;
mod oracle;
mod platform;
mod handlers;
mod session;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (prompts, oracle router, platform client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "coursepilot_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
