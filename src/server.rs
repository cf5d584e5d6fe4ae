use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::agent::AgentEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AgentEngine>,
}

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub input: String,
}

pub fn build_app(state: AppState) -> Router {
    // Wide open for local frontend dev; tighten allow_origin in production.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/agent", post(agent))
        .route("/api/health", get(health))
        .with_state(state)
        .layer(cors)
}

/// POST /api/agent — run one query against the agent. Delegate failures come
/// back as an error payload, never as a crashed connection.
async fn agent(State(state): State<AppState>, Json(req): Json<AgentRequest>) -> Json<Value> {
    match state.engine.respond(&req.input).await {
        Ok(response) => Json(json!({ "response": response })),
        Err(e) => {
            error!(error = %e, "agent query failed");
            Json(json!({ "error": e.to_string() }))
        }
    }
}

/// GET /api/health — liveness plus knowledge-base status for scripts and the
/// local frontend.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let knowledge = state.engine.knowledge();
    let snapshot = knowledge.current().await;
    Json(json!({
        "status": "ok",
        "tokens": crate::knowledge::types::tokens_in(&snapshot).len(),
        "last_updated": knowledge.refreshed_at().await.to_rfc3339(),
    }))
}

/// Serve the agent API until ctrl-c.
pub async fn serve(engine: Arc<AgentEngine>, port: u16) -> Result<()> {
    let app = build_app(AppState { engine });
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("sniffle agent API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("server error")?;
    Ok(())
}
