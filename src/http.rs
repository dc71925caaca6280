//! HTTP transport for the data-prep-agent MCP server
//!
//! Axum router serving MCP over Streamable HTTP at the configured path, plus
//! plain `/health` and JSON `/info`. When a bearer token is configured every
//! route except `/health` requires `Authorization: Bearer <token>`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager,
    tower::{StreamableHttpServerConfig, StreamableHttpService},
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::{DataPrepError, Result};
use crate::server::DataPrepServer;

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub corpus_chunks: Option<usize>,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let cfg = &state.config;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "name": "data-prep-agent",
            "version": env!("CARGO_PKG_VERSION"),
            "llm": {
                "base_url": cfg.llm.base_url,
                "model": cfg.llm.model,
                "api_key_set": cfg.llm.api_key.is_some()
            },
            "paths": {
                "data_dir": cfg.paths.data_dir,
                "output_dir": cfg.paths.output_dir,
                "notebook_dir": cfg.paths.notebook_dir
            },
            "ingest": {
                "glob": cfg.ingest.glob,
                "embedding_provider": cfg.ingest.embedding_provider,
                "chunks": state.corpus_chunks
            },
            "server": {
                "transport": cfg.runtime.transport,
                "bind": cfg.runtime.http_bind.to_string(),
                "path": cfg.runtime.http_path
            }
        })
        .to_string(),
    )
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, "application/json")],
        json!({"error": {"code": 401, "message": "Unauthorized"}}).to_string(),
    )
        .into_response()
}

/// True when the request carries the expected bearer token
pub fn bearer_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim() == expected)
        .unwrap_or(false)
}

async fn require_bearer(
    State(token): State<Option<String>>,
    req: axum::http::Request<Body>,
    next: middleware::Next,
) -> Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }
    match token {
        Some(expected) if !bearer_matches(req.headers(), &expected) => unauthorized(),
        _ => next.run(req).await,
    }
}

/// Build the HTTP router; split from `start_http_server` so it can be
/// exercised without binding a socket
pub fn build_router(server: DataPrepServer) -> Router {
    let state = HttpState {
        config: server.config.clone(),
        corpus_chunks: server.retriever.as_ref().map(|r| r.chunk_count()),
    };

    let path = server.config.runtime.http_path.clone();
    let keepalive = Duration::from_secs(server.config.runtime.http_sse_keepalive_sec);
    let token = server.config.runtime.bearer_token.clone();
    let session_mgr = Arc::new(LocalSessionManager::default());
    let server_factory = server.clone();
    let mcp_service: StreamableHttpService<DataPrepServer, _> = StreamableHttpService::new(
        move || Ok(server_factory.clone()),
        session_mgr,
        StreamableHttpServerConfig {
            stateful_mode: true,
            sse_keep_alive: Some(keepalive),
            ..Default::default()
        },
    );

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .nest_service(path.as_str(), mcp_service)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(middleware::from_fn_with_state(token, require_bearer))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(server: DataPrepServer) -> Result<()> {
    let bind = server.config.runtime.http_bind;
    let path = server.config.runtime.http_path.clone();
    if server.config.runtime.bearer_token.is_none() {
        tracing::warn!("DPA_BEARER_TOKEN is not set; HTTP transport accepts unauthenticated requests");
    }
    let app = build_router(server);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| DataPrepError::Io {
            message: format!("Failed to bind HTTP listener on {}: {}", bind, e),
        })?;

    tracing::info!("Starting HTTP server on {} (MCP at {})", bind, path);

    axum::serve(listener, app)
        .await
        .map_err(|e| DataPrepError::Io {
            message: format!("HTTP server error: {}", e),
        })?;

    Ok(())
}
