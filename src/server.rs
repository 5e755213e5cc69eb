//! HTTP server for feeding the engine from a browser or another process.
//!
//! This module provides an HTTP server that:
//! - Accepts classifier samples, transcript fragments, light samples and
//!   feedback as JSON
//! - Runs them through a shared [`MicroexpressionEngine`]
//! - Returns the engine events each input produced
//!
//! # Architecture
//!
//! ```text
//! Classifier ──→ POST /samples ─────┐
//! Recognizer ──→ POST /transcripts ─┼──→ engine ──→ GET /pairs, GET /status
//! Camera     ──→ POST /light ───────┤
//! User       ──→ POST /feedback ────┘
//! ```

use crate::collector::types::{ExpressionSample, Feedback, LightSample, TranscriptFragment};
use crate::config::Config;
use crate::core::engine::{EngineEvent, EngineStatus, MicroexpressionEngine};
use crate::core::matcher::EmotionWordPair;
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Engine configuration
    pub engine_config: Config,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, engine_config: Config) -> Self {
        Self {
            port,
            engine_config,
        }
    }
}

/// Shared server state
pub struct ServerState {
    engine: Mutex<MicroexpressionEngine>,
    display_limit: usize,
}

impl ServerState {
    /// Create new server state with an engine on the system clock
    pub fn new(config: &Config) -> Self {
        Self::with_engine(MicroexpressionEngine::new(config), config.display_limit)
    }

    /// Wrap an existing engine
    pub fn with_engine(engine: MicroexpressionEngine, display_limit: usize) -> Self {
        Self {
            engine: Mutex::new(engine),
            display_limit,
        }
    }
}

/// Events produced by one input
#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub status: String,
    pub events: Vec<EngineEvent>,
}

impl EventsResponse {
    fn ok(events: Vec<EngineEvent>) -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
            events,
        })
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Query parameters for GET /pairs
#[derive(Debug, Deserialize)]
pub struct PairsQuery {
    pub limit: Option<usize>,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /samples
///
/// Malformed samples are still counted by the engine, but the caller gets a
/// 422 with the reason.
async fn samples(
    State(state): State<Arc<ServerState>>,
    Json(sample): Json<ExpressionSample>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.engine.lock().await.push_sample(sample);

    if let Some(EngineEvent::SampleDropped { reason, .. }) = events
        .iter()
        .find(|e| matches!(e, EngineEvent::SampleDropped { .. }))
    {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!("Sample rejected: {reason}"),
                code: "INVALID_SAMPLE".to_string(),
            }),
        ));
    }

    Ok(EventsResponse::ok(events))
}

/// POST /transcripts
async fn transcripts(
    State(state): State<Arc<ServerState>>,
    Json(fragment): Json<TranscriptFragment>,
) -> Json<EventsResponse> {
    let events = state.engine.lock().await.push_word(&fragment.text);
    EventsResponse::ok(events)
}

/// POST /light
async fn light(
    State(state): State<Arc<ServerState>>,
    Json(sample): Json<LightSample>,
) -> Json<EventsResponse> {
    let events = state.engine.lock().await.push_light(sample);
    EventsResponse::ok(events)
}

/// POST /feedback
async fn feedback(
    State(state): State<Arc<ServerState>>,
    Json(feedback): Json<Feedback>,
) -> Json<EventsResponse> {
    let events = state.engine.lock().await.push_feedback(feedback);
    EventsResponse::ok(events)
}

/// GET /pairs
///
/// Most recent pairs first.
async fn pairs(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PairsQuery>,
) -> Json<Vec<EmotionWordPair>> {
    let limit = query.limit.unwrap_or(state.display_limit);
    let engine = state.engine.lock().await;
    Json(engine.recent_pairs(limit).into_iter().cloned().collect())
}

/// GET /status
async fn status(State(state): State<Arc<ServerState>>) -> Json<EngineStatus> {
    Json(state.engine.lock().await.status())
}

/// Build the router over shared state
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/samples", post(samples))
        .route("/transcripts", post(transcripts))
        .route("/light", post(light))
        .route("/feedback", post(feedback))
        .route("/pairs", get(pairs))
        .route("/status", get(status))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    config.engine_config.validate()?;
    let state = Arc::new(ServerState::new(&config.engine_config));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Microexpression server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
