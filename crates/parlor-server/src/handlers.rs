//! HTTP handlers and server lifecycle for Parlor.
//!
//! Routes:
//! - `POST /participants` - Register a participant
//! - `GET /participants` - List participants
//! - `POST /messages` - Send a message as the `User` header
//! - `GET /messages` - Read messages visible to the `User` header
//! - `POST /status` - Heartbeat for the `User` header
//! - `GET /health` - Liveness check

use crate::config::Config;
use crate::errors::ApiError;
use crate::metrics::{self, LatencyGuard};
use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parlor_core::{parse_limit, ChatError, ChatService, Clock, SystemClock};
use parlor_protocol::api::{ListMessagesQuery, RegisterRequest, SendMessageRequest, USER_HEADER};
use parlor_protocol::{Message, Participant};
use parlor_store::{MemoryStore, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info};

/// Shared server state.
pub struct AppState {
    /// Presence, routing, and sweeping over the store.
    pub chat: ChatService,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config, store: Store, clock: Arc<dyn Clock>) -> Self {
        let chat = ChatService::new(store, clock, config.presence.sweeper_config());
        Self { chat, config }
    }
}

/// Build the application routes.
///
/// Layers, innermost first: request timeout, request tracing, permissive
/// CORS.
pub fn build_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_millis(state.config.http.request_timeout_ms);

    Router::new()
        .route(
            "/participants",
            get(list_participants).post(register_participant),
        )
        .route("/messages", get(list_messages).post(send_message))
        .route("/status", post(heartbeat))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// Starts the expiration sweeper before serving and stops it after the
/// server drains. When a snapshot path is configured, the store is loaded
/// from it at startup and written back at shutdown.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or saved, or if the
/// server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let snapshot_path = config.store.snapshot_path();
    let backend = match &snapshot_path {
        Some(path) if path.exists() => Arc::new(
            MemoryStore::load(path)
                .await
                .with_context(|| format!("Failed to load snapshot: {}", path.display()))?,
        ),
        _ => Arc::new(MemoryStore::new()),
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        Store::from_shared(backend.clone()),
        Arc::new(SystemClock),
    ));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }
    metrics::set_active_participants(state.chat.presence.count().await?);

    // Start the sweeper
    let cancel_token = CancellationToken::new();
    let sweeper = tokio::spawn(state.chat.sweeper.clone().run_with(
        cancel_token.clone(),
        |outcome| match outcome {
            Ok(report) => metrics::record_evictions(report.removed),
            Err(_) => metrics::record_sweep_failure(),
        },
    ));

    let app = build_router(state);

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Parlor server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    if let Err(e) = sweeper.await {
        error!(error = %e, "Sweeper task ended abnormally");
    }

    if let Some(path) = &snapshot_path {
        backend
            .save(path)
            .await
            .with_context(|| format!("Failed to save snapshot: {}", path.display()))?;
    }

    info!("Parlor server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// The acting participant, from the `User` header. Empty when absent.
///
/// Header bytes are decoded as UTF-8 so that names like `João` round-trip.
fn acting_user(headers: &HeaderMap) -> Result<String, ApiError> {
    match headers.get(USER_HEADER) {
        None => Ok(String::new()),
        Some(value) => std::str::from_utf8(value.as_bytes())
            .map(str::to_string)
            .map_err(|_| ChatError::Validation("User header is not valid UTF-8".into()).into()),
    }
}

/// The JSON request body. A body sent without a JSON content type reads as
/// empty, and any other rejection is a validation error.
fn json_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(ChatError::Validation(rejection.body_text()).into()),
    }
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn register_participant(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let _latency = LatencyGuard::new("register");
    let body = json_body(body)?;

    state.chat.presence.register(&body.name).await?;
    metrics::record_registration();

    debug!(participant = %body.name, "Registered");
    Ok(StatusCode::CREATED)
}

async fn list_participants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let _latency = LatencyGuard::new("list_participants");

    let participants = state.chat.presence.list().await?;
    Ok(Json(participants))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let _latency = LatencyGuard::new("send_message");
    let from = acting_user(&headers)?;
    let body = json_body(body)?;

    state
        .chat
        .router
        .send(&from, &body.to, &body.text, &body.kind)
        .await?;
    metrics::record_message(&body.kind);

    Ok(StatusCode::CREATED)
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ListMessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let _latency = LatencyGuard::new("list_messages");
    let requester = acting_user(&headers)?;
    let Query(query) =
        query.map_err(|rejection| ApiError::from(ChatError::Validation(rejection.body_text())))?;

    let limit = parse_limit(query.limit.as_deref())?;
    let messages = state.chat.router.list(&requester, limit).await?;
    Ok(Json(messages))
}

async fn heartbeat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let _latency = LatencyGuard::new("heartbeat");
    let name = acting_user(&headers)?;

    state.chat.presence.heartbeat(&name).await?;
    metrics::record_heartbeat();

    Ok(StatusCode::OK)
}
