//! HTTP gateway for ChatRelay.
//!
//! Exposes the "submit a turn" operation as `POST /chat`, plus liveness
//! endpoints. Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use chatrelay_config::{AppConfig, GatewayConfig};
use chatrelay_relay::{RelaySettings, TurnError, TurnFailure, TurnOrchestrator};

/// Shared application state for the gateway.
///
/// Read-only after startup, so no lock is needed.
pub struct GatewayState {
    pub orchestrator: TurnOrchestrator,
}

type SharedState = Arc<GatewayState>;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS from `gateway.allowed_origins`
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// `"*"` anywhere in the list allows every origin. Otherwise only the listed
/// origins are allowed; entries that are not valid header values are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    if origins.iter().any(|o| o.trim() == "*") {
        return base.allow_origin(Any);
    }

    let exact: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.trim().parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(exact))
}

/// Start the gateway HTTP server.
///
/// Builds provider, store and orchestrator once and shares them across
/// requests.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = chatrelay_providers::build_from_config(&config);
    let store = chatrelay_store::build_from_config(&config.store).await?;
    let settings = RelaySettings::from_config(&config.relay);

    info!(
        provider = %provider.name(),
        store = %store.name(),
        primary = %settings.primary_model,
        fallback = %settings.fallback_model,
        "Relay configured"
    );

    let state = Arc::new(GatewayState {
        orchestrator: TurnOrchestrator::new(provider, store, settings),
    });
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    message: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        message: "Chatbot backend running",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Missing fields deserialize as empty and are rejected by the orchestrator.
#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    trace: Vec<String>,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    info!(
        session = %payload.session_id,
        message_len = payload.message.len(),
        "Chat request received"
    );

    match state
        .orchestrator
        .handle_turn(&payload.session_id, &payload.message)
        .await
    {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(failure) => failure_response(failure),
    }
}

fn failure_response(failure: TurnFailure) -> Response {
    let status = match failure.error {
        TurnError::InvalidInput => StatusCode::BAD_REQUEST,
        TurnError::BothModelsExhausted => StatusCode::BAD_GATEWAY,
        TurnError::InboundNotPersisted(_)
        | TurnError::HistoryUnavailable(_)
        | TurnError::ReplyNotPersisted(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorResponse {
        error: failure.error.to_string(),
        trace: failure.trace,
    };
    (status, Json(body)).into_response()
}
