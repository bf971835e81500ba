//! HTTP API gateway for SeriesAI.
//!
//! Exposes the chat endpoints, profile inspection, and iMessage delivery
//! routes over JSON. Every chat route funnels into the same
//! [`TurnProcessor`], so HTTP users get exactly the same onboarding flow as
//! users reached through the Messages relay.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use seriesai_agent::TurnProcessor;
use seriesai_channels::AppleScriptChannel;
use seriesai_config::AppConfig;
use seriesai_core::channel::Channel;
use seriesai_core::error::TurnError;
use seriesai_core::event::{DomainEvent, EventBus};
use seriesai_core::message::Message;
use seriesai_core::profile::ProfileSummary;
use seriesai_core::store::ProfileStore;
use seriesai_memory::InMemoryProfileStore;

/// User id for `/api/process-message` requests that don't name one.
pub const DEFAULT_USER_ID: &str = "default_user";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub processor: Arc<TurnProcessor>,
    /// Outbound iMessage delivery; `None` disables the `/imessage` routes.
    pub delivery: Option<Arc<dyn Channel>>,
    pub event_bus: Option<Arc<EventBus>>,
}

impl GatewayState {
    fn store(&self) -> &Arc<dyn ProfileStore> {
        self.processor.store()
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Permissive CORS (the chat page may be served from anywhere)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api", get(api_info_handler))
        .route("/chat", post(chat_handler))
        .route("/api/process-message", post(process_message_handler))
        .route("/users/{user_id}", get(get_user_handler))
        .route("/users/{user_id}/history", get(history_handler))
        .route("/users/{user_id}/clear", post(clear_history_handler))
        .route("/imessage/send", post(imessage_send_handler))
        .route("/imessage/chat-agent/{phone_number}", post(imessage_chat_agent_handler))
        .route("/imessage/status", get(imessage_status_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Builds the profile store and turn processor once and shares them across
/// all requests. iMessage delivery is enabled only on macOS.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let event_bus = Arc::new(EventBus::default());
    let processor = Arc::new(
        TurnProcessor::from_config(&config, store).with_event_bus(event_bus.clone()),
    );

    let delivery: Option<Arc<dyn Channel>> = if AppleScriptChannel::is_supported() {
        Some(Arc::new(AppleScriptChannel::new()))
    } else {
        info!("iMessage delivery unavailable on this platform; /imessage routes disabled");
        None
    };

    if !config.has_api_key() {
        tracing::warn!("No API key configured; continuation turns will return the fallback reply");
    }

    let state = Arc::new(GatewayState {
        processor,
        delivery,
        event_bus: Some(event_bus),
    });
    let app = build_router(state);

    info!(addr = %addr, model = %config.model_name, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Errors ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn turn_error(e: TurnError) -> ApiError {
    match e {
        TurnError::InvalidInput(msg) => api_error(StatusCode::BAD_REQUEST, msg),
    }
}

fn not_found(user_id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("User {user_id} not found"))
}

fn delivery_channel(state: &GatewayState) -> Result<Arc<dyn Channel>, ApiError> {
    state.delivery.clone().ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "iMessage integration is only available on macOS",
        )
    })
}

// --- Handlers ---

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct ApiInfoResponse {
    pub message: String,
    pub version: String,
    pub endpoints: std::collections::BTreeMap<String, String>,
}

async fn api_info_handler() -> Json<ApiInfoResponse> {
    let endpoints = [
        ("/chat", "POST - Send a message to the chat agent"),
        ("/api/process-message", "POST - Process a message and return the reply"),
        ("/users/{user_id}", "GET - Retrieve user profile information"),
        ("/users/{user_id}/history", "GET - Retrieve conversation history for a user"),
        ("/users/{user_id}/clear", "POST - Clear conversation history for a user"),
        ("/imessage/send", "POST - Send a message via iMessage"),
        ("/imessage/chat-agent/{phone_number}", "POST - Chat with the agent and reply via iMessage"),
        ("/imessage/status", "GET - Check iMessage status"),
    ]
    .into_iter()
    .map(|(path, description)| (path.to_string(), description.to_string()))
    .collect();

    Json(ApiInfoResponse {
        message: "Series AI API is running".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        endpoints,
    })
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub user_id: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let user_id = payload
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let message = state
        .processor
        .process(&user_id, &payload.message)
        .await
        .map_err(turn_error)?;

    Ok(Json(ChatResponse { message, user_id }))
}

#[derive(Serialize, Deserialize)]
pub struct ProcessMessageResponse {
    pub response: String,
}

async fn process_message_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ProcessMessageResponse>, ApiError> {
    let user_id = payload
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

    info!(user_id = %user_id, "Processing message");

    let response = state
        .processor
        .process(&user_id, &payload.message)
        .await
        .map_err(turn_error)?;

    Ok(Json(ProcessMessageResponse { response }))
}

async fn get_user_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileSummary>, ApiError> {
    let handle = state.store().get(&user_id).await.ok_or_else(|| not_found(&user_id))?;
    let summary = handle.lock().await.summary();
    Ok(Json(summary))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<Message>,
}

async fn history_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let handle = state.store().get(&user_id).await.ok_or_else(|| not_found(&user_id))?;
    let history = handle.lock().await.recent_history(query.limit).to_vec();
    Ok(Json(HistoryResponse { history }))
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn clear_history_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let handle = state.store().get(&user_id).await.ok_or_else(|| not_found(&user_id))?;
    handle.lock().await.reset_conversation();

    info!(user_id = %user_id, "Conversation history cleared");
    Ok(Json(MessageResponse {
        message: "Conversation history cleared successfully".into(),
    }))
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub phone_number: String,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
    pub phone_number: String,
}

/// Deliver `text`, logging and publishing any failure. Returns success.
async fn deliver(state: &GatewayState, channel: &dyn Channel, recipient: &str, text: &str) -> bool {
    match channel.send(recipient, text).await {
        Ok(()) => true,
        Err(e) => {
            error!(recipient, channel = channel.name(), error = %e, "Failed to deliver message");
            if let Some(bus) = &state.event_bus {
                bus.publish(DomainEvent::DeliveryFailed {
                    channel: channel.name().to_string(),
                    recipient: recipient.to_string(),
                    error_message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
            false
        }
    }
}

async fn imessage_send_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let channel = delivery_channel(&state)?;
    if payload.phone_number.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "phone_number must not be empty"));
    }

    let success = deliver(&state, channel.as_ref(), &payload.phone_number, &payload.message).await;
    let message = if success {
        "Message sent successfully"
    } else {
        "Failed to send message"
    };

    Ok(Json(SendResponse {
        success,
        message: message.into(),
        phone_number: payload.phone_number,
    }))
}

#[derive(Deserialize)]
pub struct AgentMessageRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatAgentResponse {
    pub success: bool,
    pub message: String,
    pub phone_number: String,
    pub ai_response: String,
}

async fn imessage_chat_agent_handler(
    State(state): State<SharedState>,
    Path(phone_number): Path<String>,
    Json(payload): Json<AgentMessageRequest>,
) -> Result<Json<ChatAgentResponse>, ApiError> {
    let channel = delivery_channel(&state)?;

    let user_id = format!("phone_{phone_number}");
    let ai_response = state
        .processor
        .process(&user_id, &payload.message)
        .await
        .map_err(turn_error)?;

    let success = deliver(&state, channel.as_ref(), &phone_number, &ai_response).await;
    let message = if success {
        "Response sent via iMessage"
    } else {
        "Failed to send response via iMessage"
    };

    Ok(Json(ChatAgentResponse {
        success,
        message: message.into(),
        phone_number,
        ai_response,
    }))
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub available: bool,
    pub reason: String,
}

async fn imessage_status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    let Some(channel) = &state.delivery else {
        return Json(StatusResponse {
            available: false,
            reason: "Not running on macOS".into(),
        });
    };

    let (available, reason) = match channel.health_check().await {
        Ok(true) => (true, "iMessage is enabled and ready".to_string()),
        Ok(false) => (false, "iMessage is not properly configured".to_string()),
        Err(e) => (false, e.to_string()),
    };
    Json(StatusResponse { available, reason })
}
