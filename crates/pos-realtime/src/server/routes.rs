//! HTTP routes over the room manager
//!
//! Let request-handling code relay domain events and let operators inspect
//! who is connected. Every route requires an owner or admin bearer token.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::extractors::PrivilegedIdentity;
use crate::protocol::{timestamp, MessageLevel, OnlineUser};
use crate::response::{ApiError, ApiResult};
use crate::server::GatewayState;

/// Room statistics response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub rooms: BTreeMap<String, usize>,
    pub total_connections: usize,
    pub online_users: usize,
    pub timestamp: String,
}

/// Online listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineResponse {
    pub users: Vec<OnlineUser>,
    pub count: usize,
}

/// Request to relay a domain event to a channel
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub room: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

/// Outcome of a publish
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub room: String,
    pub event: String,
    pub recipients: usize,
}

/// Request to announce a system message to everyone
#[derive(Debug, Deserialize)]
pub struct AnnounceRequest {
    pub message: String,
    #[serde(default)]
    pub level: MessageLevel,
}

/// Outcome of an announcement
#[derive(Debug, Serialize, Deserialize)]
pub struct AnnounceResponse {
    pub recipients: usize,
}

/// Per-room connection counts
///
/// GET /api/realtime/stats
pub async fn stats(
    State(state): State<GatewayState>,
    PrivilegedIdentity(_): PrivilegedIdentity,
) -> Json<StatsResponse> {
    let manager = state.manager();

    Json(StatsResponse {
        rooms: manager.stats(),
        total_connections: manager.connection_count(),
        online_users: manager.user_count(),
        timestamp: timestamp(),
    })
}

/// One row per live connection
///
/// GET /api/realtime/online
pub async fn online(
    State(state): State<GatewayState>,
    PrivilegedIdentity(_): PrivilegedIdentity,
) -> Json<OnlineResponse> {
    let users = state.manager().list_online();
    let count = users.len();
    Json(OnlineResponse { users, count })
}

/// Relay a domain event to a room or implicit channel
///
/// POST /api/realtime/publish
pub async fn publish(
    State(state): State<GatewayState>,
    PrivilegedIdentity(caller): PrivilegedIdentity,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> ApiResult<Json<PublishResponse>> {
    let Json(request) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let event = request.event.trim();
    if event.is_empty() {
        return Err(ApiError::InvalidBody("event is required".to_string()));
    }

    let outcome = state
        .manager()
        .broadcast(&request.room, event, request.payload);
    if !outcome.found {
        return Err(ApiError::UnknownRoom(request.room));
    }

    tracing::info!(
        user_id = %caller.id,
        room = %request.room,
        event = %event,
        recipients = outcome.recipients,
        "Event published"
    );

    Ok(Json(PublishResponse {
        event: event.to_string(),
        room: request.room,
        recipients: outcome.recipients,
    }))
}

/// Send a system message to every connection
///
/// POST /api/realtime/announce
pub async fn announce(
    State(state): State<GatewayState>,
    PrivilegedIdentity(caller): PrivilegedIdentity,
    body: Result<Json<AnnounceRequest>, JsonRejection>,
) -> ApiResult<Json<AnnounceResponse>> {
    let Json(request) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::InvalidBody("message is required".to_string()));
    }

    let recipients = state.manager().announce(message, request.level);

    tracing::info!(user_id = %caller.id, recipients, "Announcement sent");

    Ok(Json(AnnounceResponse { recipients }))
}
