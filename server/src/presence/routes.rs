//! REST endpoints for listener heartbeats, counts and disconnects.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::presence::counts::{compose_all, compose_one};
use crate::presence::registry::{now_millis, PresenceError};
use crate::state::AppState;

impl IntoResponse for PresenceError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub listener_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    /// Real + ambient
    pub count: u64,
    /// Real listeners only
    pub listening: usize,
}

/// POST /api/listeners - Heartbeat.
/// Body: { "listenerId": "...", "channelId": "..." }
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(body): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, PresenceError> {
    let listener_id = body.listener_id.unwrap_or_default();
    let channel_id = body.channel_id.unwrap_or_default();
    let now = now_millis();

    let real = state
        .registry
        .heartbeat_at(&listener_id, &channel_id, now)
        .inspect_err(|e| tracing::warn!(error = %e, "Rejected heartbeat"))?;

    tracing::debug!(
        listener_id = %listener_id,
        channel_id = %channel_id,
        listening = real,
        "Heartbeat"
    );

    Ok(Json(HeartbeatResponse {
        count: compose_one(&channel_id, real, &state.ambient, now),
        listening: real,
    }))
}

/// GET /api/listeners - Composed count for every catalog channel and any
/// other channel with live listeners.
pub async fn query_all(State(state): State<AppState>) -> Json<BTreeMap<String, u64>> {
    let now = now_millis();
    let real = state.registry.query_at(now);
    Json(compose_all(&real, &state.ambient, now))
}

/// GET /api/listeners/real - Real counts only, no ambient padding.
pub async fn query_real(State(state): State<AppState>) -> Json<BTreeMap<String, usize>> {
    Json(state.registry.query())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisconnectRequest {
    pub listener_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// DELETE /api/listeners and POST /api/listeners/disconnect.
/// Body: { "listenerId": "..." }
///
/// Always acknowledges. The body is parsed leniently because page-unload
/// beacons may arrive with any content type, or with no usable body at all.
pub async fn disconnect(State(state): State<AppState>, body: Bytes) -> Json<AckResponse> {
    let listener_id = serde_json::from_slice::<DisconnectRequest>(&body)
        .ok()
        .and_then(|req| req.listener_id)
        .unwrap_or_default();

    if let Some(channel_id) = state.registry.disconnect(&listener_id) {
        tracing::debug!(
            listener_id = %listener_id,
            channel_id = %channel_id,
            "Listener disconnected"
        );
    }

    Json(AckResponse { ok: true })
}
