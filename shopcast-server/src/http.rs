use crate::signaling::{SignalingService, ws_handler};
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use serde_json::json;
use shopcast_core::{IceServerConfig, RoomId};
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::cors::CorsLayer;

/// Configuration a browser should build its `RTCPeerConnection` with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRtcConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub ice_transport_policy: &'static str,
    pub bundle_policy: &'static str,
    pub rtcp_mux_policy: &'static str,
}

/// WebSocket endpoint plus the stats, config and health endpoints.
pub fn router(service: SignalingService) -> Router {
    let ws_path = service.config().ws_path.clone();

    Router::new()
        .route(&ws_path, get(ws_handler))
        .route("/api/webrtc/stats/{room_id}", get(room_stats))
        .route("/api/webrtc/config", get(rtc_config))
        .route("/api/webrtc/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn room_stats(
    Path(room_id): Path<String>,
    State(service): State<SignalingService>,
) -> Response {
    match service.registry().stats(&RoomId::from(room_id)).await {
        Some(stats) => Json(json!({ "success": true, "stats": stats })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Room not found" })),
        )
            .into_response(),
    }
}

async fn rtc_config(State(service): State<SignalingService>) -> Json<serde_json::Value> {
    let config = ClientRtcConfig {
        ice_servers: service.get_ice_servers(),
        ice_transport_policy: "all",
        bundle_policy: "max-bundle",
        rtcp_mux_policy: "require",
    };
    Json(json!({ "success": true, "config": config }))
}

async fn health() -> Json<serde_json::Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Json(json!({ "status": "healthy", "service": "webrtc", "timestamp": timestamp }))
}
