//! /pubsub handlers: the peer-to-peer protocol.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::Json;

use fedgov_core::{DeviceLease, ExtendRequest, JoinRequest, JoinResponse, Neighbor, ProbeRequest};

use super::{lease_duration, reject, require_non_empty, ApiState};

// ── /pubsub/join (POST) ───────────────────────────────────────────────────────

/// Add the caller to our directory and hand back everyone else we know.
pub async fn handle_join(
    State(state): State<ApiState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, (StatusCode, String)> {
    require_non_empty("user", &req.user)?;

    let host = match req.host {
        Some(h) if !h.is_empty() => h.trim_end_matches('/').to_string(),
        _ => format!("http://{}", SocketAddr::new(remote.ip(), req.port)),
    };

    tracing::debug!(user = %req.user, host = %host, "join received");
    let resp = state.governor.join(Neighbor::new(req.user, host)).await;
    Ok(Json(resp))
}

// ── /pubsub/probe (POST) ──────────────────────────────────────────────────────

/// Lease any free local device for the default lease length.
pub async fn handle_probe(
    State(state): State<ApiState>,
    Json(req): Json<ProbeRequest>,
) -> Result<Json<DeviceLease>, (StatusCode, String)> {
    require_non_empty("task_id", &req.task_id)?;

    state
        .governor
        .probe(&req.target_id, &req.task_id, None)
        .await
        .map(Json)
        .map_err(reject)
}

// ── /pubsub/extend (POST) ─────────────────────────────────────────────────────

/// Renew a lease previously granted by a probe.
pub async fn handle_extend(
    State(state): State<ApiState>,
    Json(req): Json<ExtendRequest>,
) -> Result<Json<DeviceLease>, (StatusCode, String)> {
    require_non_empty("task_id", &req.task_id)?;
    let duration = lease_duration(req.lease, state.max_lease)?;

    state
        .governor
        .extend(&req.target_id, req.id, &req.task_id, duration)
        .await
        .map(Json)
        .map_err(reject)
}
