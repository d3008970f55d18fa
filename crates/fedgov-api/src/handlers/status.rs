//! /status, /neighbors, /devices, /daemon/shutdown handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use fedgov_core::Neighbor;
use fedgov_services::DeviceState;

use super::{reject, ApiState};

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub user: String,
    pub host: String,
    pub devices: DeviceCounts,
    /// Known neighbors, not counting ourselves.
    pub neighbors: usize,
}

#[derive(Serialize)]
pub struct DeviceCounts {
    pub total: usize,
    pub free: usize,
    pub reserved: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let me = state.governor.neighbors().self_record().await;
    let devices = state.governor.leases().devices().await;
    let free = devices
        .iter()
        .filter(|d| d.state == DeviceState::Free)
        .count();
    let neighbors = state.governor.neighbors().len().await.saturating_sub(1);

    Json(StatusResponse {
        user: me.user,
        host: me.host,
        devices: DeviceCounts {
            total: devices.len(),
            free,
            reserved: devices.len() - free,
        },
        neighbors,
    })
}

// ── /neighbors (GET) ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct NeighborsResponse {
    /// Ordered directory; the first entry is this node.
    pub neighbors: Vec<Neighbor>,
}

pub async fn handle_neighbors(State(state): State<ApiState>) -> Json<NeighborsResponse> {
    Json(NeighborsResponse {
        neighbors: state.governor.neighbors().snapshot().await,
    })
}

// ── /neighbors/drop (POST) ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NeighborDropRequest {
    pub user: String,
    pub host: String,
}

#[derive(Serialize)]
pub struct NeighborDropResponse {
    pub user: String,
    pub dropped: bool,
}

pub async fn handle_neighbor_drop(
    State(state): State<ApiState>,
    Json(req): Json<NeighborDropRequest>,
) -> Result<Json<NeighborDropResponse>, (StatusCode, String)> {
    let record = Neighbor::new(req.user, req.host);
    state
        .governor
        .neighbors()
        .drop(&record)
        .await
        .map_err(reject)?;

    tracing::info!(user = %record.user, "neighbor dropped via API");
    Ok(Json(NeighborDropResponse {
        user: record.user,
        dropped: true,
    }))
}

// ── /devices (GET) ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DevicesResponse {
    pub devices: Vec<DeviceInfo>,
}

#[derive(Serialize)]
pub struct DeviceInfo {
    pub id: u32,
    pub state: DeviceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub expires_in_ms: u64,
}

pub async fn handle_devices(State(state): State<ApiState>) -> Json<DevicesResponse> {
    let devices = state
        .governor
        .leases()
        .devices()
        .await
        .into_iter()
        .map(|d| DeviceInfo {
            id: d.id,
            state: d.state,
            task_id: (d.state == DeviceState::Reserved).then_some(d.task_id),
            expires_in_ms: d.expires_in_ms,
        })
        .collect();

    Json(DevicesResponse { devices })
}

// ── /daemon/shutdown (POST) ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());

    Json(ShutdownResponse {
        message: "Shutdown initiated".to_string(),
    })
}
