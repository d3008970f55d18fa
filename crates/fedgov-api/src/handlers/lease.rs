//! /acquire and /renew handlers: local-first leasing with peer forwarding.
//!
//! Acquire tries our own devices first, then asks each other neighbor in
//! directory order. A neighbor answering 409 has restarted under a new id;
//! its stale record is dropped and the next neighbor is tried.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use fedgov_core::{DeviceLease, ExtendRequest, Neighbor, ProbeRequest, SwarmError};

use crate::client::PeerReply;

use super::{lease_duration, reject, require_non_empty, ApiState};

/// A lease together with the node that granted it.
#[derive(Serialize)]
pub struct PlacedLease {
    pub user: String,
    pub host: String,
    pub lease: DeviceLease,
    /// Set when the granting node held the device for less than the caller
    /// asked for. `lease.expiration` is then the real deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_secs: Option<u64>,
}

impl PlacedLease {
    fn full(peer: Neighbor, lease: DeviceLease) -> Self {
        Self {
            user: peer.user,
            host: peer.host,
            lease,
            requested_secs: None,
        }
    }
}

// ── /acquire (POST) ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AcquireRequest {
    /// Generated when absent.
    #[serde(default)]
    pub task_id: Option<String>,
    /// Seconds. Defaults to the node's default lease.
    #[serde(default)]
    pub lease: Option<u64>,
}

pub async fn handle_acquire(
    State(state): State<ApiState>,
    Json(req): Json<AcquireRequest>,
) -> Result<Json<PlacedLease>, (StatusCode, String)> {
    let duration = match req.lease {
        Some(secs) => lease_duration(secs, state.max_lease)?,
        None => state.governor.default_lease(),
    };

    let me = state.governor.neighbors().self_record().await;
    let task_id = match req.task_id {
        Some(t) if !t.is_empty() => t,
        _ => derive_task_id(&me.user, state.governor.now_ms()),
    };

    match state
        .governor
        .probe(&me.user, &task_id, Some(duration))
        .await
    {
        Ok(lease) => return Ok(Json(PlacedLease::full(me, lease))),
        Err(SwarmError::LeaseUnavailable) => {}
        Err(e) => return Err(reject(e)),
    }

    let peers = state.governor.neighbors().snapshot().await;
    for peer in peers.into_iter().skip(1) {
        if let Some(placed) = forward_probe(&state, peer, &task_id, req.lease).await {
            return Ok(Json(placed));
        }
    }

    tracing::info!(task_id = %task_id, "no free device anywhere in the swarm");
    Err((
        StatusCode::SERVICE_UNAVAILABLE,
        "no free device in the swarm".to_string(),
    ))
}

/// Probe one neighbor. A granted lease is stretched to the requested
/// length with a follow-up extend, since probes carry the peer's default.
/// If the stretch is refused the shorter lease is still returned, flagged
/// with the length that was asked for.
async fn forward_probe(
    state: &ApiState,
    peer: Neighbor,
    task_id: &str,
    lease_secs: Option<u64>,
) -> Option<PlacedLease> {
    let req = ProbeRequest {
        target_id: peer.user.clone(),
        task_id: task_id.to_string(),
    };

    let lease = match state.client.probe(&peer.host, &req).await {
        Ok(PeerReply::Granted(lease)) => lease,
        Ok(PeerReply::Gone(msg)) => {
            tracing::info!(user = %peer.user, host = %peer.host, reason = %msg, "neighbor restarted, dropping stale record");
            forget(state, &peer).await;
            return None;
        }
        Ok(PeerReply::Unavailable) | Ok(PeerReply::Mismatch) => return None,
        Err(e) => {
            tracing::warn!(user = %peer.user, error = %e, "forwarded probe failed");
            return None;
        }
    };

    tracing::info!(user = %peer.user, device = lease.id, task_id, "device leased on neighbor");

    let Some(secs) = lease_secs else {
        return Some(PlacedLease::full(peer, lease));
    };
    let extend = ExtendRequest {
        target_id: peer.user.clone(),
        id: lease.id,
        task_id: task_id.to_string(),
        lease: secs,
    };
    match state.client.extend(&peer.host, &extend).await {
        Ok(PeerReply::Granted(stretched)) => Some(PlacedLease::full(peer, stretched)),
        Ok(reply) => {
            tracing::warn!(user = %peer.user, reply = ?reply, requested_secs = secs, "could not stretch forwarded lease");
            Some(short(peer, lease, secs))
        }
        Err(e) => {
            tracing::warn!(user = %peer.user, error = %e, requested_secs = secs, "could not stretch forwarded lease");
            Some(short(peer, lease, secs))
        }
    }
}

fn short(peer: Neighbor, lease: DeviceLease, requested_secs: u64) -> PlacedLease {
    PlacedLease {
        requested_secs: Some(requested_secs),
        ..PlacedLease::full(peer, lease)
    }
}

// ── /renew (POST) ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RenewRequest {
    pub target_id: String,
    pub id: u32,
    pub task_id: String,
    /// Seconds.
    pub lease: u64,
}

pub async fn handle_renew(
    State(state): State<ApiState>,
    Json(req): Json<RenewRequest>,
) -> Result<Json<PlacedLease>, (StatusCode, String)> {
    require_non_empty("task_id", &req.task_id)?;
    let duration = lease_duration(req.lease, state.max_lease)?;

    let me = state.governor.neighbors().self_record().await;
    let peer = match state.governor.neighbors().get(&req.target_id).await {
        Some(p) if p.user != me.user => p,
        // Ours, or unknown: let the identity guard decide.
        _ => {
            let lease = state
                .governor
                .extend(&req.target_id, req.id, &req.task_id, duration)
                .await
                .map_err(reject)?;
            return Ok(Json(PlacedLease::full(me, lease)));
        }
    };

    let extend = ExtendRequest {
        target_id: peer.user.clone(),
        id: req.id,
        task_id: req.task_id,
        lease: req.lease,
    };
    match state.client.extend(&peer.host, &extend).await {
        Ok(PeerReply::Granted(lease)) => Ok(Json(PlacedLease::full(peer, lease))),
        Ok(PeerReply::Gone(msg)) => {
            forget(&state, &peer).await;
            Err((StatusCode::CONFLICT, msg))
        }
        Ok(PeerReply::Mismatch) => Err((
            StatusCode::NOT_FOUND,
            format!("no active lease on device {} at {}", req.id, peer.user),
        )),
        Ok(PeerReply::Unavailable) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            format!("neighbor {} unavailable", peer.user),
        )),
        Err(e) => Err((StatusCode::BAD_GATEWAY, e.to_string())),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn forget(state: &ApiState, peer: &Neighbor) {
    // Another request may have dropped it first.
    if let Err(e) = state.governor.neighbors().drop(peer).await {
        tracing::debug!(error = %e, "stale neighbor already gone");
    }
}

/// Task id for callers that did not bring one.
fn derive_task_id(self_user: &str, now_ms: u64) -> String {
    let nonce: u64 = rand::random();
    let mut h = blake3::Hasher::new();
    h.update(self_user.as_bytes());
    h.update(&now_ms.to_le_bytes());
    h.update(&nonce.to_le_bytes());
    hex::encode(&h.finalize().as_bytes()[..16])
}
