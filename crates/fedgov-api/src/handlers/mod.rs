//! HTTP handlers: the peer protocol and the operator API.

pub mod lease;
pub mod pubsub;
pub mod status;

use std::time::Duration;

use axum::http::StatusCode;

use fedgov_core::SwarmError;
use fedgov_services::Governor;

use crate::client::PeerClient;

#[derive(Clone)]
pub struct ApiState {
    pub governor: Governor,
    pub client: PeerClient,
    /// Longest lease a caller may request.
    pub max_lease: Duration,
    /// Shutdown broadcast sender: signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// HTTP status for each domain failure.
pub fn status_for(err: &SwarmError) -> StatusCode {
    match err {
        SwarmError::LeaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        SwarmError::LeaseMismatch { .. } => StatusCode::NOT_FOUND,
        SwarmError::ServerGone { .. } => StatusCode::CONFLICT,
        SwarmError::InvalidNeighbor { .. } => StatusCode::BAD_REQUEST,
    }
}

fn reject(err: SwarmError) -> (StatusCode, String) {
    let status = status_for(&err);
    let msg = match &err {
        SwarmError::ServerGone { .. } => format!("requested server is gone: {}", err),
        _ => err.to_string(),
    };
    (status, msg)
}

/// Validate a caller-supplied lease length in seconds.
fn lease_duration(secs: u64, max: Duration) -> Result<Duration, (StatusCode, String)> {
    let d = Duration::from_secs(secs);
    if secs == 0 {
        return Err((StatusCode::BAD_REQUEST, "lease must be positive".to_string()));
    }
    if d > max {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("lease exceeds maximum of {}s", max.as_secs()),
        ));
    }
    Ok(d)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), (StatusCode, String)> {
    if value.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{} must not be empty", field)));
    }
    Ok(())
}

// Re-export handler functions for use in router setup.
pub use lease::{handle_acquire, handle_renew};
pub use pubsub::{handle_extend, handle_join, handle_probe};
pub use status::{
    handle_devices, handle_neighbor_drop, handle_neighbors, handle_shutdown, handle_status,
};
