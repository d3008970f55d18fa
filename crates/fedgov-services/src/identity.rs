//! Identity guard: rejects requests addressed to a previous incarnation.
//!
//! The self id is regenerated on every start. A caller holding an older
//! directory snapshot may name an id this process never had; any lease it
//! refers to is meaningless against the fresh device table, so the request
//! is refused with `ServerGone` instead of being reinterpreted.

use fedgov_core::SwarmError;

use crate::neighbor::NeighborDirectory;

#[derive(Clone)]
pub struct IdentityGuard {
    directory: NeighborDirectory,
}

impl IdentityGuard {
    pub fn new(directory: NeighborDirectory) -> Self {
        Self { directory }
    }

    /// Succeed iff `target_id` is the current self id.
    pub async fn verify(&self, target_id: &str) -> Result<(), SwarmError> {
        let current = self.directory.self_user().await;
        if target_id == current {
            return Ok(());
        }
        tracing::debug!(target = target_id, current = %current, "request for stale identity");
        Err(SwarmError::ServerGone {
            target: target_id.to_string(),
            current,
        })
    }
}
