//! Error taxonomy for lease and directory operations.
//!
//! Every variant is a data-level failure. Request handlers translate them
//! into responses and keep serving; none of them is fatal to the process.

/// Failures surfaced by the lease registry, the neighbor directory and the
/// identity guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwarmError {
    /// A probe found no free device. Retry elsewhere or back off.
    #[error("no free device available")]
    LeaseUnavailable,

    /// An extend found no live lease for this device and task. Re-probe.
    #[error("no active lease on device {device_id} for task {task_id}")]
    LeaseMismatch { device_id: u32, task_id: String },

    /// The caller addressed a previous incarnation of this node.
    #[error("server {target} has since shut down, please update records to use {current} instead")]
    ServerGone { target: String, current: String },

    /// Drop of an unknown neighbor record, or of the self record.
    #[error("invalid neighbor {user} at {host}")]
    InvalidNeighbor { user: String, host: String },
}
