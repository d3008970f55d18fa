//! Shared record and wire types.
//!
//! The JSON shapes here are the peer protocol: `/pubsub/join`,
//! `/pubsub/probe` and `/pubsub/extend` bodies and replies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lease length applied to first-time probes when the caller names none.
pub const DEFAULT_LEASE_SECS: u64 = 60;

// ── Directory ─────────────────────────────────────────────────────────────────

/// One member of the swarm as seen by this node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Neighbor {
    /// Node id. Unique within a directory.
    pub user: String,
    /// Base URL of the node's HTTP endpoint, e.g. `http://10.0.0.4:5000`.
    pub host: String,
}

impl Neighbor {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }
}

// ── Leases ────────────────────────────────────────────────────────────────────

/// Which device a lease request refers to.
///
/// On the wire this is a signed integer: `-1` (any negative value) asks for
/// any free device, a non-negative value names a device to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DeviceSelector {
    Any,
    Device(u32),
}

impl TryFrom<i64> for DeviceSelector {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        if v < 0 {
            return Ok(DeviceSelector::Any);
        }
        u32::try_from(v)
            .map(DeviceSelector::Device)
            .map_err(|_| format!("device id {v} out of range"))
    }
}

impl From<DeviceSelector> for i64 {
    fn from(s: DeviceSelector) -> Self {
        match s {
            DeviceSelector::Any => -1,
            DeviceSelector::Device(id) => id as i64,
        }
    }
}

/// A request to take or keep a device on a specific node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseRequest {
    /// Node id the caller believes it is talking to.
    pub target_id: String,
    pub device: DeviceSelector,
    pub task_id: String,
    pub duration: Duration,
}

/// Copy of a device record returned to the lease holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLease {
    pub id: u32,
    pub task_id: String,
    /// Unix ms after which the device is free again.
    pub expiration: u64,
}

// ── Peer protocol bodies ──────────────────────────────────────────────────────

/// `POST /pubsub/join` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Caller's node id.
    pub user: String,
    /// Port the caller serves on. Combined with the remote address when
    /// `host` is absent.
    pub port: u16,
    /// Explicit advertised base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// `POST /pubsub/join` reply: the local identity plus every other neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub user: String,
    pub neighbors: Vec<Neighbor>,
}

/// `POST /pubsub/probe` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub target_id: String,
    pub task_id: String,
}

/// `POST /pubsub/extend` body. `lease` is in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendRequest {
    pub target_id: String,
    pub id: u32,
    pub task_id: String,
    pub lease: u64,
}
