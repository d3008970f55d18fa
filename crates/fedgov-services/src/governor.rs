//! Governor: the node's lease and membership state, explicitly constructed.
//!
//! Bundles the lease registry, the neighbor directory and the identity guard
//! behind the three operations the peer protocol needs: join, probe and
//! extend. The directory lock and the registry lock are never held at the
//! same time: the identity check completes before the registry is touched.

use std::time::Duration;

use fedgov_core::clock::SharedClock;
use fedgov_core::{
    DeviceLease, DeviceSelector, JoinResponse, LeaseRequest, Neighbor, SwarmError,
};

use crate::identity::IdentityGuard;
use crate::lease::LeaseRegistry;
use crate::neighbor::NeighborDirectory;

#[derive(Clone)]
pub struct Governor {
    leases: LeaseRegistry,
    neighbors: NeighborDirectory,
    guard: IdentityGuard,
    default_lease: Duration,
    clock: SharedClock,
}

impl Governor {
    pub fn new(
        self_record: Neighbor,
        device_count: u32,
        default_lease: Duration,
        clock: SharedClock,
    ) -> Self {
        let neighbors = NeighborDirectory::new(self_record);
        Self {
            leases: LeaseRegistry::new(device_count, clock.clone()),
            guard: IdentityGuard::new(neighbors.clone()),
            neighbors,
            default_lease,
            clock,
        }
    }

    pub fn leases(&self) -> &LeaseRegistry {
        &self.leases
    }

    pub fn neighbors(&self) -> &NeighborDirectory {
        &self.neighbors
    }

    /// Current time on the node's clock, unix ms.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn default_lease(&self) -> Duration {
        self.default_lease
    }

    /// Admit `candidate` and report our id plus every other known neighbor.
    pub async fn join(&self, candidate: Neighbor) -> JoinResponse {
        let mut snapshot = self.neighbors.merge(std::slice::from_ref(&candidate)).await;
        let me = snapshot.remove(0);
        JoinResponse {
            user: me.user,
            neighbors: snapshot,
        }
    }

    /// Check the target identity, then probe or extend.
    pub async fn reserve(&self, request: LeaseRequest) -> Result<DeviceLease, SwarmError> {
        self.guard.verify(&request.target_id).await?;
        self.leases
            .reserve(request.device, &request.task_id, request.duration)
            .await
    }

    /// Lease any free device. `None` applies the default lease.
    pub async fn probe(
        &self,
        target_id: &str,
        task_id: &str,
        duration: Option<Duration>,
    ) -> Result<DeviceLease, SwarmError> {
        self.reserve(LeaseRequest {
            target_id: target_id.to_string(),
            device: DeviceSelector::Any,
            task_id: task_id.to_string(),
            duration: duration.unwrap_or(self.default_lease),
        })
        .await
    }

    /// Renew a lease this task already holds.
    pub async fn extend(
        &self,
        target_id: &str,
        device_id: u32,
        task_id: &str,
        duration: Duration,
    ) -> Result<DeviceLease, SwarmError> {
        self.reserve(LeaseRequest {
            target_id: target_id.to_string(),
            device: DeviceSelector::Device(device_id),
            task_id: task_id.to_string(),
            duration,
        })
        .await
    }
}
