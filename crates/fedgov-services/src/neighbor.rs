//! Neighbor directory: this node's ordered view of swarm membership.
//!
//! Element 0 is always the local node. It is placed there at construction
//! and can never be removed, so the self id is stable for the life of the
//! process. Gossip only ever appends: records are deduplicated on `user`
//! and an existing record is never overwritten by a later advertisement.

use std::collections::HashSet;
use std::sync::Arc;

use fedgov_core::{Neighbor, SwarmError};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct NeighborDirectory {
    neighbors: Arc<Mutex<Vec<Neighbor>>>,
}

impl NeighborDirectory {
    /// Create a directory holding only the local node.
    pub fn new(self_record: Neighbor) -> Self {
        tracing::info!(user = %self_record.user, host = %self_record.host, "self identity established");
        Self {
            neighbors: Arc::new(Mutex::new(vec![self_record])),
        }
    }

    /// Ordered copy of every record, self first.
    pub async fn snapshot(&self) -> Vec<Neighbor> {
        self.neighbors.lock().await.clone()
    }

    /// The local node's record.
    pub async fn self_record(&self) -> Neighbor {
        let neighbors = self.neighbors.lock().await;
        neighbors[0].clone()
    }

    /// The local node's id.
    pub async fn self_user(&self) -> String {
        let neighbors = self.neighbors.lock().await;
        neighbors[0].user.clone()
    }

    /// Look up a record by node id.
    pub async fn get(&self, user: &str) -> Option<Neighbor> {
        let neighbors = self.neighbors.lock().await;
        neighbors.iter().find(|n| n.user == user).cloned()
    }

    pub async fn len(&self) -> usize {
        self.neighbors.lock().await.len()
    }

    /// Directory always holds at least the self record.
    pub async fn is_empty(&self) -> bool {
        self.neighbors.lock().await.is_empty()
    }

    /// Append every update whose `user` is not yet known, in order.
    ///
    /// Duplicates inside `updates` are dropped too. Returns the resulting
    /// snapshot.
    pub async fn merge(&self, updates: &[Neighbor]) -> Vec<Neighbor> {
        let mut neighbors = self.neighbors.lock().await;
        let mut known: HashSet<String> = neighbors.iter().map(|n| n.user.clone()).collect();

        for candidate in updates {
            if known.insert(candidate.user.clone()) {
                tracing::info!(user = %candidate.user, host = %candidate.host, "neighbor discovered");
                neighbors.push(candidate.clone());
            } else {
                tracing::trace!(user = %candidate.user, "neighbor already known");
            }
        }

        neighbors.clone()
    }

    /// Remove exactly one record equal to `record`.
    ///
    /// Fails with `InvalidNeighbor` if no such record exists or if it is the
    /// self record. Departures are not propagated to other peers.
    pub async fn drop(&self, record: &Neighbor) -> Result<(), SwarmError> {
        let mut neighbors = self.neighbors.lock().await;
        let invalid = || SwarmError::InvalidNeighbor {
            user: record.user.clone(),
            host: record.host.clone(),
        };

        match neighbors.iter().position(|n| n == record) {
            Some(0) | None => Err(invalid()),
            Some(idx) => {
                neighbors.remove(idx);
                tracing::info!(user = %record.user, host = %record.host, "neighbor dropped");
                Ok(())
            }
        }
    }
}
