//! Swarm linking: bootstrap joins and periodic gossip.
//!
//! On startup every seed peer is joined and its neighbor list merged. After
//! that, each gossip round re-joins a few random neighbors so membership
//! converges in both directions. All network calls happen outside the
//! directory lock; only the resulting merge takes it.

use std::time::Duration;

use anyhow::Result;
use rand::seq::SliceRandom;
use tokio::sync::broadcast;

use fedgov_api::PeerClient;
use fedgov_core::{JoinRequest, Neighbor};
use fedgov_services::Governor;

pub struct Linker {
    governor: Governor,
    client: PeerClient,
    port: u16,
    seeds: Vec<String>,
    fanout: usize,
}

impl Linker {
    pub fn new(
        governor: Governor,
        client: PeerClient,
        port: u16,
        seeds: Vec<String>,
        fanout: usize,
    ) -> Self {
        Self {
            governor,
            client,
            port,
            seeds,
            fanout,
        }
    }

    /// Join every seed. Returns how many answered.
    pub async fn bootstrap(&self) -> usize {
        tracing::info!(seeds = ?self.seeds, "bootstrapping");

        let mut reached = 0;
        for seed in &self.seeds {
            match self.join_host(seed, None).await {
                Ok(added) => {
                    reached += 1;
                    tracing::info!(seed = %seed, new_neighbors = added, "joined seed");
                }
                Err(e) => {
                    tracing::warn!(seed = %seed, error = %e, "failed to join seed");
                }
            }
        }

        let known = self.governor.neighbors().len().await;
        tracing::info!(neighbors = known - 1, "bootstrap complete");
        reached
    }

    /// Join `host` and merge what it knows. Returns the number of new records.
    ///
    /// When `known` is the record we already hold for `host` and the peer now
    /// answers with a different id, it has restarted: the stale record is
    /// dropped before the fresh identity is merged.
    async fn join_host(&self, host: &str, known: Option<&Neighbor>) -> Result<usize> {
        let me = self.governor.neighbors().self_record().await;
        let req = JoinRequest {
            user: me.user,
            port: self.port,
            host: Some(me.host),
        };

        let resp = self.client.join(host, &req).await?;

        if let Some(stale) = known.filter(|k| k.user != resp.user) {
            tracing::info!(old = %stale.user, new = %resp.user, host = %host, "neighbor restarted");
            if let Err(e) = self.governor.neighbors().drop(stale).await {
                tracing::debug!(error = %e, "stale neighbor already gone");
            }
        }

        let mut updates = Vec::with_capacity(resp.neighbors.len() + 1);
        updates.push(Neighbor::new(resp.user, host));
        updates.extend(resp.neighbors);

        let before = self.governor.neighbors().len().await;
        let after = self.governor.neighbors().merge(&updates).await.len();
        Ok(after.saturating_sub(before))
    }

    /// One fan-out round. Falls back to the seeds when we know nobody.
    pub async fn gossip_round(&self) {
        let snapshot = self.governor.neighbors().snapshot().await;
        if snapshot.len() == 1 {
            if !self.seeds.is_empty() {
                self.bootstrap().await;
            }
            return;
        }

        let targets: Vec<Neighbor> = {
            let mut rng = rand::thread_rng();
            snapshot[1..]
                .choose_multiple(&mut rng, self.fanout)
                .cloned()
                .collect()
        };

        for peer in &targets {
            if let Err(e) = self.join_host(&peer.host, Some(peer)).await {
                tracing::debug!(user = %peer.user, error = %e, "gossip join failed");
            }
        }

        let count = self.governor.neighbors().len().await;
        tracing::debug!(neighbors = count - 1, "gossip round complete");
    }

    /// Gossip every `interval` until shutdown.
    pub async fn run(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut timer = tokio::time::interval(interval);
        // the first tick fires immediately and bootstrap just ran
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => self.gossip_round().await,
                _ = shutdown.recv() => {
                    tracing::debug!("gossip loop stopping");
                    return;
                }
            }
        }
    }
}
