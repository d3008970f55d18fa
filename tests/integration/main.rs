//! fedgov integration test harness.
//!
//! Every test runs a small swarm of real HTTP nodes inside the test process,
//! each bound to an ephemeral port on 127.0.0.1:
//!
//!   cargo test --test integration
//!
//! Nodes shut down when dropped. Nothing is shared between tests.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use fedgov_api::{ApiState, PeerClient};
use fedgov_core::identity::generate_node_id;
use fedgov_core::{Neighbor, SystemClock};
use fedgov_services::Governor;

mod leasing;
mod membership;
mod operator;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const MAX_LEASE_SECS: u64 = 3600;

/// One running node.
pub struct Node {
    pub governor: Governor,
    pub user: String,
    pub host: String,
    shutdown_tx: broadcast::Sender<()>,
}

/// Status code plus raw body. Failures answer in plain text.
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.body))
    }
}

impl Node {
    /// Start a node governing `devices` devices.
    pub async fn spawn(devices: u32) -> Node {
        Node::spawn_with_max_lease(devices, MAX_LEASE_SECS).await
    }

    /// Start a node that refuses leases longer than `max_lease_secs`.
    pub async fn spawn_with_max_lease(devices: u32, max_lease_secs: u64) -> Node {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let port = listener.local_addr().expect("local addr").port();
        let host = format!("http://127.0.0.1:{port}");
        let user = generate_node_id();

        let governor = Governor::new(
            Neighbor::new(user.clone(), host.clone()),
            devices,
            Duration::from_secs(60),
            SystemClock::shared(),
        );
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = ApiState {
            governor: governor.clone(),
            client: PeerClient::new(Duration::from_secs(2)).expect("peer client"),
            max_lease: Duration::from_secs(max_lease_secs),
            shutdown_tx: shutdown_tx.clone(),
        };
        tokio::spawn(fedgov_api::serve_on(listener, state));

        Node {
            governor,
            user,
            host,
            shutdown_tx,
        }
    }

    pub fn record(&self) -> Neighbor {
        Neighbor::new(self.user.clone(), self.host.clone())
    }

    pub async fn get(&self, path: &str) -> Result<Reply> {
        let resp = reqwest::get(format!("{}{}", self.host, path))
            .await
            .with_context(|| format!("GET {path} on {}", self.host))?;
        reply(resp).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Reply> {
        let resp = reqwest::Client::new()
            .post(format!("{}{}", self.host, path))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {path} on {}", self.host))?;
        reply(resp).await
    }

    /// Introduce `self` to `other` the way a booting node does.
    pub async fn join(&self, other: &Node) -> Result<Reply> {
        other
            .post(
                "/pubsub/join",
                serde_json::json!({ "user": self.user, "port": 0, "host": self.host }),
            )
            .await
    }

    /// Users in directory order, self first.
    pub async fn directory(&self) -> Vec<String> {
        self.governor
            .neighbors()
            .snapshot()
            .await
            .into_iter()
            .map(|n| n.user)
            .collect()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn reply(resp: reqwest::Response) -> Result<Reply> {
    let status = resp.status().as_u16();
    let body = resp.text().await.context("read body")?;
    Ok(Reply { status, body })
}
