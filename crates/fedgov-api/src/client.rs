//! Outbound peer protocol client.
//!
//! Used by the daemon for bootstrap and gossip joins, and by the operator
//! endpoints to forward probes and extends. Never called with a lock held.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use fedgov_core::{DeviceLease, ExtendRequest, JoinRequest, JoinResponse, ProbeRequest};

/// How a peer answered a lease request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerReply<T> {
    Granted(T),
    /// 409: the peer restarted under a new id. Carries the peer's message.
    Gone(String),
    /// 503: no free device on the peer.
    Unavailable,
    /// 404: no matching live lease on the peer.
    Mismatch,
}

#[derive(Clone)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }

    /// `POST <host>/pubsub/join`.
    pub async fn join(&self, host: &str, req: &JoinRequest) -> Result<JoinResponse> {
        let url = endpoint(host, "/pubsub/join");
        let resp = self
            .http
            .post(&url)
            .json(req)
            .send()
            .await
            .with_context(|| format!("failed to reach peer at {}", url))?;

        if !resp.status().is_success() {
            bail!("peer {} returned HTTP {}", host, resp.status());
        }
        resp.json::<JoinResponse>()
            .await
            .context("failed to parse join response")
    }

    /// `POST <host>/pubsub/probe`.
    pub async fn probe(&self, host: &str, req: &ProbeRequest) -> Result<PeerReply<DeviceLease>> {
        self.lease_call(host, "/pubsub/probe", req).await
    }

    /// `POST <host>/pubsub/extend`.
    pub async fn extend(&self, host: &str, req: &ExtendRequest) -> Result<PeerReply<DeviceLease>> {
        self.lease_call(host, "/pubsub/extend", req).await
    }

    async fn lease_call<B, T>(&self, host: &str, path: &str, body: &B) -> Result<PeerReply<T>>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = endpoint(host, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to reach peer at {}", url))?;

        let status = resp.status();
        if status.is_success() {
            let value = resp
                .json::<T>()
                .await
                .with_context(|| format!("failed to parse reply from {}", url))?;
            return Ok(PeerReply::Granted(value));
        }
        if status == StatusCode::CONFLICT {
            let msg = resp.text().await.unwrap_or_default();
            return Ok(PeerReply::Gone(msg));
        }
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(PeerReply::Unavailable);
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(PeerReply::Mismatch);
        }
        bail!("peer {} returned HTTP {}", host, status)
    }
}

fn endpoint(host: &str, path: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), path)
}
