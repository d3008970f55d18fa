//! fedgovd: federated device governor daemon.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use fedgov_core::config::FedgovConfig;
use fedgov_core::identity::generate_node_id;
use fedgov_core::{Neighbor, SystemClock};
use fedgov_services::Governor;

mod link;

use link::Linker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = FedgovConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let mut config = FedgovConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        FedgovConfig::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    apply_args(&mut config, &args)?;

    let port = config.network.api_port;
    let self_record = Neighbor::new(generate_node_id(), config.node.advertise_host(port));
    tracing::info!(
        user = %self_record.user,
        host = %self_record.host,
        devices = config.node.device_count,
        "fedgovd starting"
    );

    let governor = Governor::new(
        self_record,
        config.node.device_count,
        config.lease.default_lease(),
        SystemClock::shared(),
    );
    let client = fedgov_api::PeerClient::new(Duration::from_secs(
        config.network.request_timeout_secs,
    ))?;

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── API ──────────────────────────────────────────────────────────────────

    // Bound before bootstrap so seeds joining back can reach us.
    let bind = format!("{}:{}", config.network.bind_addr, port);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind API listener on {}", bind))?;
    tracing::info!(addr = %bind, "API listening");

    let state = fedgov_api::ApiState {
        governor: governor.clone(),
        client: client.clone(),
        max_lease: config.lease.max_lease(),
        shutdown_tx: shutdown_tx.clone(),
    };
    let mut api_task = tokio::spawn(fedgov_api::serve_on(listener, state));

    // ── Linking ──────────────────────────────────────────────────────────────

    let linker = Linker::new(
        governor,
        client,
        port,
        config.network.seed_peers.clone(),
        config.network.gossip_fanout,
    );
    linker.bootstrap().await;

    let interval = config.network.gossip_interval_secs;
    let gossip_task = if interval > 0 {
        Some(tokio::spawn(
            linker.run(Duration::from_secs(interval), shutdown_tx.subscribe()),
        ))
    } else {
        tracing::info!("gossip disabled");
        None
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::info!("shutting down");
            // let in-flight requests drain
            match tokio::time::timeout(Duration::from_secs(5), &mut api_task).await {
                Ok(Ok(Err(e))) => tracing::error!(error = %e, "API server failed"),
                Err(_) => tracing::warn!("API server did not stop in time"),
                _ => {}
            }
        }
        r = &mut api_task => tracing::error!("API server exited: {:?}", r),
    }

    if let Some(task) = gossip_task {
        task.abort();
    }

    Ok(())
}

/// `--port N` overrides the API port; `--peer URL` adds a seed and may repeat.
fn apply_args(config: &mut FedgovConfig, args: &[String]) -> Result<()> {
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.network.api_port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--peer" => {
                i += 1;
                let peer = args.get(i).context("--peer requires a value")?;
                let peer = peer.trim_end_matches('/').to_string();
                if !config.network.seed_peers.contains(&peer) {
                    config.network.seed_peers.push(peer);
                }
            }
            other => anyhow::bail!("unknown argument: {}", other),
        }
        i += 1;
    }
    Ok(())
}
