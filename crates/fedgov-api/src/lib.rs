pub mod client;
pub mod handlers;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use client::{PeerClient, PeerReply};
pub use handlers::ApiState;

/// Peer protocol under `/pubsub`, operator endpoints under `/api`.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pubsub_routes = Router::new()
        .route("/join", post(handlers::handle_join))
        .route("/probe", post(handlers::handle_probe))
        .route("/extend", post(handlers::handle_extend));

    let api_routes = Router::new()
        .route("/status", get(handlers::handle_status))
        .route("/neighbors", get(handlers::handle_neighbors))
        .route("/neighbors/drop", post(handlers::handle_neighbor_drop))
        .route("/devices", get(handlers::handle_devices))
        .route("/acquire", post(handlers::handle_acquire))
        .route("/renew", post(handlers::handle_renew))
        .route("/daemon/shutdown", post(handlers::handle_shutdown));

    Router::new()
        .nest("/pubsub", pubsub_routes)
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
}

/// Serve on an already-bound listener until the shutdown channel fires.
pub async fn serve_on(listener: TcpListener, state: ApiState) -> anyhow::Result<()> {
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let app = router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;
    Ok(())
}
