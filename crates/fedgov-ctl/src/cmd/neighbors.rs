//! Neighbor directory commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{base_url, get_json, post_json_body};

#[derive(Deserialize)]
struct NeighborsResponse {
    neighbors: Vec<NeighborInfo>,
}

#[derive(Deserialize)]
struct NeighborInfo {
    user: String,
    host: String,
}

#[derive(Serialize)]
struct NeighborDropRequest {
    user: String,
    host: String,
}

#[derive(Deserialize)]
struct NeighborDropResponse {
    user: String,
}

pub async fn cmd_neighbors(port: u16) -> Result<()> {
    let resp: NeighborsResponse = get_json(&format!("{}/neighbors", base_url(port))).await?;

    // The first record is always the node itself.
    let Some((me, others)) = resp.neighbors.split_first() else {
        println!("Directory is empty.");
        return Ok(());
    };

    println!("═══════════════════════════════════════");
    println!("  Neighbors ({})", others.len());
    println!("═══════════════════════════════════════");
    println!("  ● {}  {}  (self)", me.user, me.host);

    for n in others {
        println!("  ○ {}  {}", n.user, n.host);
    }

    Ok(())
}

pub async fn cmd_neighbor_drop(port: u16, user: &str, host: &str) -> Result<()> {
    let req = NeighborDropRequest {
        user: user.to_string(),
        host: host.to_string(),
    };

    let resp: NeighborDropResponse =
        post_json_body(&format!("{}/neighbors/drop", base_url(port)), &req).await?;

    println!("✗ Dropped {}", resp.user);
    Ok(())
}
