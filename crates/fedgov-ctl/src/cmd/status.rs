//! Node status and device table.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, post_json};

#[derive(Deserialize)]
struct StatusResponse {
    user:      String,
    host:      String,
    devices:   DeviceCounts,
    neighbors: usize,
}

#[derive(Deserialize)]
struct DeviceCounts {
    total:    usize,
    free:     usize,
    reserved: usize,
}

#[derive(Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceInfo>,
}

#[derive(Deserialize)]
struct DeviceInfo {
    id:            u32,
    state:         String,
    task_id:       Option<String>,
    expires_in_ms: u64,
}

#[derive(Deserialize)]
struct ShutdownResponse {
    message: String,
}

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Fedgov Daemon Status");
    println!("═══════════════════════════════════════");
    println!("  Node id          : {}", resp.user);
    println!("  Advertised host  : {}", resp.host);
    println!("  Neighbors        : {}", resp.neighbors);
    println!("  Devices          : {}", resp.devices.total);
    println!("    free           : {}", resp.devices.free);
    println!("    reserved       : {}", resp.devices.reserved);

    Ok(())
}

pub async fn cmd_devices(port: u16) -> Result<()> {
    let resp: DevicesResponse = get_json(&format!("{}/devices", base_url(port))).await?;

    if resp.devices.is_empty() {
        println!("This node governs no devices.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Devices ({})", resp.devices.len());
    println!("═══════════════════════════════════════");

    for d in &resp.devices {
        match &d.task_id {
            Some(task) => {
                println!("  ┌─ device {} ({})", d.id, d.state);
                println!("  │  task    : {}", task);
                println!("  └─ expires : {}", format_remaining(d.expires_in_ms));
            }
            None => println!("  ── device {} ({})", d.id, d.state),
        }
    }

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    let resp: ShutdownResponse =
        post_json(&format!("{}/daemon/shutdown", base_url(port))).await?;
    println!("{}", resp.message);
    Ok(())
}

fn format_remaining(ms: u64) -> String {
    let secs = ms / 1000;
    if secs >= 60 {
        format!("in {}m {}s", secs / 60, secs % 60)
    } else {
        format!("in {}s", secs)
    }
}
