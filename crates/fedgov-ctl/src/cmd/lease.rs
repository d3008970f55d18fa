//! Acquire and renew device leases through the local daemon.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{base_url, post_json_body};

#[derive(Serialize)]
struct AcquireRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lease: Option<u64>,
}

#[derive(Serialize)]
struct RenewRequest {
    target_id: String,
    id:        u32,
    task_id:   String,
    lease:     u64,
}

#[derive(Deserialize)]
struct PlacedLease {
    user:           String,
    host:           String,
    lease:          DeviceLease,
    requested_secs: Option<u64>,
}

#[derive(Deserialize)]
struct DeviceLease {
    id:         u32,
    task_id:    String,
    expiration: u64,
}

pub async fn cmd_acquire(port: u16, task_id: Option<&str>, lease: Option<u64>) -> Result<()> {
    let req = AcquireRequest {
        task_id: task_id.map(str::to_string),
        lease,
    };

    let placed: PlacedLease =
        post_json_body(&format!("{}/acquire", base_url(port)), &req).await?;

    println!("✓ Device acquired");
    print_placed(&placed);
    Ok(())
}

pub async fn cmd_renew(
    port: u16,
    target_id: &str,
    device_id: u32,
    task_id: &str,
    lease: u64,
) -> Result<()> {
    let req = RenewRequest {
        target_id: target_id.to_string(),
        id:        device_id,
        task_id:   task_id.to_string(),
        lease,
    };

    let placed: PlacedLease = post_json_body(&format!("{}/renew", base_url(port)), &req).await?;

    println!("✓ Lease renewed");
    print_placed(&placed);
    Ok(())
}

fn print_placed(p: &PlacedLease) {
    println!("  ┌─ node       : {}", p.user);
    println!("  │  host       : {}", p.host);
    println!("  │  device     : {}", p.lease.id);
    println!("  │  task       : {}", p.lease.task_id);
    println!("  └─ expiration : {} (unix ms)", p.lease.expiration);
    if let Some(secs) = p.requested_secs {
        println!("  ! granted less than the requested {}s", secs);
    }
}
