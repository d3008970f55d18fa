//! fedgov-ctl: command-line interface for the fedgov daemon.

mod cmd;

use anyhow::{Context, Result};

use cmd::lease::{cmd_acquire, cmd_renew};
use cmd::neighbors::{cmd_neighbor_drop, cmd_neighbors};
use cmd::status::{cmd_devices, cmd_shutdown, cmd_status};

const DEFAULT_PORT: u16 = 5000;

fn print_usage() {
    println!("Usage: fedgov-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                                  Show node id, devices and neighbor count");
    println!("  neighbors                               List the neighbor directory");
    println!("  devices                                 Show the local device table");
    println!("  drop <user> <host>                      Remove a neighbor record");
    println!("  acquire [task_id] [--lease <secs>]      Lease a device anywhere in the swarm");
    println!("  renew <target_id> <device_id> <task_id> <secs>");
    println!("                                          Extend an existing lease");
    println!("  shutdown                                Stop the daemon");
    println!();
    println!("Options:");
    println!("  --port <port>   API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port and --lease options
    let mut port = DEFAULT_PORT;
    let mut lease: Option<u64> = None;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--lease" => {
                i += 1;
                lease = Some(
                    args.get(i)
                        .context("--lease requires a value")?
                        .parse()
                        .context("--lease must be a number of seconds")?,
                );
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | []                 => cmd_status(port).await,
        ["neighbors"]                   => cmd_neighbors(port).await,
        ["devices"]                     => cmd_devices(port).await,
        ["drop", user, host]            => cmd_neighbor_drop(port, user, host).await,
        ["acquire"]                     => cmd_acquire(port, None, lease).await,
        ["acquire", task]               => cmd_acquire(port, Some(*task), lease).await,
        ["renew", target, id, task, secs] => {
            let id: u32 = id.parse().context("device_id must be a number")?;
            let secs: u64 = secs.parse().context("lease must be a number of seconds")?;
            cmd_renew(port, target, id, task, secs).await
        }
        ["shutdown"]                    => cmd_shutdown(port).await,
        ["help"] | ["--help"] | ["-h"]  => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
