//! Standalone host binary.
//!
//! Usage:
//!   cargo run -p raycast_server -- [--config host.json] [--tick-hz 20] [--max-distance 128] [--scene scene.json]
//!
//! Console commands:
//!   spawn <kind> x y z [scale]  - Spawn an entity (item, block, living, other)
//!   move <id> x y z             - Move an entity
//!   group <name> <id...>        - Group entities for casting
//!   cast x y z dx dy dz         - Cast a ray through every group
//!   load <scene.json>           - Load a scene file
//!   status                      - Show host status
//!   quit                        - Shutdown

use std::env;
use std::io::{BufRead, Write};

use anyhow::Context;
use raycast_server::RaycastServer;
use raycast_shared::config::RaycastConfig;
use tokio::sync::mpsc;
use tracing::info;

fn parse_args() -> anyhow::Result<RaycastConfig> {
    let args: Vec<String> = env::args().collect();

    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).context("--config needs a path")?;
            RaycastConfig::load(path)?
        }
        None => RaycastConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tick-hz" if i + 1 < args.len() => {
                cfg.tick_hz = args[i + 1].parse().context("--tick-hz")?;
                i += 2;
            }
            "--max-distance" if i + 1 < args.len() => {
                cfg.max_distance = args[i + 1].parse().context("--max-distance")?;
                i += 2;
            }
            "--scene" if i + 1 < args.len() => {
                cfg.scene_path = Some(args[i + 1].clone());
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(
        tick_hz = cfg.tick_hz,
        max_distance = cfg.max_distance,
        scene = ?cfg.scene_path,
        "Starting raycast host"
    );

    let mut server = RaycastServer::new(cfg.clone()).context("create server")?;

    // Set up console input channel.
    let (console_tx, console_rx) = mpsc::channel::<String>(32);
    server.set_console_input(console_rx);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Host ready. Type 'help' for commands, 'quit' to exit.");
    println!();

    let tick_interval = std::time::Duration::from_secs_f64(1.0 / cfg.tick_hz.max(1) as f64);
    let mut next_tick = tokio::time::Instant::now();

    while !server.should_quit() {
        server.step();
        next_tick += tick_interval;
        tokio::time::sleep_until(next_tick).await;
    }

    info!(ticks = server.tick(), "Host stopped");
    Ok(())
}
