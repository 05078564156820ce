//! # Tickgate Server
//!
//! Runs the sandbox simulation behind the command service, exercises a few
//! operations and prints the chat event stream until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! tickgate_server --config config/tickgate.toml --duration 30
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use tickgate::model::{BlockInfo, Blocks, CommandRequest, Entity, EntityLocation, HeightRequest, Vec3f};
use tickgate::sandbox::{SandboxCatalog, SandboxWorld};
use tickgate::{CommandService, EventType, TickgateResult};
use tickgate_core::{SimulationHost, TickgateConfig};
use tickgate_events::{BlockPos, EventStreamBridge};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "tickgate_server", about = "Remote control surface over a sandbox simulation")]
struct Args {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log every request and its status.
    #[arg(long)]
    debug: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long, short)]
    duration: Option<u64>,
}

#[tokio::main]
async fn main() -> TickgateResult<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => TickgateConfig::from_file(path)?,
        None => TickgateConfig::default(),
    };
    config.debug |= args.debug;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TICKGATE SERVER                                          ║");
    println!("║         ONE THREAD OWNS THE WORLD                                ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Tick Rate:          {} Hz", config.simulation.tick_rate);
    println!("│ Work Per Tick:      {}", config.simulation.max_work_per_tick);
    println!("│ Event Queue:        {}", config.events.queue_capacity);
    println!("│ Debug:              {}", config.debug);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let (bridge, host) = SimulationHost::spawn(SandboxWorld::new(), &config.simulation)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let streams = EventStreamBridge::new(bridge.clone(), config.events, shutdown_rx);
    let service = CommandService::new(bridge, streams, Arc::new(SandboxCatalog::new()), config.debug);

    let mut chat = service.get_event_stream(EventType::ChatMessage);
    let printer = tokio::spawn(async move {
        while let Some(record) = chat.next().await {
            println!("  [chat] {record:?}");
        }
        let stats = chat.stats();
        info!(delivered = stats.delivered, dropped = stats.dropped, "chat stream ended");
    });

    demo(&service).await?;
    let chatter = tokio::spawn(chatter(service.clone()));

    match args.duration {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "ctrl-c handler failed");
            }
        }
    }

    println!();
    println!("Shutting down...");
    chatter.abort();
    // Streams deregister before the simulation stops.
    let _ = shutdown_tx.send(true);
    if let Err(err) = printer.await {
        warn!(error = %err, "chat printer failed");
    }
    if let Some(world) = host.shutdown() {
        println!("Simulation stopped after {} ticks", world.ticks());
    }
    Ok(())
}

/// A handful of calls showing each execution mode.
async fn demo(service: &CommandService<SandboxWorld, SandboxCatalog>) -> TickgateResult<()> {
    let server = service.get_server_info().await?;
    println!("Simulation:  {}", server.sim_version);
    println!("Bridge:      {}", server.bridge_version);

    let worlds = service.access_worlds(Vec::new()).await?;
    for world in &worlds.worlds {
        println!("World:       {} {:?}", world.name, world.info);
    }

    let tower = Blocks {
        world: None,
        pos: vec![BlockPos::new(0, 65, 0), BlockPos::new(2, 70, 2)],
        info: Some(BlockInfo::of("gold_block")),
    };
    println!("Build tower: {}", service.set_block_cube(tower).await?);

    let height = service
        .get_height(HeightRequest {
            world: None,
            x: 1,
            z: 1,
        })
        .await?;
    println!("Height:      {} {:?}", height.status, height.block);

    let zombie = Entity {
        kind: "zombie".into(),
        location: Some(EntityLocation {
            world: None,
            pos: Some(Vec3f::new(4.5, 65.0, 4.5)),
            orientation: None,
        }),
        ..Entity::default()
    };
    let spawned = service.spawn_entity(zombie).await?;
    println!("Spawned:     {} {:?}", spawned.status, spawned.entity);

    let time = service
        .run_command(CommandRequest {
            command: "/time set day".into(),
            blocking: false,
            output: true,
        })
        .await?;
    println!("Command:     {} {:?}", time.status, time.output);
    println!();
    Ok(())
}

/// Sandbox players chatting once per second.
async fn chatter(service: CommandService<SandboxWorld, SandboxCatalog>) {
    const LINES: [&str; 4] = ["hello", "anyone here?", "nice tower", "brb"];
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    for line in LINES.iter().cycle() {
        interval.tick().await;
        let submitted = service.bridge().submit(move |world: &mut SandboxWorld| {
            world.join("alex");
            world.chat("alex", line);
        });
        if submitted.is_err() {
            break;
        }
    }
}
