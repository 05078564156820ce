//! # TICKGATE Core
//!
//! Safe remote control of a single-threaded, tick-based simulation.
//!
//! ## Design Principles
//!
//! 1. **One owner** - only the simulation thread touches simulation state
//! 2. **One queue** - all work reaches the simulation through a single FIFO channel
//! 3. **Never block the tick** - callers wait, the simulation thread does not
//! 4. **Answer with a Status** - client input problems are codes, not errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use tickgate_core::{SimulationHost, TickgateConfig};
//!
//! let config = TickgateConfig::from_file("config/tickgate.toml")?;
//! let (bridge, host) = SimulationHost::spawn(world, &config.simulation)?;
//!
//! // From any tokio task:
//! let height = bridge.call(|w: &mut MyWorld| w.height_at(10, 20)).await?;
//!
//! host.shutdown();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod output;
pub mod status;
pub mod tick;

pub use bridge::{
    channel, BridgeRunner, BridgeStats, BridgeStatsSnapshot, ExecutionBridge, ExecutionMode,
    WorkItem,
};
pub use config::{EventsConfig, SimulationConfig, TickgateConfig, DEFAULT_QUEUE_CAPACITY};
pub use error::{
    BridgeError, BridgeResult, ConfigError, ConfigResult, HostError, HostResult, SimError,
    SimResult,
};
pub use host::{HostHandle, Simulated, SimulationHost};
pub use output::{strip_formatting, OutputCapture};
pub use status::{Status, StatusCode};
pub use tick::{TickLoop, TickStats, DEFAULT_TICK_RATE};

/// Version reported by the bridge in server info.
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");
