//! # Configuration
//!
//! Settings loaded once at startup from TOML. Every field has a default, so
//! an empty file is a valid configuration.
//!
//! ```toml
//! debug = false
//! log_filter = "info"
//!
//! [simulation]
//! tick_rate = 20
//! max_work_per_tick = 1024
//!
//! [events]
//! queue_capacity = 100
//! outbound_capacity = 16
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::tick::DEFAULT_TICK_RATE;

/// Default capacity of a subscription queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickgateConfig {
    /// Log every request and its status.
    pub debug: bool,
    /// Default `tracing` filter directive for the binary.
    pub log_filter: String,
    /// Simulation thread settings.
    pub simulation: SimulationConfig,
    /// Event stream settings.
    pub events: EventsConfig,
}

/// Simulation thread settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// Work items drained per tick (0 = unlimited).
    pub max_work_per_tick: usize,
}

/// Event stream settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    /// Capacity of each subscription queue.
    pub queue_capacity: usize,
    /// Capacity of the channel between the drain task and the stream consumer.
    ///
    /// Adds to `queue_capacity`: a stalled consumer can have up to
    /// `queue_capacity + outbound_capacity` records buffered before new
    /// records are dropped.
    pub outbound_capacity: usize,
}

impl Default for TickgateConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_filter: "info".to_owned(),
            simulation: SimulationConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_work_per_tick: 1024,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            outbound_capacity: 16,
        }
    }
}

impl TickgateConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that rates and capacities are non-zero.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.simulation.tick_rate == 0 {
            return Err(ConfigError::Invalid("simulation.tick_rate must be > 0".into()));
        }
        if self.events.queue_capacity == 0 {
            return Err(ConfigError::Invalid("events.queue_capacity must be > 0".into()));
        }
        if self.events.outbound_capacity == 0 {
            return Err(ConfigError::Invalid("events.outbound_capacity must be > 0".into()));
        }
        Ok(())
    }
}
