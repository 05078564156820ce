//! # Error Types
//!
//! Errors raised by the bridge, by the simulation while running submitted
//! work, and by configuration loading.

use thiserror::Error;

use crate::status::{Status, StatusCode};

/// Failures of the execution bridge itself.
///
/// Client input problems never show up here; they are answered with a
/// [`Status`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The simulation thread is gone (shut down or never started).
    #[error("simulation thread unavailable")]
    Unavailable,

    /// The submitted work panicked on the simulation thread.
    #[error("work panicked on the simulation thread: {0}")]
    Panicked(String),
}

/// Result type for bridge submissions.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Domain failures raised by the simulation while executing a work item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The simulation rejected an argument.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The simulation is not in a state that allows the call.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Result type for simulation-side operations.
pub type SimResult<T> = Result<T, SimError>;

impl From<SimError> for Status {
    fn from(err: SimError) -> Self {
        match err {
            SimError::IllegalArgument(msg) => Status::with_extra(StatusCode::InvalidArgument, msg),
            SimError::IllegalState(msg) => Status::with_extra(StatusCode::FailedPrecondition, msg),
            SimError::Other(msg) => Status::with_extra(StatusCode::Unknown, msg),
        }
    }
}

/// Errors while starting the simulation host.
#[derive(Error, Debug)]
pub enum HostError {
    /// The simulation thread could not be spawned.
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for host startup.
pub type HostResult<T> = Result<T, HostError>;

/// Errors while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for the expected layout.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
