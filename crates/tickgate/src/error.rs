//! Errors surfaced by the server binary.

use thiserror::Error;
use tickgate_core::{BridgeError, ConfigError, HostError};

/// Top-level failures of the server.
#[derive(Error, Debug)]
pub enum TickgateError {
    /// Configuration could not be loaded.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// The simulation thread could not be started.
    #[error("simulation host: {0}")]
    Host(#[from] HostError),

    /// A call into the simulation failed.
    #[error("bridge: {0}")]
    Bridge(#[from] BridgeError),
}

/// Result type for the server.
pub type TickgateResult<T> = Result<T, TickgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_converts() {
        let err: TickgateError = BridgeError::Unavailable.into();
        assert_eq!(err.to_string(), "bridge: simulation thread unavailable");
    }
}
