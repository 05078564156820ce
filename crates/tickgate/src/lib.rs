//! # TICKGATE
//!
//! Remote control surface over a tick-based simulation.
//!
//! ```text
//! client task ──call/submit──► CommandService ──FIFO queue──► simulation thread
//!      ▲                          (validates,                      │
//!      │                           catalog)                        │ events
//!      └──────── EventStream ◄── drain task ◄── listener queue ◄───┘
//! ```
//!
//! The [`sandbox`] module provides an in-memory simulation for tests and
//! the `tickgate_server` demo.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod model;
pub mod sandbox;
pub mod service;
pub mod traits;

pub use error::{TickgateError, TickgateResult};
pub use service::{CommandService, Reply, DEFAULT_WORLD};
pub use traits::{Catalog, EntityKind, EntityState, Location, Material, PlayerState, Simulation, WorldSummary};

pub use tickgate_core::{BridgeError, BridgeResult, Status, StatusCode};
pub use tickgate_events::{EventRecord, EventStream, EventType};
