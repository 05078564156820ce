//! # Sandbox Simulation
//!
//! A small in-memory game that implements the collaborator traits, so the
//! bridge and the command service can run end to end without a real server.
//!
//! ```text
//! SandboxCatalog   static material / entity type tables
//! SandboxWorld     flat worlds, players, entities, listener registry
//! ```
//!
//! Terrain is flat: stone up to the ground level, a grass layer on top and
//! air above. Only placed blocks are stored.

mod catalog;
mod world;

pub use catalog::SandboxCatalog;
pub use world::{SandboxWorld, GROUND_LEVEL, MAX_HEIGHT, MIN_HEIGHT};
