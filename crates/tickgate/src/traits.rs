//! # Collaborator Traits
//!
//! What the command service needs from the game it controls.
//!
//! ```text
//! CommandService ──► Catalog      (any thread, immutable)
//!        │
//!        └─ bridge ─► Simulation  (simulation thread only)
//! ```
//!
//! Lookups return `Option` and never fail; mutations return
//! [`SimResult`] and their errors are translated into status codes.

use tickgate_core::{OutputCapture, SimResult, Simulated};
use tickgate_events::{BlockPos, HasListeners};
use uuid::Uuid;

use crate::model::MaterialFlags;

/// A placeable or holdable material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Material {
    /// Upper-case name, e.g. `STONE`.
    pub name: String,
    /// Namespaced key, e.g. `minecraft:stone`.
    pub key: String,
    /// Properties.
    pub flags: MaterialFlags,
}

/// A type of entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityKind {
    /// Upper-case name, e.g. `ZOMBIE`.
    pub name: String,
    /// Namespaced key, e.g. `minecraft:zombie`.
    pub key: String,
    /// Can be spawned on request.
    pub spawnable: bool,
}

/// Immutable, thread-safe game data.
pub trait Catalog: Send + Sync + 'static {
    /// Looks up a material by name or key, ignoring case.
    fn material(&self, name: &str) -> Option<Material>;

    /// Every material.
    fn materials(&self) -> Vec<Material>;

    /// Looks up an entity type by name, ignoring case.
    fn entity_kind(&self, name: &str) -> Option<EntityKind>;

    /// Every entity type, including the placeholder `UNKNOWN` type if the
    /// game has one.
    fn entity_kinds(&self) -> Vec<EntityKind>;
}

/// A full location in some world.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    /// World name.
    pub world: String,
    /// East-west.
    pub x: f64,
    /// Height.
    pub y: f64,
    /// North-south.
    pub z: f64,
    /// Rotation around the vertical axis, degrees.
    pub yaw: f32,
    /// Up/down angle, degrees.
    pub pitch: f32,
}

/// Summary of a loaded world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSummary {
    /// World name.
    pub name: String,
    /// Namespaced key.
    pub key: String,
    /// Player-versus-player enabled.
    pub pvp: bool,
}

/// An online player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Player name.
    pub name: String,
    /// Where the player is.
    pub location: Location,
}

/// A live entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityState {
    /// Identifier.
    pub id: Uuid,
    /// Type.
    pub kind: EntityKind,
    /// Where the entity is.
    pub location: Location,
}

/// The live simulation. Only ever touched on the simulation thread.
pub trait Simulation: Simulated + HasListeners {
    /// Version string of the simulation.
    fn version(&self) -> String;

    /// Loaded worlds; the first one is the default world.
    fn worlds(&self) -> Vec<WorldSummary>;

    /// Looks up a world.
    fn world(&self, name: &str) -> Option<WorldSummary>;

    /// Enables or disables PvP in a world.
    ///
    /// # Errors
    ///
    /// When the world refuses the change.
    fn set_pvp(&mut self, world: &str, pvp: bool) -> SimResult<()>;

    /// Highest non-air block of a column and its material name.
    fn highest_block(&self, world: &str, x: i32, z: i32) -> Option<(BlockPos, String)>;

    /// Material name of a block.
    fn block_at(&self, world: &str, pos: BlockPos) -> Option<String>;

    /// Places a block.
    ///
    /// # Errors
    ///
    /// When the position is outside the world.
    fn set_block(&mut self, world: &str, pos: BlockPos, material: &Material) -> SimResult<()>;

    /// Online players.
    fn online_players(&self) -> Vec<PlayerState>;

    /// Looks up an online player.
    fn player(&self, name: &str) -> Option<PlayerState>;

    /// Moves a player.
    ///
    /// # Errors
    ///
    /// When the player cannot be moved there.
    fn teleport_player(&mut self, name: &str, to: Location) -> SimResult<()>;

    /// Sends a message to one player. Returns false if the player is offline.
    fn send_message(&mut self, player: &str, message: &str) -> bool;

    /// Sends a message to everyone. Returns the number of recipients.
    fn broadcast(&mut self, message: &str) -> usize;

    /// Spawns an entity.
    ///
    /// # Errors
    ///
    /// When the entity cannot be spawned at that location.
    fn spawn_entity(&mut self, at: Location, kind: &EntityKind) -> SimResult<EntityState>;

    /// Looks up an entity.
    fn entity(&self, id: Uuid) -> Option<EntityState>;

    /// Entities in a world.
    fn entities_in(&self, world: &str) -> Vec<EntityState>;

    /// Moves an entity.
    ///
    /// # Errors
    ///
    /// When the entity cannot be moved there.
    fn teleport_entity(&mut self, id: Uuid, to: Location) -> SimResult<()>;

    /// Runs a console command, writing its output to `output` when given.
    ///
    /// Returns whether a command handled the line.
    ///
    /// # Errors
    ///
    /// When the command itself fails.
    fn dispatch_command(&mut self, command: &str, output: Option<&mut OutputCapture>) -> SimResult<bool>;
}
