//! # Request and Response Messages
//!
//! Plain data carried by the command service. Optional fields model
//! "field not set" on the wire; empty strings and lists are treated as
//! absent where the operations say so.

use tickgate_core::Status;
pub use tickgate_events::BlockPos;

/// Floating point position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3f {
    /// East-west.
    pub x: f32,
    /// Height.
    pub y: f32,
    /// North-south.
    pub z: f32,
}

impl Vec3f {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Facing direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    /// Rotation around the vertical axis, degrees.
    pub yaw: f32,
    /// Up/down angle, degrees.
    pub pitch: f32,
}

/// Where an entity or player is. Unset parts keep their current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityLocation {
    /// World name.
    pub world: Option<String>,
    /// Position.
    pub pos: Option<Vec3f>,
    /// Facing.
    pub orientation: Option<Orientation>,
}

impl EntityLocation {
    /// True if no part is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.world.is_none() && self.pos.is_none() && self.orientation.is_none()
    }
}

/// World settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldInfo {
    /// Namespaced key (read-only).
    pub key: String,
    /// Player-versus-player enabled.
    pub pvp: bool,
}

/// A world reference, optionally with settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct World {
    /// World name.
    pub name: String,
    /// Settings to apply (requests) or report (responses).
    pub info: Option<WorldInfo>,
}

impl World {
    /// A bare world reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info: None,
        }
    }
}

/// Block description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// Material name.
    pub block_type: String,
    /// Extra block data (unsupported).
    pub nbt: Option<String>,
}

impl BlockInfo {
    /// A block type without extra data.
    #[must_use]
    pub fn of(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            nbt: None,
        }
    }
}

/// A single block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// World; the default world when unset.
    pub world: Option<String>,
    /// Block coordinates.
    pub pos: BlockPos,
    /// Block description.
    pub info: Option<BlockInfo>,
}

/// Many blocks of the same type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blocks {
    /// World; the default world when unset.
    pub world: Option<String>,
    /// Positions (for cubes: exactly two corners).
    pub pos: Vec<BlockPos>,
    /// Block description.
    pub info: Option<BlockInfo>,
}

/// A player.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Player {
    /// Player name.
    pub name: String,
    /// Location.
    pub location: Option<EntityLocation>,
}

/// An entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    /// Identifier (UUID text); empty when unknown.
    pub id: String,
    /// Entity type; empty when unknown.
    pub kind: String,
    /// Location.
    pub location: Option<EntityLocation>,
}

/// Material properties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MaterialFlags {
    /// Is air.
    pub is_air: bool,
    /// Can be placed as a block.
    pub is_block: bool,
    /// Can burn away.
    pub is_burnable: bool,
    /// Can be eaten.
    pub is_edible: bool,
    /// Can catch fire.
    pub is_flammable: bool,
    /// Works as furnace fuel.
    pub is_fuel: bool,
    /// Reacts to clicks.
    pub is_interactable: bool,
    /// Exists as an item.
    pub is_item: bool,
    /// Blocks light.
    pub is_occluding: bool,
    /// Is solid.
    pub is_solid: bool,
    /// Falls when unsupported.
    pub has_gravity: bool,
}

/// One material in a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterialEntry {
    /// Namespaced key.
    pub key: String,
    /// Properties, unless only keys were requested.
    pub flags: Option<MaterialFlags>,
}

/// One entity type in a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityTypeEntry {
    /// Namespaced key.
    pub key: String,
    /// Spawnable flag, unless only keys were requested.
    pub is_spawnable: Option<bool>,
}

/// Command execution request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandRequest {
    /// Command line without the leading slash.
    pub command: String,
    /// Wait for the command to run.
    pub blocking: bool,
    /// Capture and return the command's output (implies blocking).
    pub output: bool,
}

/// Chat message request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatPostRequest {
    /// Message text.
    pub message: String,
    /// Recipient; everyone when unset.
    pub player: Option<String>,
}

/// Highest-block request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeightRequest {
    /// World; the default world when unset.
    pub world: Option<String>,
    /// Column x.
    pub x: i32,
    /// Column z.
    pub z: i32,
}

/// Block read request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockRequest {
    /// World; the default world when unset.
    pub world: Option<String>,
    /// Block coordinates.
    pub pos: BlockPos,
    /// Also return block data (unsupported).
    pub with_data: bool,
}

/// Player query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerRequest {
    /// Names to look up; all online players when empty.
    pub names: Vec<String>,
    /// Include locations.
    pub with_locations: bool,
}

/// Which entities to return.
#[derive(Clone, Debug, PartialEq)]
pub enum EntitySelector {
    /// These entities (by id); unknown ids are skipped.
    Specific(Vec<Entity>),
    /// All entities of a world.
    Worldwide {
        /// World; the default world when unset.
        world: Option<String>,
        /// Only this entity type; any when empty.
        kind: String,
        /// Also return entities whose type cannot be spawned.
        include_not_spawnable: bool,
    },
}

/// Entity query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityRequest {
    /// Selection.
    pub selector: Option<EntitySelector>,
    /// Include locations.
    pub with_locations: bool,
}

/// Versions of the simulation and of the bridge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerInfoResponse {
    /// Simulation version string.
    pub sim_version: String,
    /// Bridge version.
    pub bridge_version: String,
}

/// Material listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterialResponse {
    /// Outcome.
    pub status: Status,
    /// Materials.
    pub materials: Vec<MaterialEntry>,
}

/// Entity type listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityTypeResponse {
    /// Outcome.
    pub status: Status,
    /// Entity types.
    pub types: Vec<EntityTypeEntry>,
}

/// Command outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandResponse {
    /// Outcome; with output capture the extra holds the dispatch result.
    pub status: Status,
    /// Captured output, formatting codes removed.
    pub output: Option<String>,
}

/// World listing or update outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldResponse {
    /// Outcome.
    pub status: Status,
    /// Worlds.
    pub worlds: Vec<World>,
}

/// Highest block of a column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeightResponse {
    /// Outcome.
    pub status: Status,
    /// The block.
    pub block: Option<Block>,
}

/// Block read outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockResponse {
    /// Outcome.
    pub status: Status,
    /// Block description.
    pub info: Option<BlockInfo>,
}

/// Player query outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerResponse {
    /// Outcome.
    pub status: Status,
    /// Players.
    pub players: Vec<Player>,
}

/// Spawn outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnedEntityResponse {
    /// Outcome.
    pub status: Status,
    /// The new entity (id and type).
    pub entity: Option<Entity>,
}

/// Entity query outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityResponse {
    /// Outcome.
    pub status: Status,
    /// Entities.
    pub entities: Vec<Entity>,
}

macro_rules! failed_with {
    ($($response:ty),* $(,)?) => {
        $(
            impl From<Status> for $response {
                fn from(status: Status) -> Self {
                    Self {
                        status,
                        ..Self::default()
                    }
                }
            }
        )*
    };
}

failed_with!(
    MaterialResponse,
    EntityTypeResponse,
    CommandResponse,
    WorldResponse,
    HeightResponse,
    BlockResponse,
    PlayerResponse,
    SpawnedEntityResponse,
    EntityResponse,
);
