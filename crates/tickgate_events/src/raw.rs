//! # Raw Simulation Callbacks
//!
//! The push-side vocabulary: what the simulation reports when something
//! happens. Names of materials, entity kinds and faces arrive in whatever
//! case the simulation uses; listeners normalize them.

use crate::record::BlockPos;

/// What a player did in an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractAction {
    /// Left click on a block.
    LeftClickBlock,
    /// Right click on a block.
    RightClickBlock,
    /// Left click into the air.
    LeftClickAir,
    /// Right click into the air.
    RightClickAir,
    /// Stepping on pressure plates and the like.
    Physical,
}

/// Hand used for an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hand {
    /// Main hand.
    Main,
    /// Off hand.
    Off,
}

/// A player interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interaction {
    /// Acting player.
    pub player: String,
    /// Kind of interaction.
    pub action: InteractAction,
    /// Hand used; absent for physical actions.
    pub hand: Option<Hand>,
    /// Clicked block, if any.
    pub clicked_block: Option<BlockPos>,
    /// Held item type, if any.
    pub item: Option<String>,
    /// Clicked face.
    pub face: String,
}

/// Who fired a projectile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shooter {
    /// A player.
    Player(String),
    /// A mob, dispenser or other non-player source.
    Other(String),
}

/// An entity struck by a projectile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HitEntity {
    /// A player.
    Player {
        /// Player name.
        name: String,
        /// Where the player stood.
        pos: BlockPos,
    },
    /// Any other entity.
    Entity {
        /// Entity identifier.
        id: String,
        /// Entity type.
        kind: String,
        /// Where the entity was.
        pos: BlockPos,
    },
}

/// A block struck by a projectile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HitBlock {
    /// Block type.
    pub kind: String,
    /// Block position.
    pub pos: BlockPos,
    /// Face that was hit, when the simulation knows it.
    pub face: Option<String>,
}

/// A projectile landing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectileImpact {
    /// Projectile type.
    pub projectile: String,
    /// Source, if known.
    pub shooter: Option<Shooter>,
    /// Entity hit, if any.
    pub hit_entity: Option<HitEntity>,
    /// Block hit, if any.
    pub hit_block: Option<HitBlock>,
}

/// A callback from the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawEvent {
    /// A player joined.
    PlayerJoin {
        /// Player name.
        player: String,
    },
    /// A player left.
    PlayerQuit {
        /// Player name.
        player: String,
    },
    /// A player died.
    PlayerDeath {
        /// Player name.
        player: String,
        /// Death message.
        death_message: String,
    },
    /// A player wrote in chat.
    Chat {
        /// Author.
        player: String,
        /// Message text.
        message: String,
    },
    /// A player interacted with the world.
    Interact(Interaction),
    /// A projectile hit something.
    ProjectileHit(ProjectileImpact),
}
