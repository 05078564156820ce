//! # Event Records
//!
//! What subscribers receive. Records are built once by a listener on the
//! simulation thread and never changed afterwards.

use std::fmt;

/// Integer block coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockPos {
    /// East-west.
    pub x: i32,
    /// Height.
    pub y: i32,
    /// North-south.
    pub z: i32,
}

impl BlockPos {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Kinds of events a client can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Placeholder value; no listener exists for it.
    Unspecified,
    /// A player joined.
    PlayerJoin,
    /// A player left.
    PlayerLeave,
    /// A player died.
    PlayerDeath,
    /// A player wrote in chat.
    ChatMessage,
    /// A player clicked a block with the main hand.
    BlockHit,
    /// A player-shot projectile hit something.
    ProjectileHit,
}

impl EventType {
    /// Every subscribable type.
    pub const SUPPORTED: [Self; 6] = [
        Self::PlayerJoin,
        Self::PlayerLeave,
        Self::PlayerDeath,
        Self::ChatMessage,
        Self::BlockHit,
        Self::ProjectileHit,
    ];

    /// Wire-style name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "EVENT_UNKNOWN",
            Self::PlayerJoin => "EVENT_PLAYER_JOIN",
            Self::PlayerLeave => "EVENT_PLAYER_LEAVE",
            Self::PlayerDeath => "EVENT_PLAYER_DEATH",
            Self::ChatMessage => "EVENT_CHAT_MESSAGE",
            Self::BlockHit => "EVENT_BLOCK_HIT",
            Self::ProjectileHit => "EVENT_PROJECTILE_HIT",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A main-hand block click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHit {
    /// Player who clicked.
    pub player: String,
    /// Right click (`true`) or left click.
    pub right_hand: bool,
    /// Held item type, lower-case, empty when the hand was empty.
    pub item_type: String,
    /// Clicked block.
    pub pos: BlockPos,
    /// Clicked face, lower-case.
    pub face: String,
}

/// What a projectile hit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectileTarget {
    /// Another player.
    Player(String),
    /// A non-player entity.
    Entity {
        /// Entity identifier.
        id: String,
        /// Entity type, lower-case.
        kind: String,
    },
    /// A block, with the face when known.
    Block {
        /// Block type, lower-case.
        kind: String,
        /// Face that was hit, lower-case.
        face: Option<String>,
    },
    /// Nothing was reported as hit.
    Nothing,
}

/// A projectile shot by a player hit something.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectileHit {
    /// Shooter.
    pub player: String,
    /// Projectile type, lower-case.
    pub projectile: String,
    /// Hit target.
    pub target: ProjectileTarget,
    /// Block coordinates of the target, if any.
    pub pos: Option<BlockPos>,
}

/// One streamed event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventRecord {
    /// A player joined.
    PlayerJoin {
        /// Player name.
        player: String,
    },
    /// A player left.
    PlayerLeave {
        /// Player name.
        player: String,
    },
    /// A player died.
    PlayerDeath {
        /// Player name.
        player: String,
        /// Death message as shown in chat.
        message: String,
    },
    /// A chat message.
    ChatMessage {
        /// Author.
        player: String,
        /// Message text.
        message: String,
    },
    /// A main-hand block click.
    BlockHit(BlockHit),
    /// A projectile hit.
    ProjectileHit(ProjectileHit),
}

impl EventRecord {
    /// Type tag of the record.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::PlayerJoin { .. } => EventType::PlayerJoin,
            Self::PlayerLeave { .. } => EventType::PlayerLeave,
            Self::PlayerDeath { .. } => EventType::PlayerDeath,
            Self::ChatMessage { .. } => EventType::ChatMessage,
            Self::BlockHit(_) => EventType::BlockHit,
            Self::ProjectileHit(_) => EventType::ProjectileHit,
        }
    }

    /// Player that triggered the event.
    #[must_use]
    pub fn player(&self) -> &str {
        match self {
            Self::PlayerJoin { player }
            | Self::PlayerLeave { player }
            | Self::PlayerDeath { player, .. }
            | Self::ChatMessage { player, .. } => player,
            Self::BlockHit(hit) => &hit.player,
            Self::ProjectileHit(hit) => &hit.player,
        }
    }
}
