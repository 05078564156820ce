//! # Subscription Listeners
//!
//! One listener per active subscription. The simulation calls
//! [`SubscriptionListener::handle`] synchronously for every raw event; the
//! listener filters, converts and offers the record to its bounded queue.
//!
//! ```text
//! RawEvent ──► accepts? ──► convert ──► try_send ──► queue (cap 100)
//!                 │ no          │ panic       │ full
//!                 ▼             ▼             ▼
//!              ignore      log + ignore   drop NEW + warn
//! ```
//!
//! The variants form a closed table keyed by [`EventType`]; there is no
//! listener for [`EventType::Unspecified`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use crate::raw::{Hand, HitEntity, InteractAction, RawEvent, Shooter};
use crate::record::{BlockHit, EventRecord, EventType, ProjectileHit, ProjectileTarget};
use crate::registry::ListenerId;

/// Predicate and converter for one event type.
pub struct ListenerSpec {
    /// Event type served.
    pub event_type: EventType,
    /// Name used in log lines.
    pub name: &'static str,
    /// Selects relevant raw events.
    pub accepts: fn(&RawEvent) -> bool,
    /// Builds the record for an accepted event.
    pub convert: fn(&RawEvent) -> Option<EventRecord>,
}

static LISTENERS: [ListenerSpec; 6] = [
    ListenerSpec {
        event_type: EventType::PlayerJoin,
        name: "player_join",
        accepts: |raw| matches!(raw, RawEvent::PlayerJoin { .. }),
        convert: convert_player_join,
    },
    ListenerSpec {
        event_type: EventType::PlayerLeave,
        name: "player_leave",
        accepts: |raw| matches!(raw, RawEvent::PlayerQuit { .. }),
        convert: convert_player_leave,
    },
    ListenerSpec {
        event_type: EventType::PlayerDeath,
        name: "player_death",
        accepts: |raw| matches!(raw, RawEvent::PlayerDeath { .. }),
        convert: convert_player_death,
    },
    ListenerSpec {
        event_type: EventType::ChatMessage,
        name: "chat_message",
        accepts: |raw| matches!(raw, RawEvent::Chat { .. }),
        convert: convert_chat_message,
    },
    ListenerSpec {
        event_type: EventType::BlockHit,
        name: "block_hit",
        accepts: accepts_block_hit,
        convert: convert_block_hit,
    },
    ListenerSpec {
        event_type: EventType::ProjectileHit,
        name: "projectile_hit",
        accepts: accepts_projectile_hit,
        convert: convert_projectile_hit,
    },
];

/// Looks up the table entry for `event_type`.
#[must_use]
pub fn listener_spec(event_type: EventType) -> Option<&'static ListenerSpec> {
    LISTENERS.iter().find(|spec| spec.event_type == event_type)
}

fn convert_player_join(raw: &RawEvent) -> Option<EventRecord> {
    let RawEvent::PlayerJoin { player } = raw else {
        return None;
    };
    Some(EventRecord::PlayerJoin {
        player: player.clone(),
    })
}

fn convert_player_leave(raw: &RawEvent) -> Option<EventRecord> {
    let RawEvent::PlayerQuit { player } = raw else {
        return None;
    };
    Some(EventRecord::PlayerLeave {
        player: player.clone(),
    })
}

fn convert_player_death(raw: &RawEvent) -> Option<EventRecord> {
    let RawEvent::PlayerDeath {
        player,
        death_message,
    } = raw
    else {
        return None;
    };
    Some(EventRecord::PlayerDeath {
        player: player.clone(),
        message: death_message.clone(),
    })
}

fn convert_chat_message(raw: &RawEvent) -> Option<EventRecord> {
    let RawEvent::Chat { player, message } = raw else {
        return None;
    };
    Some(EventRecord::ChatMessage {
        player: player.clone(),
        message: message.clone(),
    })
}

fn accepts_block_hit(raw: &RawEvent) -> bool {
    let RawEvent::Interact(interaction) = raw else {
        return false;
    };
    matches!(
        interaction.action,
        InteractAction::LeftClickBlock | InteractAction::RightClickBlock
    ) && interaction.hand == Some(Hand::Main)
        && interaction.clicked_block.is_some()
}

fn convert_block_hit(raw: &RawEvent) -> Option<EventRecord> {
    let RawEvent::Interact(interaction) = raw else {
        return None;
    };
    let pos = interaction.clicked_block?;
    Some(EventRecord::BlockHit(BlockHit {
        player: interaction.player.clone(),
        right_hand: interaction.action == InteractAction::RightClickBlock,
        item_type: interaction
            .item
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default(),
        pos,
        face: interaction.face.to_lowercase(),
    }))
}

fn accepts_projectile_hit(raw: &RawEvent) -> bool {
    matches!(
        raw,
        RawEvent::ProjectileHit(impact) if matches!(impact.shooter, Some(Shooter::Player(_)))
    )
}

fn convert_projectile_hit(raw: &RawEvent) -> Option<EventRecord> {
    let RawEvent::ProjectileHit(impact) = raw else {
        return None;
    };
    let Some(Shooter::Player(shooter)) = &impact.shooter else {
        return None;
    };

    let (target, pos) = match (&impact.hit_entity, &impact.hit_block) {
        (Some(entity), block) => {
            if block.is_some() {
                warn!("projectile_hit: entity and block hit at once, using the entity");
            }
            match entity {
                HitEntity::Player { name, pos } => (ProjectileTarget::Player(name.clone()), Some(*pos)),
                HitEntity::Entity { id, kind, pos } => (
                    ProjectileTarget::Entity {
                        id: id.clone(),
                        kind: kind.to_lowercase(),
                    },
                    Some(*pos),
                ),
            }
        }
        (None, Some(block)) => {
            if block.face.is_none() {
                warn!("projectile_hit: block hit without a face");
            }
            (
                ProjectileTarget::Block {
                    kind: block.kind.to_lowercase(),
                    face: block.face.as_deref().map(str::to_lowercase),
                },
                Some(block.pos),
            )
        }
        (None, None) => (ProjectileTarget::Nothing, None),
    };

    Some(EventRecord::ProjectileHit(ProjectileHit {
        player: shooter.clone(),
        projectile: impact.projectile.to_lowercase(),
        target,
        pos,
    }))
}

/// Per-subscription counters.
#[derive(Debug, Default)]
pub struct SubscriptionStats {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
}

/// Point-in-time copy of [`SubscriptionStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionStatsSnapshot {
    /// Records accepted into the queue.
    pub enqueued: u64,
    /// Records dropped because the queue was full.
    pub dropped: u64,
    /// Records taken from the stream by its consumer.
    pub delivered: u64,
}

impl SubscriptionStats {
    /// Takes a snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> SubscriptionStatsSnapshot {
        SubscriptionStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }
}

/// Log tag of a subscription: `<event type>[<creation unix seconds>]`.
#[must_use]
pub fn subscription_tag(event_type: EventType) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{event_type}[{secs}]")
}

/// Adapter between the simulation's dispatcher and one subscription queue.
pub struct SubscriptionListener {
    id: ListenerId,
    spec: &'static ListenerSpec,
    queue: mpsc::Sender<EventRecord>,
    stats: Arc<SubscriptionStats>,
    tag: String,
}

impl SubscriptionListener {
    /// Builds a listener and the receiving end of its queue.
    ///
    /// Returns `None` for event types without a listener.
    #[must_use]
    pub fn new(
        event_type: EventType,
        capacity: usize,
        stats: Arc<SubscriptionStats>,
        tag: String,
    ) -> Option<(Self, mpsc::Receiver<EventRecord>)> {
        let spec = listener_spec(event_type)?;
        Some(Self::from_spec(spec, capacity, stats, tag))
    }

    fn from_spec(
        spec: &'static ListenerSpec,
        capacity: usize,
        stats: Arc<SubscriptionStats>,
        tag: String,
    ) -> (Self, mpsc::Receiver<EventRecord>) {
        let (queue, rx) = mpsc::channel(capacity.max(1));
        let listener = Self {
            id: ListenerId::next(),
            spec,
            queue,
            stats,
            tag,
        };
        (listener, rx)
    }

    /// Registration handle of this listener.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Event type served.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.spec.event_type
    }

    /// Log tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Handles one raw event. Never blocks.
    ///
    /// Returns true if a record was enqueued.
    pub fn handle(&self, raw: &RawEvent, cancelled: bool) -> bool {
        if cancelled || !(self.spec.accepts)(raw) {
            return false;
        }

        let convert = self.spec.convert;
        let record = match catch_unwind(AssertUnwindSafe(|| convert(raw))) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(_) => {
                error!(tag = %self.tag, listener = self.spec.name, "listener failed to convert event");
                return false;
            }
        };

        match self.queue.try_send(record) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(tag = %self.tag, "{}: event dropped", self.spec.name);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(tag = %self.tag, "subscription queue closed, awaiting deregistration");
                false
            }
        }
    }

    /// Counters shared with the stream handle.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for SubscriptionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionListener")
            .field("id", &self.id)
            .field("event_type", &self.spec.event_type)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}
