//! # TICKGATE Events
//!
//! Push-style simulation callbacks turned into bounded, pull-style streams.
//!
//! ## Flow
//!
//! ```text
//! 1. Client opens a stream for an EventType
//! 2. Drain task registers a SubscriptionListener on the simulation thread
//! 3. Simulation dispatches RawEvents; the listener converts and enqueues
//! 4. Drain task forwards records to the EventStream
//! 5. Stream dropped / shutdown: listener deregistered, then the stream ends
//! ```
//!
//! ## Backpressure
//!
//! None reaches the simulation thread. When a subscriber falls behind, its
//! queue fills and new records are dropped (and counted).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod listener;
pub mod raw;
pub mod record;
pub mod registry;
pub mod stream;

pub use listener::{
    listener_spec, subscription_tag, ListenerSpec, SubscriptionListener, SubscriptionStats,
    SubscriptionStatsSnapshot,
};
pub use raw::{
    Hand, HitBlock, HitEntity, InteractAction, Interaction, ProjectileImpact, RawEvent, Shooter,
};
pub use record::{BlockHit, BlockPos, EventRecord, EventType, ProjectileHit, ProjectileTarget};
pub use registry::{HasListeners, ListenerId, ListenerRegistry};
pub use stream::{CloseReason, EventStream, EventStreamBridge};
