//! # Event Stream Bridge
//!
//! Turns a subscription into a lazy, infinite sequence of records.
//!
//! ```text
//!   Idle ──► Registering ──► Active ──► Closed
//!              │ unsupported            ▲
//!              └────────────────────────┘
//!
//! simulation thread        drain task (tokio)            consumer
//! ┌──────────────┐ queue  ┌──────────────────────┐ out  ┌───────────┐
//! │ listener     │ ─────► │ select! {            │ ───► │EventStream│
//! │  try_send    │ (100)  │   consumer gone      │      └───────────┘
//! └──────────────┘        │   shutdown           │
//!                         │   next record        │
//!                         │ }                    │
//!                         └──────────────────────┘
//! ```
//!
//! Deregistration runs exactly once on every exit path and completes before
//! the consumer observes the end of the stream. If the drain task itself is
//! torn down, the [`Subscription`] guard submits the deregistration instead.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tickgate_core::{EventsConfig, ExecutionBridge};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::listener::{subscription_tag, SubscriptionListener, SubscriptionStats, SubscriptionStatsSnapshot};
use crate::record::{EventRecord, EventType};
use crate::registry::{HasListeners, ListenerId};

/// Why a stream ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// The consumer dropped the stream.
    Cancelled,
    /// The process is shutting down.
    Shutdown,
    /// The subscription queue closed underneath the drain task.
    QueueClosed,
    /// Registration on the simulation thread failed.
    RegistrationFailed,
}

/// Registration of one listener; deregisters exactly once.
struct Subscription<W: HasListeners + 'static> {
    id: ListenerId,
    tag: String,
    bridge: Option<ExecutionBridge<W>>,
}

impl<W: HasListeners + 'static> Subscription<W> {
    fn new(id: ListenerId, tag: String, bridge: ExecutionBridge<W>) -> Self {
        Self {
            id,
            tag,
            bridge: Some(bridge),
        }
    }

    /// Deregisters and waits until the simulation thread has done it.
    ///
    /// The removal is submitted fire-and-forget so it still runs if this
    /// future is dropped halfway.
    async fn close(mut self) {
        let Some(bridge) = self.bridge.take() else {
            return;
        };
        let id = self.id;
        let (done_tx, done_rx) = oneshot::channel();

        let submitted = bridge.submit(move |world: &mut W| {
            let removed = world.listeners().deregister_all(id);
            let _ = done_tx.send(removed);
        });

        match submitted {
            Ok(()) => match done_rx.await {
                Ok(removed) => debug!(tag = %self.tag, %id, removed, "subscription deregistered"),
                Err(_) => debug!(tag = %self.tag, %id, "simulation stopped before deregistration"),
            },
            Err(err) => debug!(tag = %self.tag, %id, error = %err, "listener already gone with the simulation"),
        }
    }
}

impl<W: HasListeners + 'static> Drop for Subscription<W> {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge.take() {
            let id = self.id;
            warn!(tag = %self.tag, %id, "subscription dropped without closing, deregistering");
            let _ = bridge.submit(move |world: &mut W| {
                world.listeners().deregister_all(id);
            });
        }
    }
}

/// Opens event streams against a simulation.
pub struct EventStreamBridge<W> {
    bridge: ExecutionBridge<W>,
    config: EventsConfig,
    shutdown: watch::Receiver<bool>,
}

impl<W> Clone for EventStreamBridge<W> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            config: self.config,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<W: HasListeners + 'static> EventStreamBridge<W> {
    /// Creates a stream bridge.
    ///
    /// Streams end when `shutdown` turns true or its sender is dropped.
    #[must_use]
    pub fn new(bridge: ExecutionBridge<W>, config: EventsConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            bridge,
            config,
            shutdown,
        }
    }

    /// Opens a stream of `event_type` records.
    ///
    /// Must be called inside a tokio runtime. An unsupported type yields a
    /// stream that ends without elements.
    ///
    /// Up to `queue_capacity + outbound_capacity` records can be buffered
    /// between the simulation and a slow consumer before new ones are dropped.
    #[must_use]
    pub fn open_stream(&self, event_type: EventType) -> EventStream {
        let tag = subscription_tag(event_type);
        let stats = Arc::new(SubscriptionStats::default());
        let (out_tx, out_rx) = mpsc::channel(self.config.outbound_capacity.max(1));

        tokio::spawn(drain(
            self.bridge.clone(),
            event_type,
            self.config.queue_capacity,
            out_tx,
            self.shutdown.clone(),
            Arc::clone(&stats),
            tag.clone(),
        ));

        EventStream {
            event_type,
            tag,
            rx: out_rx,
            stats,
        }
    }
}

async fn drain<W: HasListeners + 'static>(
    bridge: ExecutionBridge<W>,
    event_type: EventType,
    queue_capacity: usize,
    out_tx: mpsc::Sender<EventRecord>,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<SubscriptionStats>,
    tag: String,
) {
    let Some((listener, mut queue_rx)) =
        SubscriptionListener::new(event_type, queue_capacity, Arc::clone(&stats), tag.clone())
    else {
        warn!(%tag, %event_type, "unsupported event type, closing stream");
        return;
    };

    let subscription = Subscription::new(listener.id(), tag.clone(), bridge.clone());
    let registered = bridge
        .call(move |world: &mut W| world.listeners().register(listener))
        .await;

    let reason = match registered {
        Err(err) => {
            warn!(%tag, error = %err, "could not register listener");
            CloseReason::RegistrationFailed
        }
        Ok(id) => {
            info!(%tag, %id, "event stream active");
            forward(&mut queue_rx, &out_tx, &mut shutdown).await
        }
    };

    drop(queue_rx);
    subscription.close().await;

    let snapshot = stats.snapshot();
    info!(
        %tag,
        ?reason,
        enqueued = snapshot.enqueued,
        dropped = snapshot.dropped,
        delivered = snapshot.delivered,
        "event stream closed"
    );
    drop(out_tx);
}

/// Moves records from the queue to the consumer until one side goes away.
///
/// Every wait (for outbound room and for the next record) also watches the
/// shutdown signal, so a consumer that stopped reading cannot pin the
/// subscription open.
async fn forward(
    queue_rx: &mut mpsc::Receiver<EventRecord>,
    out_tx: &mpsc::Sender<EventRecord>,
    shutdown: &mut watch::Receiver<bool>,
) -> CloseReason {
    loop {
        if *shutdown.borrow() {
            return CloseReason::Shutdown;
        }

        let permit = tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    return CloseReason::Shutdown;
                }
                continue;
            }
            permit = out_tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => return CloseReason::Cancelled,
            },
        };

        let record = tokio::select! {
            biased;
            () = out_tx.closed() => return CloseReason::Cancelled,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    return CloseReason::Shutdown;
                }
                continue;
            }
            record = queue_rx.recv() => match record {
                Some(record) => record,
                None => return CloseReason::QueueClosed,
            },
        };
        permit.send(record);
    }
}

/// Consumer side of a subscription.
///
/// Dropping it cancels the subscription.
pub struct EventStream {
    event_type: EventType,
    tag: String,
    rx: mpsc::Receiver<EventRecord>,
    stats: Arc<SubscriptionStats>,
}

impl EventStream {
    /// Waits for the next record. `None` once the stream has closed.
    pub async fn next_record(&mut self) -> Option<EventRecord> {
        let record = self.rx.recv().await;
        if record.is_some() {
            self.stats.record_delivered();
        }
        record
    }

    /// Subscribed event type.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Log tag `<event type>[<creation unix seconds>]`.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Subscription counters.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Stream for EventStream {
    type Item = EventRecord;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = this.rx.poll_recv(cx);
        if let Poll::Ready(Some(_)) = &polled {
            this.stats.record_delivered();
        }
        polled
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("event_type", &self.event_type)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}
