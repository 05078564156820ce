//! Benchmark for the listener hot path on the simulation thread.
//!
//! TARGET: dispatch must stay well under a microsecond per listener
//!
//! Run with: cargo bench --package tickgate_events --bench listener_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tickgate_events::{
    BlockPos, EventType, Hand, InteractAction, Interaction, ListenerRegistry, RawEvent,
    SubscriptionListener,
};

const BATCH: usize = 64;

fn chat_event() -> RawEvent {
    RawEvent::Chat {
        player: "alex".into(),
        message: "benchmarking the chat listener".into(),
    }
}

fn block_click() -> RawEvent {
    RawEvent::Interact(Interaction {
        player: "steve".into(),
        action: InteractAction::RightClickBlock,
        hand: Some(Hand::Main),
        clicked_block: Some(BlockPos::new(12, 64, -7)),
        item: Some("DIAMOND_PICKAXE".into()),
        face: "NORTH".into(),
    })
}

fn bench_single_listener(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener_handle");
    group.throughput(Throughput::Elements(BATCH as u64));

    for (name, event_type, raw) in [
        ("chat", EventType::ChatMessage, chat_event()),
        ("block_hit", EventType::BlockHit, block_click()),
    ] {
        let (listener, mut rx) =
            SubscriptionListener::new(event_type, BATCH, Arc::default(), name.into()).unwrap();

        group.bench_function(name, |b| {
            b.iter(|| {
                for _ in 0..BATCH {
                    black_box(listener.handle(black_box(&raw), false));
                }
                while rx.try_recv().is_ok() {}
            });
        });
    }

    group.finish();
}

fn bench_full_queue(c: &mut Criterion) {
    let (listener, _rx) =
        SubscriptionListener::new(EventType::ChatMessage, 1, Arc::default(), "full".into()).unwrap();
    let raw = chat_event();
    listener.handle(&raw, false);

    // Every further record is dropped; this is the overload path.
    c.bench_function("listener_handle_full_queue", |b| {
        b.iter(|| black_box(listener.handle(black_box(&raw), false)));
    });
}

fn bench_registry_dispatch(c: &mut Criterion) {
    let mut registry = ListenerRegistry::new();
    let mut receivers = Vec::new();
    for event_type in EventType::SUPPORTED {
        let (listener, rx) =
            SubscriptionListener::new(event_type, BATCH, Arc::default(), event_type.to_string())
                .unwrap();
        registry.register(listener);
        receivers.push(rx);
    }
    let raw = chat_event();

    let mut group = c.benchmark_group("registry_dispatch");
    group.throughput(Throughput::Elements(BATCH as u64));
    group.bench_function("six_listeners", |b| {
        b.iter(|| {
            for _ in 0..BATCH {
                black_box(registry.dispatch(black_box(&raw), false));
            }
            for rx in &mut receivers {
                while rx.try_recv().is_ok() {}
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_single_listener,
    bench_full_queue,
    bench_registry_dispatch
);
criterion_main!(benches);
