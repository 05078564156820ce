//! Command service operations against the sandbox on a live simulation thread.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tickgate::model::{
    Block, BlockInfo, BlockRequest, Blocks, ChatPostRequest, CommandRequest, Entity, EntityLocation,
    EntityRequest, EntitySelector, HeightRequest, Orientation, Player, PlayerRequest, Vec3f, World,
    WorldInfo,
};
use tickgate::sandbox::{SandboxCatalog, SandboxWorld, GROUND_LEVEL, MAX_HEIGHT};
use tickgate::{BridgeError, CommandService, EventRecord, EventType, Simulation, StatusCode};
use tickgate_core::{EventsConfig, HostHandle, SimulationConfig, SimulationHost};
use tickgate_events::{BlockPos, EventStreamBridge, HasListeners};
use tokio::sync::watch;

type Service = CommandService<SandboxWorld, SandboxCatalog>;

struct Harness {
    service: Service,
    host: HostHandle<SandboxWorld>,
    _shutdown: watch::Sender<bool>,
}

fn start() -> Harness {
    start_with(SandboxWorld::new())
}

fn start_with(world: SandboxWorld) -> Harness {
    let config = SimulationConfig {
        tick_rate: 100,
        max_work_per_tick: 0,
    };
    let (bridge, host) = SimulationHost::spawn(world, &config).unwrap();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let streams = EventStreamBridge::new(bridge.clone(), EventsConfig::default(), shutdown_rx);
    let service = CommandService::new(bridge, streams, Arc::new(SandboxCatalog::new()), true);
    Harness {
        service,
        host,
        _shutdown: shutdown,
    }
}

fn with_players(names: &[&str]) -> SandboxWorld {
    let mut world = SandboxWorld::new();
    for name in names {
        world.join(name);
    }
    world
}

async fn block_at(service: &Service, pos: BlockPos) -> Option<String> {
    service
        .bridge()
        .call(move |w: &mut SandboxWorld| w.block_at("world", pos))
        .await
        .unwrap()
}

fn zombie_at(x: f32, y: f32, z: f32) -> Entity {
    Entity {
        kind: "zombie".into(),
        location: Some(EntityLocation {
            world: None,
            pos: Some(Vec3f::new(x, y, z)),
            orientation: None,
        }),
        ..Entity::default()
    }
}

// =============================================================================
// Server info and catalog
// =============================================================================

#[tokio::test]
async fn test_server_info_reports_both_versions() {
    let h = start();
    let info = h.service.get_server_info().await.unwrap();
    assert!(info.sim_version.starts_with("sandbox"));
    assert_eq!(info.bridge_version, tickgate_core::BRIDGE_VERSION);
    h.host.shutdown();
}

#[tokio::test]
async fn test_material_listing() {
    let h = start();
    let full = h.service.get_materials(false);
    assert!(full.status.is_ok());
    let stone = full.materials.iter().find(|m| m.key == "minecraft:stone").unwrap();
    assert!(stone.flags.unwrap().is_solid);

    let keys = h.service.get_materials(true);
    assert_eq!(keys.materials.len(), full.materials.len());
    assert!(keys.materials.iter().all(|m| m.flags.is_none()));
    h.host.shutdown();
}

#[tokio::test]
async fn test_entity_type_listing_skips_unknown() {
    let h = start();
    let types = h.service.get_entity_types(false);
    assert!(types.types.iter().all(|t| t.key != "minecraft:unknown"));
    let player = types.types.iter().find(|t| t.key == "minecraft:player").unwrap();
    assert_eq!(player.is_spawnable, Some(false));
    assert!(h.service.get_entity_types(true).types.iter().all(|t| t.is_spawnable.is_none()));
    h.host.shutdown();
}

// =============================================================================
// Commands and chat
// =============================================================================

#[tokio::test]
async fn test_command_with_output() {
    let h = start();
    let response = h
        .service
        .run_command(CommandRequest {
            command: "/time set 4000".into(),
            blocking: false,
            output: true,
        })
        .await
        .unwrap();
    assert_eq!(response.status.code(), StatusCode::Ok);
    assert_eq!(response.status.extra(), Some("true"));
    assert_eq!(response.output.as_deref(), Some("Set the time to 4000\n"));

    let unknown = h
        .service
        .run_command(CommandRequest {
            command: "fly".into(),
            output: true,
            ..CommandRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(unknown.status.extra(), Some("false"));
    assert!(unknown.output.unwrap().starts_with("Unknown command"));
    h.host.shutdown();
}

#[tokio::test]
async fn test_command_validation_and_modes() {
    let h = start();
    let empty = h
        .service
        .run_command(CommandRequest {
            command: " / ".into(),
            ..CommandRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(empty.status.code(), StatusCode::MissingArgument);
    assert_eq!(empty.status.extra(), Some("CommandRequest.command"));

    let failed = h
        .service
        .run_command(CommandRequest {
            command: "time set soon".into(),
            blocking: true,
            output: false,
        })
        .await
        .unwrap();
    assert_eq!(failed.status.code(), StatusCode::InvalidArgument);
    assert!(failed.output.is_none());

    // Fire-and-forget, then observe through the same FIFO queue.
    let queued = h
        .service
        .run_command(CommandRequest {
            command: "time set 777".into(),
            ..CommandRequest::default()
        })
        .await
        .unwrap();
    assert!(queued.status.is_ok());
    let time = h.service.bridge().call(|w: &mut SandboxWorld| w.time_of_day()).await.unwrap();
    assert!(time >= 777);
    h.host.shutdown();
}

#[tokio::test]
async fn test_post_to_chat() {
    let h = start_with(with_players(&["alex", "steve"]));
    let status = h
        .service
        .post_to_chat(ChatPostRequest {
            message: "server restart in 5".into(),
            player: None,
        })
        .await
        .unwrap();
    assert!(status.is_ok());
    assert_eq!(status.extra(), Some("2"));

    let missing = h
        .service
        .post_to_chat(ChatPostRequest {
            message: "hi".into(),
            player: Some("herobrine".into()),
        })
        .await
        .unwrap();
    assert_eq!(missing.code(), StatusCode::PlayerNotFound);
    assert_eq!(missing.extra(), Some("herobrine"));

    assert!(h
        .service
        .post_to_chat(ChatPostRequest {
            message: "psst".into(),
            player: Some("alex".into()),
        })
        .await
        .unwrap()
        .is_ok());
    let world = h.host.shutdown().unwrap();
    assert_eq!(world.inbox("alex"), ["server restart in 5", "psst"]);
    assert_eq!(world.inbox("steve"), ["server restart in 5"]);
}

// =============================================================================
// Worlds and blocks
// =============================================================================

#[tokio::test]
async fn test_access_worlds() {
    let h = start();
    let all = h.service.access_worlds(Vec::new()).await.unwrap();
    assert_eq!(all.worlds.len(), 2);
    assert_eq!(all.worlds[0].name, "world");
    assert_eq!(all.worlds[0].info.as_ref().unwrap().key, "minecraft:overworld");

    let updated = h
        .service
        .access_worlds(vec![World {
            name: "world_nether".into(),
            info: Some(WorldInfo {
                key: String::new(),
                pvp: false,
            }),
        }])
        .await
        .unwrap();
    assert!(updated.status.is_ok());
    assert_eq!(updated.worlds, vec![World::named("world_nether")]);
    let nether = h.service.access_worlds(Vec::new()).await.unwrap().worlds.remove(1);
    assert!(!nether.info.unwrap().pvp);

    let missing = h
        .service
        .access_worlds(vec![World::named("world"), World::named("the_end")])
        .await
        .unwrap();
    assert_eq!(missing.status.code(), StatusCode::WorldNotFound);
    assert_eq!(missing.status.extra(), Some("the_end"));
    assert!(missing.worlds.is_empty());
    h.host.shutdown();
}

#[tokio::test]
async fn test_height_and_block_reads() {
    let h = start();
    let height = h
        .service
        .get_height(HeightRequest {
            world: None,
            x: 10,
            z: -4,
        })
        .await
        .unwrap();
    let block = height.block.unwrap();
    assert_eq!(block.pos, BlockPos::new(10, GROUND_LEVEL, -4));
    assert_eq!(block.info.unwrap().block_type, "grass_block");

    let with_data = h
        .service
        .get_block(BlockRequest {
            world: Some("world".into()),
            pos: BlockPos::new(0, 0, 0),
            with_data: true,
        })
        .await
        .unwrap();
    assert_eq!(with_data.status.code(), StatusCode::NotImplemented);
    assert_eq!(with_data.status.extra(), Some("getBlock(withData=True)"));
    assert_eq!(with_data.info.unwrap().block_type, "stone");

    let missing = h
        .service
        .get_height(HeightRequest {
            world: Some("the_end".into()),
            x: 0,
            z: 0,
        })
        .await
        .unwrap();
    assert_eq!(missing.status.code(), StatusCode::WorldNotFound);
    h.host.shutdown();
}

#[tokio::test]
async fn test_unknown_material_is_rejected_without_submission() {
    let h = start();
    let before = h.service.bridge().stats().submitted;

    let status = h
        .service
        .set_block(Block {
            world: None,
            pos: BlockPos::new(1, 70, 1),
            info: Some(BlockInfo::of("unobtainium")),
        })
        .await
        .unwrap();

    assert_eq!(status.code(), StatusCode::BlockTypeNotFound);
    assert_eq!(status.extra(), Some("unobtainium"));
    assert_eq!(h.service.bridge().stats().submitted, before);
    h.host.shutdown();
}

#[tokio::test]
async fn test_set_block_validation() {
    let h = start();
    let pos = BlockPos::new(1, 70, 1);

    let missing = h.service.set_block(Block { world: None, pos, info: None }).await.unwrap();
    assert_eq!(missing.code(), StatusCode::MissingArgument);
    assert_eq!(missing.extra(), Some("Block.info"));

    let nbt = h
        .service
        .set_block(Block {
            world: None,
            pos,
            info: Some(BlockInfo {
                block_type: "chest".into(),
                nbt: Some("{Items:[]}".into()),
            }),
        })
        .await
        .unwrap();
    assert_eq!(nbt.code(), StatusCode::NotImplemented);
    assert_eq!(nbt.extra(), Some("Block.info.nbt"));

    let no_world = h
        .service
        .set_block(Block {
            world: Some("the_end".into()),
            pos,
            info: Some(BlockInfo::of("stone")),
        })
        .await
        .unwrap();
    assert_eq!(no_world.code(), StatusCode::WorldNotFound);

    let too_high = h
        .service
        .set_block(Block {
            world: None,
            pos: BlockPos::new(0, MAX_HEIGHT + 1, 0),
            info: Some(BlockInfo::of("stone")),
        })
        .await
        .unwrap();
    assert_eq!(too_high.code(), StatusCode::InvalidArgument);

    let placed = h
        .service
        .set_block(Block {
            world: None,
            pos,
            info: Some(BlockInfo::of("minecraft:glass")),
        })
        .await
        .unwrap();
    assert!(placed.is_ok());
    assert_eq!(block_at(&h.service, pos).await.as_deref(), Some("GLASS"));
    h.host.shutdown();
}

#[tokio::test]
async fn test_set_blocks_and_cube() {
    let h = start();
    let empty = h
        .service
        .set_blocks(Blocks {
            world: None,
            pos: Vec::new(),
            info: Some(BlockInfo::of("dirt")),
        })
        .await
        .unwrap();
    assert_eq!(empty.code(), StatusCode::MissingArgument);
    assert_eq!(empty.extra(), Some("Blocks.pos"));

    let scattered = vec![BlockPos::new(5, 80, 5), BlockPos::new(-5, 81, 9)];
    let status = h
        .service
        .set_blocks(Blocks {
            world: None,
            pos: scattered.clone(),
            info: Some(BlockInfo::of("dirt")),
        })
        .await
        .unwrap();
    assert!(status.is_ok());
    for pos in scattered {
        assert_eq!(block_at(&h.service, pos).await.as_deref(), Some("DIRT"));
    }

    let three_corners = h
        .service
        .set_block_cube(Blocks {
            world: None,
            pos: vec![BlockPos::default(); 3],
            info: Some(BlockInfo::of("sand")),
        })
        .await
        .unwrap();
    assert_eq!(three_corners.code(), StatusCode::InvalidArgument);
    assert_eq!(three_corners.extra(), Some("Blocks.pos"));

    let cube = h
        .service
        .set_block_cube(Blocks {
            world: None,
            pos: vec![BlockPos::new(22, 100, 22), BlockPos::new(20, 102, 20)],
            info: Some(BlockInfo::of("sand")),
        })
        .await
        .unwrap();
    assert!(cube.is_ok());
    let filled = h
        .service
        .bridge()
        .call(|w: &mut SandboxWorld| {
            let mut count = 0;
            for x in 19..=23 {
                for y in 99..=103 {
                    for z in 19..=23 {
                        if w.block_at("world", BlockPos::new(x, y, z)).as_deref() == Some("SAND") {
                            count += 1;
                        }
                    }
                }
            }
            count
        })
        .await
        .unwrap();
    assert_eq!(filled, 27);
    h.host.shutdown();
}

// =============================================================================
// Players and entities
// =============================================================================

#[tokio::test]
async fn test_get_players() {
    let h = start_with(with_players(&["alex", "steve"]));
    let all = h
        .service
        .get_players(PlayerRequest {
            names: Vec::new(),
            with_locations: false,
        })
        .await
        .unwrap();
    assert_eq!(all.players.len(), 2);
    assert!(all.players.iter().all(|p| p.location.is_none()));

    let located = h
        .service
        .get_players(PlayerRequest {
            names: vec!["steve".into()],
            with_locations: true,
        })
        .await
        .unwrap();
    let location = located.players[0].location.clone().unwrap();
    assert_eq!(location.world.as_deref(), Some("world"));

    let missing = h
        .service
        .get_players(PlayerRequest {
            names: vec!["alex".into(), "notch".into(), "jeb".into()],
            with_locations: false,
        })
        .await
        .unwrap();
    assert_eq!(missing.status.code(), StatusCode::PlayerNotFound);
    assert_eq!(missing.status.extra(), Some("notch"));
    h.host.shutdown();
}

#[tokio::test]
async fn test_set_player_keeps_unset_parts() {
    let h = start_with(with_players(&["alex"]));
    let no_location = h.service.set_player(Player { name: "alex".into(), location: None }).await.unwrap();
    assert_eq!(no_location.code(), StatusCode::MissingArgument);
    assert_eq!(no_location.extra(), Some("Player.location"));

    let status = h
        .service
        .set_player(Player {
            name: "alex".into(),
            location: Some(EntityLocation {
                world: Some("world_nether".into()),
                pos: None,
                orientation: Some(Orientation { yaw: 180.0, pitch: 0.0 }),
            }),
        })
        .await
        .unwrap();
    assert!(status.is_ok());

    let offline = h
        .service
        .set_player(Player {
            name: "steve".into(),
            location: Some(EntityLocation::default()),
        })
        .await
        .unwrap();
    assert_eq!(offline.code(), StatusCode::PlayerNotFound);

    let no_world = h
        .service
        .set_player(Player {
            name: "alex".into(),
            location: Some(EntityLocation {
                world: Some("the_end".into()),
                ..EntityLocation::default()
            }),
        })
        .await
        .unwrap();
    assert_eq!(no_world.code(), StatusCode::WorldNotFound);

    let world = h.host.shutdown().unwrap();
    let alex = world.player("alex").unwrap();
    assert_eq!(alex.location.world, "world_nether");
    assert!((alex.location.x - 0.5).abs() < f64::EPSILON);
    assert!((alex.location.y - f64::from(GROUND_LEVEL + 1)).abs() < f64::EPSILON);
    assert!((alex.location.yaw - 180.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_spawn_entity_validation() {
    let h = start();
    let cases = [
        (
            Entity {
                id: "3f1c".into(),
                ..zombie_at(0.0, 65.0, 0.0)
            },
            StatusCode::InvalidArgument,
            "Entity.id",
        ),
        (
            Entity {
                kind: String::new(),
                ..zombie_at(0.0, 65.0, 0.0)
            },
            StatusCode::MissingArgument,
            "Entity.type",
        ),
        (
            Entity {
                location: None,
                ..zombie_at(0.0, 65.0, 0.0)
            },
            StatusCode::MissingArgument,
            "Entity.location",
        ),
        (
            Entity {
                location: Some(EntityLocation::default()),
                ..zombie_at(0.0, 65.0, 0.0)
            },
            StatusCode::MissingArgument,
            "Entity.location.pos",
        ),
        (
            Entity {
                kind: "dragon".into(),
                ..zombie_at(0.0, 65.0, 0.0)
            },
            StatusCode::EntityTypeNotFound,
            "dragon",
        ),
        (
            Entity {
                kind: "player".into(),
                ..zombie_at(0.0, 65.0, 0.0)
            },
            StatusCode::EntityNotSpawnable,
            "player",
        ),
    ];
    let before = h.service.bridge().stats().submitted;
    for (entity, code, extra) in cases {
        let response = h.service.spawn_entity(entity).await.unwrap();
        assert_eq!(response.status.code(), code, "{extra}");
        assert_eq!(response.status.extra(), Some(extra));
        assert!(response.entity.is_none());
    }
    assert_eq!(h.service.bridge().stats().submitted, before);
    h.host.shutdown();
}

#[tokio::test]
async fn test_spawn_move_and_query_entities() {
    let h = start();
    let spawned = h.service.spawn_entity(zombie_at(3.5, 65.0, 3.5)).await.unwrap();
    assert!(spawned.status.is_ok());
    let zombie = spawned.entity.unwrap();
    assert_eq!(zombie.kind, "zombie");
    assert!(zombie.location.is_none());

    let pig = Entity {
        kind: "PIG".into(),
        ..zombie_at(8.0, 65.0, 8.0)
    };
    assert!(h.service.spawn_entity(pig).await.unwrap().status.is_ok());

    let moved = h
        .service
        .set_entity(Entity {
            id: zombie.id.clone(),
            kind: String::new(),
            location: Some(EntityLocation {
                world: None,
                pos: Some(Vec3f::new(-10.0, 70.0, 4.0)),
                orientation: None,
            }),
        })
        .await
        .unwrap();
    assert!(moved.is_ok());

    let specific = h
        .service
        .get_entities(EntityRequest {
            selector: Some(EntitySelector::Specific(vec![
                Entity {
                    id: zombie.id.clone(),
                    ..Entity::default()
                },
                Entity {
                    id: "00000000-0000-0000-0000-000000000000".into(),
                    ..Entity::default()
                },
            ])),
            with_locations: true,
        })
        .await
        .unwrap();
    assert_eq!(specific.entities.len(), 1);
    let pos = specific.entities[0].location.as_ref().unwrap().pos.unwrap();
    assert_eq!(pos, Vec3f::new(-10.0, 70.0, 4.0));

    let pigs = h
        .service
        .get_entities(EntityRequest {
            selector: Some(EntitySelector::Worldwide {
                world: Some("world".into()),
                kind: "pig".into(),
                include_not_spawnable: false,
            }),
            with_locations: false,
        })
        .await
        .unwrap();
    assert_eq!(pigs.entities.len(), 1);
    assert_eq!(pigs.entities[0].kind, "pig");
    h.host.shutdown();
}

#[tokio::test]
async fn test_set_entity_validation() {
    let h = start();
    let somewhere = Some(EntityLocation {
        pos: Some(Vec3f::new(0.0, 70.0, 0.0)),
        ..EntityLocation::default()
    });

    let no_id = h.service.set_entity(Entity::default()).await.unwrap();
    assert_eq!(no_id.extra(), Some("Entity.id"));

    let retype = h
        .service
        .set_entity(Entity {
            id: "x".into(),
            kind: "cow".into(),
            location: somewhere.clone(),
        })
        .await
        .unwrap();
    assert_eq!(retype.code(), StatusCode::NotImplemented);
    assert_eq!(retype.extra(), Some("Entity.type"));

    let empty = h
        .service
        .set_entity(Entity {
            id: "x".into(),
            kind: String::new(),
            location: Some(EntityLocation::default()),
        })
        .await
        .unwrap();
    assert_eq!(empty.extra(), Some("Entity.location.[world/pos/orientation]"));

    let garbled = h
        .service
        .set_entity(Entity {
            id: "x".into(),
            kind: String::new(),
            location: somewhere.clone(),
        })
        .await
        .unwrap();
    assert_eq!(garbled.code(), StatusCode::InvalidArgument);
    assert_eq!(garbled.extra(), Some("Entity.id 'x'"));

    let unknown = h
        .service
        .set_entity(Entity {
            id: "00000000-0000-0000-0000-000000000001".into(),
            kind: String::new(),
            location: somewhere,
        })
        .await
        .unwrap();
    assert_eq!(unknown.code(), StatusCode::EntityNotFound);
    h.host.shutdown();
}

#[tokio::test]
async fn test_get_entities_validation() {
    let h = start();
    let none = h.service.get_entities(EntityRequest::default()).await.unwrap();
    assert_eq!(none.status.extra(), Some("Request.[specific/worldwide]"));

    let empty = h
        .service
        .get_entities(EntityRequest {
            selector: Some(EntitySelector::Specific(Vec::new())),
            with_locations: false,
        })
        .await
        .unwrap();
    assert_eq!(empty.status.code(), StatusCode::MissingArgument);

    let garbled = h
        .service
        .get_entities(EntityRequest {
            selector: Some(EntitySelector::Specific(vec![Entity {
                id: "nope".into(),
                ..Entity::default()
            }])),
            with_locations: false,
        })
        .await
        .unwrap();
    assert_eq!(garbled.status.code(), StatusCode::InvalidArgument);

    let bad_kind = h
        .service
        .get_entities(EntityRequest {
            selector: Some(EntitySelector::Worldwide {
                world: None,
                kind: "dragon".into(),
                include_not_spawnable: true,
            }),
            with_locations: false,
        })
        .await
        .unwrap();
    assert_eq!(bad_kind.status.code(), StatusCode::EntityTypeNotFound);
    h.host.shutdown();
}

// =============================================================================
// Streams and shutdown
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chat_stream_through_service() {
    let h = start_with(with_players(&["alex"]));
    let mut stream = h.service.get_event_stream(EventType::ChatMessage);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let listening = h
            .service
            .bridge()
            .call(|w: &mut SandboxWorld| w.listeners().len())
            .await
            .unwrap();
        if listening == 1 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "stream never registered");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    h.service
        .bridge()
        .submit(|w: &mut SandboxWorld| {
            w.chat("alex", "gg");
        })
        .unwrap();

    let record = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        record,
        EventRecord::ChatMessage {
            player: "alex".into(),
            message: "gg".into()
        }
    );
    h.host.shutdown();
}

#[tokio::test]
async fn test_calls_fail_after_shutdown() {
    let h = start();
    h.host.shutdown();
    let err = h.service.get_server_info().await.unwrap_err();
    assert_eq!(err, BridgeError::Unavailable);

    // Rejected before submission, so still answered.
    let status = h
        .service
        .set_block(Block {
            world: None,
            pos: BlockPos::default(),
            info: None,
        })
        .await
        .unwrap();
    assert_eq!(status.code(), StatusCode::MissingArgument);
}
