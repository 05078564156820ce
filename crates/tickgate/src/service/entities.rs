//! Player and entity operations.

use tickgate_core::{BridgeResult, Status, StatusCode};
use uuid::Uuid;

use super::{resolve_world, CommandService};
use crate::model::{
    Entity, EntityLocation, EntityRequest, EntityResponse, EntitySelector, Orientation, Player,
    PlayerRequest, PlayerResponse, SpawnedEntityResponse, Vec3f,
};
use crate::traits::{Catalog, EntityKind, EntityState, Location, PlayerState, Simulation};

#[allow(clippy::cast_possible_truncation)]
fn to_entity_location(location: &Location) -> EntityLocation {
    EntityLocation {
        world: Some(location.world.clone()),
        pos: Some(Vec3f::new(location.x as f32, location.y as f32, location.z as f32)),
        orientation: Some(Orientation {
            yaw: location.yaw,
            pitch: location.pitch,
        }),
    }
}

/// Applies the set parts of `requested` on top of `current`.
fn merge_location(current: &Location, requested: &EntityLocation, world: String) -> Location {
    let mut merged = Location {
        world,
        ..current.clone()
    };
    if let Some(pos) = requested.pos {
        merged.x = f64::from(pos.x);
        merged.y = f64::from(pos.y);
        merged.z = f64::from(pos.z);
    }
    if let Some(orientation) = requested.orientation {
        merged.yaw = orientation.yaw;
        merged.pitch = orientation.pitch;
    }
    merged
}

fn to_player(state: &PlayerState, with_location: bool) -> Player {
    Player {
        name: state.name.clone(),
        location: with_location.then(|| to_entity_location(&state.location)),
    }
}

fn to_entity(state: &EntityState, with_location: bool) -> Entity {
    Entity {
        id: state.id.to_string(),
        kind: state.kind.name.to_lowercase(),
        location: with_location.then(|| to_entity_location(&state.location)),
    }
}

/// Resolves the target world of a move: the requested one, or where the
/// mover already is.
fn target_world<S: Simulation>(sim: &S, requested: &EntityLocation, current: &Location) -> Result<String, Status> {
    match requested.world.as_deref() {
        Some(name) => resolve_world(sim, Some(name)),
        None => Ok(current.world.clone()),
    }
}

fn parse_id(id: &str, field: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(id).map_err(|_| Status::invalid(format!("{field} '{id}'")))
}

impl<S: Simulation, C: Catalog> CommandService<S, C> {
    /// Online players: all of them (no names) or the named ones.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn get_players(&self, request: PlayerRequest) -> BridgeResult<PlayerResponse> {
        self.log_request("get_players", &request);
        let PlayerRequest { names, with_locations } = request;
        let outcome = self
            .bridge
            .call(move |sim: &mut S| {
                if names.is_empty() {
                    let players = sim
                        .online_players()
                        .iter()
                        .map(|state| to_player(state, with_locations))
                        .collect();
                    return PlayerResponse {
                        status: Status::ok(),
                        players,
                    };
                }

                let mut players = Vec::with_capacity(names.len());
                for name in names {
                    match sim.player(&name) {
                        Some(state) => players.push(to_player(&state, with_locations)),
                        None => return Status::with_extra(StatusCode::PlayerNotFound, name).into(),
                    }
                }
                PlayerResponse {
                    status: Status::ok(),
                    players,
                }
            })
            .await;
        self.log_outcome("get_players", outcome)
    }

    /// Moves a player. Unset parts of the location keep their current value.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn set_player(&self, request: Player) -> BridgeResult<Status> {
        self.log_request("set_player", &request);
        let Player { name, location } = request;
        let outcome = match location {
            _ if name.is_empty() => Ok(Status::missing("Player.name")),
            None => Ok(Status::missing("Player.location")),
            Some(requested) => {
                self.bridge
                    .call(move |sim: &mut S| {
                        let Some(player) = sim.player(&name) else {
                            return Status::with_extra(StatusCode::PlayerNotFound, name);
                        };
                        let world = match target_world(sim, &requested, &player.location) {
                            Ok(world) => world,
                            Err(status) => return status,
                        };
                        let to = merge_location(&player.location, &requested, world);
                        sim.teleport_player(&name, to)
                            .map_or_else(Status::from, |()| Status::ok())
                    })
                    .await
            }
        };
        self.log_outcome("set_player", outcome)
    }

    /// Checks a spawn request and resolves its type on the caller.
    fn spawnable_kind(&self, entity: &Entity) -> Result<(EntityKind, EntityLocation, Vec3f), Status> {
        if !entity.id.is_empty() {
            return Err(Status::invalid("Entity.id"));
        }
        if entity.kind.is_empty() {
            return Err(Status::missing("Entity.type"));
        }
        let location = entity
            .location
            .clone()
            .ok_or_else(|| Status::missing("Entity.location"))?;
        let pos = location.pos.ok_or_else(|| Status::missing("Entity.location.pos"))?;
        let kind = self
            .catalog
            .entity_kind(&entity.kind)
            .ok_or_else(|| Status::with_extra(StatusCode::EntityTypeNotFound, entity.kind.clone()))?;
        if !kind.spawnable {
            return Err(Status::with_extra(StatusCode::EntityNotSpawnable, entity.kind.clone()));
        }
        Ok((kind, location, pos))
    }

    /// Spawns an entity and reports its id and type.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn spawn_entity(&self, request: Entity) -> BridgeResult<SpawnedEntityResponse> {
        self.log_request("spawn_entity", &request);
        let outcome = match self.spawnable_kind(&request) {
            Err(status) => Ok(status.into()),
            Ok((kind, location, pos)) => {
                self.bridge
                    .call(move |sim: &mut S| {
                        let world = match resolve_world(sim, location.world.as_deref()) {
                            Ok(world) => world,
                            Err(status) => return status.into(),
                        };
                        let orientation = location.orientation.unwrap_or_default();
                        let at = Location {
                            world,
                            x: f64::from(pos.x),
                            y: f64::from(pos.y),
                            z: f64::from(pos.z),
                            yaw: orientation.yaw,
                            pitch: orientation.pitch,
                        };
                        match sim.spawn_entity(at, &kind) {
                            Ok(spawned) => SpawnedEntityResponse {
                                status: Status::ok(),
                                entity: Some(to_entity(&spawned, false)),
                            },
                            Err(err) => Status::from(err).into(),
                        }
                    })
                    .await
            }
        };
        self.log_outcome("spawn_entity", outcome)
    }

    /// Moves an entity. Changing the type is not supported.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn set_entity(&self, request: Entity) -> BridgeResult<Status> {
        self.log_request("set_entity", &request);
        let outcome = match Self::movable_entity(request) {
            Err(status) => Ok(status),
            Ok((id, requested)) => {
                self.bridge
                    .call(move |sim: &mut S| {
                        let Some(entity) = sim.entity(id) else {
                            return Status::with_extra(StatusCode::EntityNotFound, id.to_string());
                        };
                        let world = match target_world(sim, &requested, &entity.location) {
                            Ok(world) => world,
                            Err(status) => return status,
                        };
                        let to = merge_location(&entity.location, &requested, world);
                        sim.teleport_entity(id, to)
                            .map_or_else(Status::from, |()| Status::ok())
                    })
                    .await
            }
        };
        self.log_outcome("set_entity", outcome)
    }

    fn movable_entity(request: Entity) -> Result<(Uuid, EntityLocation), Status> {
        if request.id.is_empty() {
            return Err(Status::missing("Entity.id"));
        }
        if !request.kind.is_empty() {
            return Err(Status::not_implemented("Entity.type"));
        }
        let location = request.location.ok_or_else(|| Status::missing("Entity.location"))?;
        if location.is_empty() {
            return Err(Status::missing("Entity.location.[world/pos/orientation]"));
        }
        let id = parse_id(&request.id, "Entity.id")?;
        Ok((id, location))
    }

    /// Entities by id, or every entity of a world.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn get_entities(&self, request: EntityRequest) -> BridgeResult<EntityResponse> {
        self.log_request("get_entities", &request);
        let with_locations = request.with_locations;
        let outcome = match request.selector {
            None => Ok(Status::missing("Request.[specific/worldwide]").into()),
            Some(EntitySelector::Specific(entities)) => match Self::entity_ids(&entities) {
                Err(status) => Ok(status.into()),
                Ok(ids) => {
                    self.bridge
                        .call(move |sim: &mut S| EntityResponse {
                            status: Status::ok(),
                            entities: ids
                                .into_iter()
                                .filter_map(|id| sim.entity(id))
                                .map(|state| to_entity(&state, with_locations))
                                .collect(),
                        })
                        .await
                }
            },
            Some(EntitySelector::Worldwide {
                world,
                kind,
                include_not_spawnable,
            }) => {
                let filter = if kind.is_empty() {
                    Ok(None)
                } else {
                    self.catalog
                        .entity_kind(&kind)
                        .map(Some)
                        .ok_or_else(|| Status::with_extra(StatusCode::EntityTypeNotFound, kind))
                };
                match filter {
                    Err(status) => Ok(status.into()),
                    Ok(filter) => {
                        self.bridge
                            .call(move |sim: &mut S| {
                                let world = match resolve_world(sim, world.as_deref()) {
                                    Ok(world) => world,
                                    Err(status) => return status.into(),
                                };
                                let entities = sim
                                    .entities_in(&world)
                                    .iter()
                                    .filter(|state| filter.as_ref().map_or(true, |kind| state.kind == *kind))
                                    .filter(|state| include_not_spawnable || state.kind.spawnable)
                                    .map(|state| to_entity(state, with_locations))
                                    .collect();
                                EntityResponse {
                                    status: Status::ok(),
                                    entities,
                                }
                            })
                            .await
                    }
                }
            }
        };
        self.log_outcome("get_entities", outcome)
    }

    fn entity_ids(entities: &[Entity]) -> Result<Vec<Uuid>, Status> {
        if entities.is_empty() {
            return Err(Status::missing("Request.specific.entities"));
        }
        entities
            .iter()
            .map(|entity| parse_id(&entity.id, "Request.specific.entities.id"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_point() -> Location {
        Location {
            world: "overworld".into(),
            x: 1.0,
            y: 64.0,
            z: -3.0,
            yaw: 90.0,
            pitch: 10.0,
        }
    }

    #[test]
    fn test_merge_keeps_unset_parts() {
        let requested = EntityLocation {
            world: None,
            pos: None,
            orientation: Some(Orientation { yaw: 0.0, pitch: -45.0 }),
        };
        let merged = merge_location(&spawn_point(), &requested, "overworld".into());
        assert!((merged.x - 1.0).abs() < f64::EPSILON);
        assert!((merged.y - 64.0).abs() < f64::EPSILON);
        assert!((merged.pitch + 45.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_merge_moves_between_worlds() {
        let requested = EntityLocation {
            world: Some("nether".into()),
            pos: Some(Vec3f::new(8.0, 32.0, 8.0)),
            orientation: None,
        };
        let merged = merge_location(&spawn_point(), &requested, "nether".into());
        assert_eq!(merged.world, "nether");
        assert!((merged.z - 8.0).abs() < f64::EPSILON);
        assert!((merged.yaw - 90.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_id_reports_the_text() {
        let status = parse_id("not-a-uuid", "Entity.id").unwrap_err();
        assert_eq!(status.code(), StatusCode::InvalidArgument);
        assert_eq!(status.extra(), Some("Entity.id 'not-a-uuid'"));
    }
}
