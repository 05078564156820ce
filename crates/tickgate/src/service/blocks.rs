//! World and block operations.

use tickgate_core::{BridgeResult, Status, StatusCode};
use tickgate_events::BlockPos;

use super::{resolve_world, CommandService};
use crate::model::{
    Block, BlockInfo, BlockRequest, BlockResponse, Blocks, HeightRequest, HeightResponse, World,
    WorldInfo, WorldResponse,
};
use crate::traits::{Catalog, Material, Simulation};

/// Which fields of a block request failed validation.
#[derive(Clone, Copy)]
enum Shape {
    Single,
    Many,
}

impl Shape {
    fn field(self, name: &str) -> String {
        match self {
            Self::Single => format!("Block.{name}"),
            Self::Many => format!("Blocks.{name}"),
        }
    }
}

/// Inclusive cuboid spanned by two corners.
fn cuboid(a: BlockPos, b: BlockPos) -> impl Iterator<Item = BlockPos> {
    let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
    let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
    let (min_z, max_z) = (a.z.min(b.z), a.z.max(b.z));
    (min_x..=max_x).flat_map(move |x| {
        (min_y..=max_y).flat_map(move |y| (min_z..=max_z).map(move |z| BlockPos::new(x, y, z)))
    })
}

impl<S: Simulation, C: Catalog> CommandService<S, C> {
    /// Lists every world (empty request) or resolves the named worlds,
    /// applying `pvp` where settings are given.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn access_worlds(&self, worlds: Vec<World>) -> BridgeResult<WorldResponse> {
        self.log_request("access_worlds", &worlds);
        let outcome = self
            .bridge
            .call(move |sim: &mut S| {
                if worlds.is_empty() {
                    let worlds = sim
                        .worlds()
                        .into_iter()
                        .map(|world| World {
                            name: world.name,
                            info: Some(WorldInfo {
                                key: world.key,
                                pvp: world.pvp,
                            }),
                        })
                        .collect();
                    return WorldResponse {
                        status: Status::ok(),
                        worlds,
                    };
                }

                let mut resolved = Vec::with_capacity(worlds.len());
                for requested in worlds {
                    let Some(world) = sim.world(&requested.name) else {
                        return Status::with_extra(StatusCode::WorldNotFound, requested.name).into();
                    };
                    if let Some(info) = requested.info {
                        if let Err(err) = sim.set_pvp(&world.name, info.pvp) {
                            return Status::from(err).into();
                        }
                    }
                    resolved.push(World::named(world.name));
                }
                WorldResponse {
                    status: Status::ok(),
                    worlds: resolved,
                }
            })
            .await;
        self.log_outcome("access_worlds", outcome)
    }

    /// Highest non-air block of a column.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn get_height(&self, request: HeightRequest) -> BridgeResult<HeightResponse> {
        self.log_request("get_height", &request);
        let outcome = self
            .bridge
            .call(move |sim: &mut S| {
                let world = match resolve_world(sim, request.world.as_deref()) {
                    Ok(world) => world,
                    Err(status) => return status.into(),
                };
                match sim.highest_block(&world, request.x, request.z) {
                    Some((pos, material)) => HeightResponse {
                        status: Status::ok(),
                        block: Some(Block {
                            world: Some(world),
                            pos,
                            info: Some(BlockInfo::of(material.to_lowercase())),
                        }),
                    },
                    None => Status::with_extra(StatusCode::FailedPrecondition, "column has no blocks").into(),
                }
            })
            .await;
        self.log_outcome("get_height", outcome)
    }

    /// Type of one block. Block data is not supported: `with_data` answers
    /// `NOT_IMPLEMENTED` but still carries the type.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn get_block(&self, request: BlockRequest) -> BridgeResult<BlockResponse> {
        self.log_request("get_block", &request);
        let outcome = self
            .bridge
            .call(move |sim: &mut S| {
                let world = match resolve_world(sim, request.world.as_deref()) {
                    Ok(world) => world,
                    Err(status) => return status.into(),
                };
                let Some(material) = sim.block_at(&world, request.pos) else {
                    return Status::invalid("Block.pos").into();
                };
                let status = if request.with_data {
                    Status::not_implemented("getBlock(withData=True)")
                } else {
                    Status::ok()
                };
                BlockResponse {
                    status,
                    info: Some(BlockInfo::of(material.to_lowercase())),
                }
            })
            .await;
        self.log_outcome("get_block", outcome)
    }

    /// Validates block info and resolves the material on the caller.
    fn block_material(&self, info: Option<&BlockInfo>, shape: Shape) -> Result<Material, Status> {
        let info = info.ok_or_else(|| Status::missing(shape.field("info")))?;
        let material = self
            .catalog
            .material(&info.block_type)
            .ok_or_else(|| Status::with_extra(StatusCode::BlockTypeNotFound, info.block_type.clone()))?;
        if info.nbt.is_some() {
            return Err(Status::not_implemented(shape.field("info.nbt")));
        }
        Ok(material)
    }

    /// Places one block.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn set_block(&self, request: Block) -> BridgeResult<Status> {
        self.log_request("set_block", &request);
        let outcome = match self.block_material(request.info.as_ref(), Shape::Single) {
            Err(status) => Ok(status),
            Ok(material) => {
                self.place(request.world, vec![request.pos].into_iter(), material)
                    .await
            }
        };
        self.log_outcome("set_block", outcome)
    }

    /// Places the same block at every listed position.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn set_blocks(&self, request: Blocks) -> BridgeResult<Status> {
        self.log_request("set_blocks", &request);
        let outcome = match self.block_material(request.info.as_ref(), Shape::Many) {
            Err(status) => Ok(status),
            Ok(_) if request.pos.is_empty() => Ok(Status::missing("Blocks.pos")),
            Ok(material) => self.place(request.world, request.pos.into_iter(), material).await,
        };
        self.log_outcome("set_blocks", outcome)
    }

    /// Fills the inclusive cuboid between exactly two corners.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn set_block_cube(&self, request: Blocks) -> BridgeResult<Status> {
        self.log_request("set_block_cube", &request);
        let outcome = match self.block_material(request.info.as_ref(), Shape::Many) {
            Err(status) => Ok(status),
            Ok(_) if request.pos.is_empty() => Ok(Status::missing("Blocks.pos")),
            Ok(_) if request.pos.len() != 2 => Ok(Status::invalid("Blocks.pos")),
            Ok(material) => {
                let positions = cuboid(request.pos[0], request.pos[1]);
                self.place(request.world, positions, material).await
            }
        };
        self.log_outcome("set_block_cube", outcome)
    }

    async fn place<I>(&self, world: Option<String>, positions: I, material: Material) -> BridgeResult<Status>
    where
        I: Iterator<Item = BlockPos> + Send + 'static,
    {
        self.bridge
            .call(move |sim: &mut S| {
                let world = match resolve_world(sim, world.as_deref()) {
                    Ok(world) => world,
                    Err(status) => return status,
                };
                for pos in positions {
                    if let Err(err) = sim.set_block(&world, pos, &material) {
                        return Status::from(err);
                    }
                }
                Status::ok()
            })
            .await
    }
}
