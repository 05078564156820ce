//! # Command Service
//!
//! The façade remote clients talk to. Every unary operation:
//!
//! 1. Validates required fields (`MISSING_ARGUMENT` / `INVALID_ARGUMENT`)
//! 2. Resolves catalog data on the caller (`*_TYPE_NOT_FOUND`)
//! 3. Submits one work item that resolves live objects (`*_NOT_FOUND`) and
//!    performs the change on the simulation thread
//!
//! Steps 1 and 2 never submit anything. The `Err` side of every result is
//! reserved for bridge failures; all other outcomes are a [`Status`].

mod blocks;
mod entities;

use std::fmt::Debug;
use std::sync::Arc;

use tickgate_core::{BridgeResult, ExecutionBridge, Status, StatusCode, BRIDGE_VERSION};
use tickgate_events::{EventStream, EventStreamBridge, EventType};
use tracing::{info, warn};

use crate::model::{
    ChatPostRequest, CommandRequest, CommandResponse, EntityTypeEntry, EntityTypeResponse,
    MaterialEntry, MaterialResponse, ServerInfoResponse,
};
use crate::traits::{Catalog, Simulation};

/// Extra reported when the default world is requested but none is loaded.
pub const DEFAULT_WORLD: &str = "<default world>";

/// Name of the placeholder entity type excluded from listings.
const UNKNOWN_ENTITY_KIND: &str = "UNKNOWN";

/// Anything that carries a [`Status`].
pub trait Reply {
    /// The outcome.
    fn status(&self) -> &Status;
}

impl Reply for Status {
    fn status(&self) -> &Status {
        self
    }
}

macro_rules! reply_for {
    ($($response:ty),* $(,)?) => {
        $(
            impl Reply for $response {
                fn status(&self) -> &Status {
                    &self.status
                }
            }
        )*
    };
}

reply_for!(
    crate::model::MaterialResponse,
    crate::model::EntityTypeResponse,
    crate::model::CommandResponse,
    crate::model::WorldResponse,
    crate::model::HeightResponse,
    crate::model::BlockResponse,
    crate::model::PlayerResponse,
    crate::model::SpawnedEntityResponse,
    crate::model::EntityResponse,
);

/// Resolves an optional world name to a loaded world.
pub(crate) fn resolve_world<S: Simulation>(sim: &S, requested: Option<&str>) -> Result<String, Status> {
    match requested {
        Some(name) => sim
            .world(name)
            .map(|world| world.name)
            .ok_or_else(|| Status::with_extra(StatusCode::WorldNotFound, name)),
        None => sim
            .worlds()
            .into_iter()
            .next()
            .map(|world| world.name)
            .ok_or_else(|| Status::with_extra(StatusCode::WorldNotFound, DEFAULT_WORLD)),
    }
}

/// Remote control surface over a simulation.
pub struct CommandService<S, C> {
    bridge: ExecutionBridge<S>,
    streams: EventStreamBridge<S>,
    catalog: Arc<C>,
    debug: bool,
}

impl<S, C> Clone for CommandService<S, C> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            streams: self.streams.clone(),
            catalog: Arc::clone(&self.catalog),
            debug: self.debug,
        }
    }
}

impl<S: Simulation, C: Catalog> CommandService<S, C> {
    /// Creates the service. With `debug` every request and its status is logged.
    #[must_use]
    pub fn new(
        bridge: ExecutionBridge<S>,
        streams: EventStreamBridge<S>,
        catalog: Arc<C>,
        debug: bool,
    ) -> Self {
        Self {
            bridge,
            streams,
            catalog,
            debug,
        }
    }

    /// The bridge this service submits to.
    #[must_use]
    pub fn bridge(&self) -> &ExecutionBridge<S> {
        &self.bridge
    }

    /// The catalog used for validation.
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    fn log_request(&self, op: &'static str, request: &dyn Debug) {
        if self.debug {
            info!(op, ?request, "request received");
        }
    }

    fn log_outcome<R: Reply>(&self, op: &'static str, outcome: BridgeResult<R>) -> BridgeResult<R> {
        if self.debug {
            match &outcome {
                Ok(reply) => info!(op, status = %reply.status(), "request handled"),
                Err(err) => warn!(op, error = %err, "request failed"),
            }
        }
        outcome
    }

    /// Simulation and bridge versions.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn get_server_info(&self) -> BridgeResult<ServerInfoResponse> {
        self.log_request("get_server_info", &());
        let sim_version = self.bridge.call(|sim: &mut S| sim.version()).await?;
        if self.debug {
            info!(op = "get_server_info", %sim_version, "request handled");
        }
        Ok(ServerInfoResponse {
            sim_version,
            bridge_version: BRIDGE_VERSION.to_owned(),
        })
    }

    /// Every material, with properties unless `only_keys`.
    #[must_use]
    pub fn get_materials(&self, only_keys: bool) -> MaterialResponse {
        self.log_request("get_materials", &only_keys);
        let materials = self
            .catalog
            .materials()
            .into_iter()
            .map(|material| MaterialEntry {
                key: material.key,
                flags: (!only_keys).then_some(material.flags),
            })
            .collect();
        let response = MaterialResponse {
            status: Status::ok(),
            materials,
        };
        if self.debug {
            info!(op = "get_materials", count = response.materials.len(), "request handled");
        }
        response
    }

    /// Every entity type except the placeholder, with the spawnable flag
    /// unless `only_keys`.
    #[must_use]
    pub fn get_entity_types(&self, only_keys: bool) -> EntityTypeResponse {
        self.log_request("get_entity_types", &only_keys);
        let types = self
            .catalog
            .entity_kinds()
            .into_iter()
            .filter(|kind| !kind.name.eq_ignore_ascii_case(UNKNOWN_ENTITY_KIND))
            .map(|kind| EntityTypeEntry {
                key: kind.key,
                is_spawnable: (!only_keys).then_some(kind.spawnable),
            })
            .collect();
        let response = EntityTypeResponse {
            status: Status::ok(),
            types,
        };
        if self.debug {
            info!(op = "get_entity_types", count = response.types.len(), "request handled");
        }
        response
    }

    /// Runs a console command.
    ///
    /// `output` captures the command's text and reports the dispatch result
    /// as the status extra; `blocking` waits for the command; otherwise the
    /// command is only queued.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn run_command(&self, request: CommandRequest) -> BridgeResult<CommandResponse> {
        self.log_request("run_command", &request);
        let outcome = self.dispatch_command(request).await;
        self.log_outcome("run_command", outcome)
    }

    async fn dispatch_command(&self, request: CommandRequest) -> BridgeResult<CommandResponse> {
        let command = request.command.trim().trim_start_matches('/').to_owned();
        if command.is_empty() {
            return Ok(Status::missing("CommandRequest.command").into());
        }

        if request.output {
            let (result, output) = self
                .bridge
                .call_with_output(move |sim: &mut S, capture| sim.dispatch_command(&command, Some(capture)))
                .await?;
            let status = match result {
                Ok(handled) => Status::ok_with(handled.to_string()),
                Err(err) => Status::from(err),
            };
            return Ok(CommandResponse {
                status,
                output: Some(output),
            });
        }

        if request.blocking {
            let result = self
                .bridge
                .call(move |sim: &mut S| sim.dispatch_command(&command, None))
                .await?;
            let status = result.map_or_else(Status::from, |_| Status::ok());
            return Ok(status.into());
        }

        self.bridge.submit(move |sim: &mut S| {
            if let Err(err) = sim.dispatch_command(&command, None) {
                warn!(%command, error = %err, "queued command failed");
            }
        })?;
        Ok(Status::ok().into())
    }

    /// Writes to chat: to one player, or to everyone with the recipient
    /// count as the status extra.
    ///
    /// # Errors
    ///
    /// Bridge failures only.
    pub async fn post_to_chat(&self, request: ChatPostRequest) -> BridgeResult<Status> {
        self.log_request("post_to_chat", &request);
        let ChatPostRequest { message, player } = request;

        let outcome = match player {
            Some(name) => {
                self.bridge
                    .call(move |sim: &mut S| {
                        if sim.send_message(&name, &message) {
                            Status::ok()
                        } else {
                            Status::with_extra(StatusCode::PlayerNotFound, name)
                        }
                    })
                    .await
            }
            None => {
                self.bridge
                    .call(move |sim: &mut S| Status::ok_with(sim.broadcast(&message).to_string()))
                    .await
            }
        };
        self.log_outcome("post_to_chat", outcome)
    }

    /// Opens an event stream; see [`EventStreamBridge::open_stream`].
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn get_event_stream(&self, event_type: EventType) -> EventStream {
        self.log_request("get_event_stream", &event_type);
        let stream = self.streams.open_stream(event_type);
        if self.debug {
            info!(op = "get_event_stream", tag = stream.tag(), "stream opened");
        }
        stream
    }
}
