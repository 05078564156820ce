//! Live sandbox state. Lives on the simulation thread.

use std::collections::HashMap;

use tickgate_core::{OutputCapture, SimError, SimResult, Simulated};
use tickgate_events::{
    BlockPos, Hand, HasListeners, HitBlock, InteractAction, Interaction, ListenerRegistry,
    ProjectileImpact, RawEvent, Shooter,
};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::traits::{EntityKind, EntityState, Location, Material, PlayerState, Simulation, WorldSummary};

/// Top of the generated terrain.
pub const GROUND_LEVEL: i32 = 64;
/// Lowest buildable layer.
pub const MIN_HEIGHT: i32 = -64;
/// Highest buildable layer.
pub const MAX_HEIGHT: i32 = 319;

/// Ticks in one in-game day.
const DAY_LENGTH: u64 = 24_000;

struct Level {
    name: String,
    key: String,
    pvp: bool,
    placed: HashMap<BlockPos, String>,
}

impl Level {
    fn new(name: &str, key: &str) -> Self {
        Self {
            name: name.to_owned(),
            key: key.to_owned(),
            pvp: true,
            placed: HashMap::new(),
        }
    }

    fn summary(&self) -> WorldSummary {
        WorldSummary {
            name: self.name.clone(),
            key: self.key.clone(),
            pvp: self.pvp,
        }
    }

    fn block_at(&self, pos: BlockPos) -> Option<&str> {
        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&pos.y) {
            return None;
        }
        let block = match self.placed.get(&pos) {
            Some(placed) => placed.as_str(),
            None if pos.y < GROUND_LEVEL => "STONE",
            None if pos.y == GROUND_LEVEL => "GRASS_BLOCK",
            None => "AIR",
        };
        Some(block)
    }
}

fn spawn_point(world: &str) -> Location {
    Location {
        world: world.to_owned(),
        x: 0.5,
        y: f64::from(GROUND_LEVEL + 1),
        z: 0.5,
        yaw: 0.0,
        pitch: 0.0,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn block_of(location: &Location) -> BlockPos {
    BlockPos::new(
        location.x.floor() as i32,
        location.y.floor() as i32,
        location.z.floor() as i32,
    )
}

/// Flat in-memory worlds with players and entities.
pub struct SandboxWorld {
    levels: Vec<Level>,
    players: Vec<PlayerState>,
    entities: Vec<EntityState>,
    inboxes: HashMap<String, Vec<String>>,
    listeners: ListenerRegistry,
    ticks: u64,
    time_of_day: u64,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    /// An overworld (the default world) and a nether, nobody online.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![
                Level::new("world", "minecraft:overworld"),
                Level::new("world_nether", "minecraft:the_nether"),
            ],
            players: Vec::new(),
            entities: Vec::new(),
            inboxes: HashMap::new(),
            listeners: ListenerRegistry::new(),
            ticks: 0,
            time_of_day: 0,
        }
    }

    /// Ticks simulated so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current in-game time.
    #[must_use]
    pub fn time_of_day(&self) -> u64 {
        self.time_of_day
    }

    /// Messages a player has received.
    #[must_use]
    pub fn inbox(&self, player: &str) -> &[String] {
        self.inboxes.get(player).map_or(&[], Vec::as_slice)
    }

    fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|level| level.name == name)
    }

    fn level_mut(&mut self, name: &str) -> SimResult<&mut Level> {
        self.levels
            .iter_mut()
            .find(|level| level.name == name)
            .ok_or_else(|| SimError::IllegalArgument(format!("no world named {name}")))
    }

    fn check_location(&self, location: &Location) -> SimResult<()> {
        if self.level(&location.world).is_none() {
            return Err(SimError::IllegalArgument(format!("no world named {}", location.world)));
        }
        if !(f64::from(MIN_HEIGHT)..=f64::from(MAX_HEIGHT + 1)).contains(&location.y) {
            return Err(SimError::IllegalArgument(format!("y {} out of range", location.y)));
        }
        Ok(())
    }

    fn dispatch(&self, raw: &RawEvent) -> usize {
        let reached = self.listeners.dispatch(raw, false);
        trace!(?raw, reached, "event dispatched");
        reached
    }

    /// A player joins at the default world's spawn point.
    pub fn join(&mut self, name: &str) {
        if self.players.iter().any(|player| player.name == name) {
            return;
        }
        let world = self.levels[0].name.clone();
        self.players.push(PlayerState {
            name: name.to_owned(),
            location: spawn_point(&world),
        });
        self.dispatch(&RawEvent::PlayerJoin { player: name.to_owned() });
    }

    /// A player leaves. Returns false if they were not online.
    pub fn leave(&mut self, name: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|player| player.name != name);
        if self.players.len() == before {
            return false;
        }
        self.dispatch(&RawEvent::PlayerQuit { player: name.to_owned() });
        true
    }

    /// A player writes in chat. Returns the number of listeners reached.
    pub fn chat(&mut self, name: &str, message: &str) -> usize {
        for player in &self.players {
            self.inboxes
                .entry(player.name.clone())
                .or_default()
                .push(format!("<{name}> {message}"));
        }
        self.dispatch(&RawEvent::Chat {
            player: name.to_owned(),
            message: message.to_owned(),
        })
    }

    /// A player dies and respawns.
    pub fn kill_player(&mut self, name: &str, death_message: &str) -> bool {
        let Some(index) = self.players.iter().position(|player| player.name == name) else {
            return false;
        };
        let world = self.levels[0].name.clone();
        self.players[index].location = spawn_point(&world);
        self.dispatch(&RawEvent::PlayerDeath {
            player: name.to_owned(),
            death_message: death_message.to_owned(),
        });
        true
    }

    /// A player clicks a block with the main hand.
    pub fn click_block(&mut self, name: &str, pos: BlockPos, right_click: bool, item: Option<&str>) {
        let action = if right_click {
            InteractAction::RightClickBlock
        } else {
            InteractAction::LeftClickBlock
        };
        self.dispatch(&RawEvent::Interact(Interaction {
            player: name.to_owned(),
            action,
            hand: Some(Hand::Main),
            clicked_block: Some(pos),
            item: item.map(str::to_owned),
            face: "UP".to_owned(),
        }));
    }

    /// A player's arrow lands on a block.
    pub fn shoot_block(&mut self, name: &str, world: &str, pos: BlockPos) {
        let kind = self
            .level(world)
            .and_then(|level| level.block_at(pos))
            .unwrap_or("AIR")
            .to_owned();
        self.dispatch(&RawEvent::ProjectileHit(ProjectileImpact {
            projectile: "ARROW".to_owned(),
            shooter: Some(Shooter::Player(name.to_owned())),
            hit_entity: None,
            hit_block: Some(HitBlock {
                kind,
                pos,
                face: Some("UP".to_owned()),
            }),
        }));
    }

    fn say(&mut self, message: &str, output: Option<&mut OutputCapture>) {
        let line = format!("[Server] {message}");
        self.broadcast(&line);
        if let Some(output) = output {
            output.push_line(&line);
        }
    }

    fn run_time(&mut self, args: &[&str], output: Option<&mut OutputCapture>) -> SimResult<bool> {
        let line = match args {
            ["query", ..] => format!("The time is {}", self.time_of_day),
            ["set", value] => {
                let time = match *value {
                    "day" => 1_000,
                    "noon" => 6_000,
                    "night" => 13_000,
                    "midnight" => 18_000,
                    other => other
                        .parse::<u64>()
                        .map_err(|_| SimError::IllegalArgument(format!("invalid time: {other}")))?,
                };
                self.time_of_day = time % DAY_LENGTH;
                format!("§aSet the time to §e{}", self.time_of_day)
            }
            _ => return Ok(false),
        };
        if let Some(output) = output {
            output.push_line(&line);
        }
        Ok(true)
    }

    fn run_kill(&mut self, target: &str, output: Option<&mut OutputCapture>) -> bool {
        let line = if self.kill_player(target, &format!("{target} fell out of the world")) {
            format!("Killed {target}")
        } else if let Some(index) = Uuid::parse_str(target)
            .ok()
            .and_then(|id| self.entities.iter().position(|entity| entity.id == id))
        {
            let removed = self.entities.remove(index);
            format!("Killed {}", removed.kind.name.to_lowercase())
        } else {
            "§cNo entity was found".to_owned()
        };
        if let Some(output) = output {
            output.push_line(&line);
        }
        true
    }
}

impl Simulated for SandboxWorld {
    fn tick(&mut self, _tick: u64) {
        self.ticks += 1;
        self.time_of_day = (self.time_of_day + 1) % DAY_LENGTH;
    }
}

impl HasListeners for SandboxWorld {
    fn listeners(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }
}

impl Simulation for SandboxWorld {
    fn version(&self) -> String {
        format!("sandbox {}", env!("CARGO_PKG_VERSION"))
    }

    fn worlds(&self) -> Vec<WorldSummary> {
        self.levels.iter().map(Level::summary).collect()
    }

    fn world(&self, name: &str) -> Option<WorldSummary> {
        self.level(name).map(Level::summary)
    }

    fn set_pvp(&mut self, world: &str, pvp: bool) -> SimResult<()> {
        self.level_mut(world)?.pvp = pvp;
        Ok(())
    }

    fn highest_block(&self, world: &str, x: i32, z: i32) -> Option<(BlockPos, String)> {
        let level = self.level(world)?;
        (MIN_HEIGHT..=MAX_HEIGHT).rev().find_map(|y| {
            let pos = BlockPos::new(x, y, z);
            match level.block_at(pos) {
                Some("AIR") | None => None,
                Some(block) => Some((pos, block.to_owned())),
            }
        })
    }

    fn block_at(&self, world: &str, pos: BlockPos) -> Option<String> {
        self.level(world)?.block_at(pos).map(str::to_owned)
    }

    fn set_block(&mut self, world: &str, pos: BlockPos, material: &Material) -> SimResult<()> {
        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&pos.y) {
            return Err(SimError::IllegalArgument(format!("y {} out of range", pos.y)));
        }
        if !material.flags.is_block {
            return Err(SimError::IllegalArgument(format!("{} is not a block", material.name)));
        }
        self.level_mut(world)?.placed.insert(pos, material.name.clone());
        Ok(())
    }

    fn online_players(&self) -> Vec<PlayerState> {
        self.players.clone()
    }

    fn player(&self, name: &str) -> Option<PlayerState> {
        self.players.iter().find(|player| player.name == name).cloned()
    }

    fn teleport_player(&mut self, name: &str, to: Location) -> SimResult<()> {
        self.check_location(&to)?;
        let player = self
            .players
            .iter_mut()
            .find(|player| player.name == name)
            .ok_or_else(|| SimError::IllegalState(format!("{name} is offline")))?;
        debug!(player = name, to = %block_of(&to), world = %to.world, "player teleported");
        player.location = to;
        Ok(())
    }

    fn send_message(&mut self, player: &str, message: &str) -> bool {
        if self.player(player).is_none() {
            return false;
        }
        self.inboxes.entry(player.to_owned()).or_default().push(message.to_owned());
        true
    }

    fn broadcast(&mut self, message: &str) -> usize {
        for player in &self.players {
            self.inboxes
                .entry(player.name.clone())
                .or_default()
                .push(message.to_owned());
        }
        self.players.len()
    }

    fn spawn_entity(&mut self, at: Location, kind: &EntityKind) -> SimResult<EntityState> {
        self.check_location(&at)?;
        if !kind.spawnable {
            return Err(SimError::IllegalArgument(format!("{} cannot be spawned", kind.name)));
        }
        let entity = EntityState {
            id: Uuid::new_v4(),
            kind: kind.clone(),
            location: at,
        };
        debug!(id = %entity.id, kind = %kind.name, at = %block_of(&entity.location), "entity spawned");
        self.entities.push(entity.clone());
        Ok(entity)
    }

    fn entity(&self, id: Uuid) -> Option<EntityState> {
        self.entities.iter().find(|entity| entity.id == id).cloned()
    }

    fn entities_in(&self, world: &str) -> Vec<EntityState> {
        self.entities
            .iter()
            .filter(|entity| entity.location.world == world)
            .cloned()
            .collect()
    }

    fn teleport_entity(&mut self, id: Uuid, to: Location) -> SimResult<()> {
        self.check_location(&to)?;
        let entity = self
            .entities
            .iter_mut()
            .find(|entity| entity.id == id)
            .ok_or_else(|| SimError::IllegalState(format!("entity {id} is gone")))?;
        entity.location = to;
        Ok(())
    }

    fn dispatch_command(&mut self, command: &str, mut output: Option<&mut OutputCapture>) -> SimResult<bool> {
        let words: Vec<&str> = command.split_whitespace().collect();
        debug!(command, "console command");
        match words.as_slice() {
            ["say", message @ ..] if !message.is_empty() => {
                self.say(&message.join(" "), output);
                Ok(true)
            }
            ["time", args @ ..] => self.run_time(args, output),
            ["kill", target] => Ok(self.run_kill(target, output)),
            ["list"] => {
                let names: Vec<&str> = self.players.iter().map(|player| player.name.as_str()).collect();
                if let Some(output) = output.as_deref_mut() {
                    output.push_line(&format!(
                        "There are {} players online: {}",
                        names.len(),
                        names.join(", ")
                    ));
                }
                Ok(true)
            }
            _ => {
                if let Some(output) = output {
                    output.push_line("§cUnknown command. Type \"/help\" for help.");
                }
                Ok(false)
            }
        }
    }
}
