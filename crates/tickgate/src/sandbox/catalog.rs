//! Static game data.

use crate::model::MaterialFlags;
use crate::traits::{Catalog, EntityKind, Material};

const NAMESPACE: &str = "minecraft:";

const AIR: u16 = 1 << 0;
const BLOCK: u16 = 1 << 1;
const BURNABLE: u16 = 1 << 2;
const EDIBLE: u16 = 1 << 3;
const FLAMMABLE: u16 = 1 << 4;
const FUEL: u16 = 1 << 5;
const INTERACTABLE: u16 = 1 << 6;
const ITEM: u16 = 1 << 7;
const OCCLUDING: u16 = 1 << 8;
const SOLID: u16 = 1 << 9;
const GRAVITY: u16 = 1 << 10;

const MATERIALS: &[(&str, u16)] = &[
    ("AIR", AIR | BLOCK),
    ("STONE", BLOCK | ITEM | OCCLUDING | SOLID),
    ("DIRT", BLOCK | ITEM | OCCLUDING | SOLID),
    ("GRASS_BLOCK", BLOCK | ITEM | OCCLUDING | SOLID),
    ("SAND", BLOCK | ITEM | OCCLUDING | SOLID | GRAVITY),
    ("GRAVEL", BLOCK | ITEM | OCCLUDING | SOLID | GRAVITY),
    ("OAK_PLANKS", BLOCK | ITEM | OCCLUDING | SOLID | BURNABLE | FLAMMABLE | FUEL),
    ("OAK_LOG", BLOCK | ITEM | OCCLUDING | SOLID | BURNABLE | FLAMMABLE | FUEL),
    ("GLASS", BLOCK | ITEM | SOLID),
    ("TNT", BLOCK | ITEM | OCCLUDING | SOLID | FLAMMABLE | INTERACTABLE),
    ("CHEST", BLOCK | ITEM | SOLID | FUEL | INTERACTABLE),
    ("GOLD_BLOCK", BLOCK | ITEM | OCCLUDING | SOLID),
    ("APPLE", ITEM | EDIBLE),
    ("BOW", ITEM | FUEL),
    ("ARROW", ITEM),
    ("DIAMOND_SWORD", ITEM),
];

/// (name, spawnable)
const ENTITY_KINDS: &[(&str, bool)] = &[
    ("ZOMBIE", true),
    ("SKELETON", true),
    ("CREEPER", true),
    ("PIG", true),
    ("COW", true),
    ("ARROW", true),
    ("ITEM", true),
    ("PLAYER", false),
    ("LIGHTNING_BOLT", false),
    ("UNKNOWN", false),
];

const fn flags(bits: u16) -> MaterialFlags {
    MaterialFlags {
        is_air: bits & AIR != 0,
        is_block: bits & BLOCK != 0,
        is_burnable: bits & BURNABLE != 0,
        is_edible: bits & EDIBLE != 0,
        is_flammable: bits & FLAMMABLE != 0,
        is_fuel: bits & FUEL != 0,
        is_interactable: bits & INTERACTABLE != 0,
        is_item: bits & ITEM != 0,
        is_occluding: bits & OCCLUDING != 0,
        is_solid: bits & SOLID != 0,
        has_gravity: bits & GRAVITY != 0,
    }
}

fn key_of(name: &str) -> String {
    format!("{NAMESPACE}{}", name.to_lowercase())
}

/// Accepts `stone`, `STONE` and `minecraft:stone`.
fn matches(name: &str, query: &str) -> bool {
    let query = query.trim();
    let bare = match query.get(..NAMESPACE.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(NAMESPACE) => &query[NAMESPACE.len()..],
        _ => query,
    };
    name.eq_ignore_ascii_case(bare)
}

fn material(name: &str, bits: u16) -> Material {
    Material {
        name: name.to_owned(),
        key: key_of(name),
        flags: flags(bits),
    }
}

fn entity_kind(name: &str, spawnable: bool) -> EntityKind {
    EntityKind {
        name: name.to_owned(),
        key: key_of(name),
        spawnable,
    }
}

/// Fixed material and entity type tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct SandboxCatalog;

impl SandboxCatalog {
    /// Creates the catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Catalog for SandboxCatalog {
    fn material(&self, name: &str) -> Option<Material> {
        MATERIALS
            .iter()
            .find(|(known, _)| matches(known, name))
            .map(|&(known, bits)| material(known, bits))
    }

    fn materials(&self) -> Vec<Material> {
        MATERIALS.iter().map(|&(name, bits)| material(name, bits)).collect()
    }

    fn entity_kind(&self, name: &str) -> Option<EntityKind> {
        ENTITY_KINDS
            .iter()
            .find(|(known, _)| matches(known, name))
            .map(|&(known, spawnable)| entity_kind(known, spawnable))
    }

    fn entity_kinds(&self) -> Vec<EntityKind> {
        ENTITY_KINDS
            .iter()
            .map(|&(name, spawnable)| entity_kind(name, spawnable))
            .collect()
    }
}
