use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::types::{Allegiance, EntityId};
use crate::components::entity::{DeathHandler, EntityKind};
use crate::components::hitbox::HitboxMode;
use crate::core::actions::{ArgKind, QueuedAction};
use crate::core::geometry::TileShape;
use crate::core::primitives::Primitive;
use crate::input::queue::KeyBinding;

/// Problems found while loading pre-parsed level or definition data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("layer {layer}: {grid} grid is {found:?} (w, h), expected {expected:?}")]
    GridShape {
        layer: u32,
        grid: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("layer {layer}: {grid} row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        layer: u32,
        grid: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("layer {layer}: flip code {code} is not in 0..=3")]
    BadFlip { layer: u32, code: u8 },
    #[error("layer {layer}: rotation code {code} is not in 0..=3")]
    BadRotation { layer: u32, code: u8 },
    #[error("layer {layer}: tile id {tile_id} is not in the tile table")]
    UnknownTile { layer: u32, tile_id: u16 },
    #[error("no object definition named {0:?}")]
    UnknownObject(String),
    #[error("no behavior named {0:?}")]
    UnknownBehavior(String),
    #[error("no level named {0:?}")]
    UnknownLevel(String),
    #[error("entity {0:?} no longer exists")]
    StaleEntity(EntityId),
    #[error("object {object:?} has no hitbox template {template:?}")]
    UnknownHitbox { object: String, template: String },
    #[error("{owner}: command {index} ({primitive:?}) takes a {expected:?} argument, got {found:?}")]
    BadArgument {
        owner: String,
        index: usize,
        primitive: Primitive,
        expected: ArgKind,
        found: ArgKind,
    },
    #[error("{owner}: {field} must be a non-negative speed, got {value}")]
    NegativeSpeed {
        owner: String,
        field: &'static str,
        value: f32,
    },
}

/// Speed limits feed `f32::clamp`, so they must be non-negative numbers.
pub(crate) fn check_speed(owner: &str, field: &'static str, value: f32) -> Result<(), DataError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(DataError::NegativeSpeed {
            owner: owner.to_string(),
            field,
            value,
        })
    }
}

/// Grid bundle for one layer, as handed over by the level loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerData {
    pub tiles: Vec<Vec<u16>>,
    pub flips: Vec<Vec<u8>>,
    pub rotations: Vec<Vec<u8>>,
    /// Optional; missing palettes default to 0.
    #[serde(default)]
    pub palettes: Vec<Vec<u16>>,
    pub depth: u32,
    #[serde(default = "default_parallax")]
    pub parallax: f32,
    #[serde(default)]
    pub loop_x: bool,
    #[serde(default)]
    pub loop_y: bool,
}

/// An object placed in a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectPlacement {
    /// Name of the object definition.
    pub object: String,
    /// Top-left corner in world units.
    pub pos: Vec2,
    /// Layer id the object collides against.
    #[serde(default)]
    pub layer: u32,
    /// Make this object the camera focus once spawned.
    #[serde(default)]
    pub focus: bool,
}

/// A whole level: layers plus initial objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    pub layers: Vec<LayerData>,
    #[serde(default)]
    pub objects: Vec<ObjectPlacement>,
}

impl LevelData {
    /// Parse a level from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One row of the static tile table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileDef {
    /// Collision shape; None means the tile never collides.
    #[serde(default)]
    pub shape: Option<TileShape>,
    #[serde(default)]
    pub default_palette: u16,
    /// Source rectangle in the tile sheet (x, y, w, h), used only by renderers.
    #[serde(default)]
    pub rect: [u32; 4],
}

/// Template for a hitbox an object can spawn as a child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitboxTemplate {
    /// Offset from the parent's top-left corner (mirrored when facing left).
    pub offset: Vec2,
    pub size: Vec2,
    pub mode: HitboxMode,
    /// Damage, trigger payload, or clone count depending on the mode.
    #[serde(default)]
    pub amount: f32,
    /// Frames until the hitbox removes itself.
    pub lifespan: f32,
}

/// Static description of an object type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDef {
    pub size: Vec2,
    pub kind: EntityKind,
    #[serde(default)]
    pub allegiance: Allegiance,
    #[serde(default = "default_health")]
    pub health: f32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_scale")]
    pub gravity_scale: f32,
    #[serde(default = "default_scale")]
    pub friction_scale: f32,
    /// AI timeline reloaded whenever the queue empties.
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub death: DeathHandler,
    /// Number of clones produced when split.
    #[serde(default = "default_split_count")]
    pub split_count: u32,
    #[serde(default)]
    pub hitboxes: HashMap<String, HitboxTemplate>,
    /// Hitbox templates attached as soon as the object spawns.
    #[serde(default)]
    pub attach: Vec<String>,
    /// Maximum live projectiles this object may own at once.
    #[serde(default)]
    pub fire_limit: Option<usize>,
    #[serde(default)]
    pub ground_snap: bool,
    #[serde(default)]
    pub die_on_wall: bool,
    #[serde(default = "default_palette")]
    pub palette: String,
    #[serde(default)]
    pub controls: Vec<KeyBinding>,
}

/// All static definitions a level can reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definitions {
    /// Indexed by tile id.
    #[serde(default)]
    pub tiles: Vec<TileDef>,
    #[serde(default)]
    pub objects: HashMap<String, ObjectDef>,
    #[serde(default)]
    pub behaviors: HashMap<String, Vec<QueuedAction>>,
}

impl Definitions {
    /// Parse definitions from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn default_parallax() -> f32 {
    1.0
}

fn default_health() -> f32 {
    1.0
}

fn default_max_speed() -> f32 {
    20.0
}

fn default_scale() -> f32 {
    1.0
}

fn default_split_count() -> u32 {
    2
}

fn default_palette() -> String {
    "Default".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::PopCondition;
    use crate::core::primitives::Primitive;

    #[test]
    fn parse_minimal_level() {
        let json = r#"{
            "name": "Test",
            "layers": [
                { "tiles": [[0, 1]], "flips": [[0, 0]], "rotations": [[0, 0]], "depth": 0 }
            ],
            "objects": [
                { "object": "Hero", "pos": [50.0, 50.0], "focus": true }
            ]
        }"#;
        let level = LevelData::from_json(json).unwrap();
        assert_eq!(level.layers.len(), 1);
        assert_eq!(level.layers[0].parallax, 1.0);
        assert!(!level.layers[0].loop_x);
        assert_eq!(level.objects[0].pos, Vec2::new(50.0, 50.0));
        assert!(level.objects[0].focus);
    }

    #[test]
    fn parse_definitions_with_behavior() {
        let json = r#"{
            "tiles": [ {}, { "shape": "solid" }, { "shape": "ramp45" } ],
            "objects": {
                "Walker": {
                    "size": [60, 120],
                    "kind": "Enemy",
                    "allegiance": "Enemy",
                    "behavior": "pace",
                    "hitboxes": {
                        "body": { "offset": [0, 0], "size": [60, 120], "mode": "damage", "amount": 1, "lifespan": 9999 }
                    }
                }
            },
            "behaviors": {
                "pace": [
                    { "delay": 0, "command": { "primitive": "walk", "arg": 5 }, "pop": { "when": "timer", "ticks": 30 } },
                    { "delay": 30, "command": { "primitive": "face", "arg": -1 } }
                ]
            }
        }"#;
        let defs = Definitions::from_json(json).unwrap();
        assert_eq!(defs.tiles.len(), 3);
        assert!(defs.tiles[0].shape.is_none());
        assert_eq!(defs.tiles[2].shape, Some(TileShape::Ramp45));

        let walker = &defs.objects["Walker"];
        assert_eq!(walker.kind, EntityKind::Enemy);
        assert_eq!(walker.health, 1.0);
        assert_eq!(walker.hitboxes["body"].mode, HitboxMode::Damage);

        let pace = &defs.behaviors["pace"];
        assert_eq!(pace[0].command.primitive, Primitive::Walk);
        assert_eq!(pace[0].pop, PopCondition::TimerExpires { remaining: 30.0 });
        assert_eq!(pace[1].pop, PopCondition::None);
    }

    #[test]
    fn unknown_primitive_is_a_load_error() {
        let json = r#"{ "behaviors": { "bad": [ { "delay": 0, "command": { "primitive": "teleport" } } ] } }"#;
        assert!(matches!(Definitions::from_json(json), Err(DataError::Json(_))));
    }
}
