//! Shared fixtures for unit tests.

use crate::api::game::{Game, GameConfig, WorldContext};
use crate::assets::manifest::{DataError, LevelData};
use crate::assets::registry::DefinitionRegistry;

pub const KEY_RIGHT: u32 = 39;
pub const KEY_FIRE: u32 = 88;
pub const KEY_SLASH: u32 = 90;

pub const DEFINITIONS: &str = r#"{
    "tiles": [ {}, { "shape": "solid" }, { "shape": "ramp45" } ],
    "objects": {
        "Hero": {
            "size": [60, 120],
            "kind": "Player",
            "allegiance": "Hero",
            "health": 5,
            "death": "persist",
            "fire_limit": 2,
            "ground_snap": true,
            "hitboxes": {
                "slash": { "offset": [60, 30], "size": [50, 40], "mode": "damage", "amount": 1, "lifespan": 5 }
            },
            "controls": [
                { "key": 37, "command": { "primitive": "walk", "arg": -15 } },
                { "key": 39, "command": { "primitive": "walk", "arg": 15 } },
                { "key": 32, "command": { "primitive": "jump", "arg": 125 }, "trigger": "pressed" },
                { "key": 88, "command": { "primitive": "fire", "arg": "Bolt" }, "trigger": "pressed" },
                { "key": 90, "command": { "primitive": "spawn_hitbox", "arg": "slash" }, "trigger": "pressed" }
            ]
        },
        "Walker": {
            "size": [60, 120],
            "kind": "Enemy",
            "allegiance": "Enemy",
            "health": 3,
            "max_speed": 10,
            "behavior": "pace",
            "hitboxes": {
                "body": { "offset": [0, 0], "size": [60, 120], "mode": "damage", "amount": 1, "lifespan": 9999 }
            }
        },
        "Bolt": {
            "size": [20, 20],
            "kind": "Projectile",
            "max_speed": 30,
            "gravity_scale": 0,
            "friction_scale": 0,
            "die_on_wall": true,
            "attach": ["hit"],
            "hitboxes": {
                "hit": { "offset": [0, 0], "size": [20, 20], "mode": "damage", "amount": 1, "lifespan": 9999 }
            }
        },
        "Blob": {
            "size": [40, 40],
            "kind": "Enemy",
            "allegiance": "Enemy",
            "health": 4,
            "split_count": 2
        }
    },
    "behaviors": {
        "pace": [
            { "delay": 0, "command": { "primitive": "walk", "arg": 5 }, "pop": { "when": "timer", "ticks": 30 } },
            { "delay": 30, "command": { "primitive": "face", "arg": -1 } }
        ]
    }
}"#;

/// 10 x 6 tiles of open air over a solid floor row (y = 600..720).
pub const LEVEL: &str = r#"{
    "name": "Meadow",
    "layers": [
        {
            "tiles": [
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [1, 1, 1, 1, 1, 1, 1, 1, 1, 1]
            ],
            "flips": [
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
            ],
            "rotations": [
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
            ],
            "depth": 0
        }
    ],
    "objects": [
        { "object": "Hero", "pos": [200, 100], "focus": true }
    ]
}"#;

/// The fixture level's tiles with no objects placed.
pub fn world() -> WorldContext {
    let mut level = LevelData::from_json(LEVEL).unwrap();
    level.objects.clear();
    let mut world = empty_world();
    world.load_level(&level).unwrap();
    world
}

/// The fixture level with its placed hero.
pub fn world_with_level() -> WorldContext {
    let level = LevelData::from_json(LEVEL).unwrap();
    let mut world = empty_world();
    world.load_level(&level).unwrap();
    world
}

fn empty_world() -> WorldContext {
    let registry = DefinitionRegistry::from_json(DEFINITIONS).unwrap();
    WorldContext::new(GameConfig::default(), registry)
}

/// Two-level game over the fixtures. Counts its update calls.
#[derive(Default)]
pub struct TestGame {
    pub updates: u32,
}

impl Game for TestGame {
    fn definitions(&self) -> Result<DefinitionRegistry, DataError> {
        DefinitionRegistry::from_json(DEFINITIONS)
    }

    fn first_level(&self) -> String {
        "Meadow".to_string()
    }

    fn level(&self, name: &str) -> Result<LevelData, DataError> {
        let mut level = LevelData::from_json(LEVEL)?;
        match name {
            "Meadow" => Ok(level),
            "Castle" => {
                level.name = name.to_string();
                Ok(level)
            }
            _ => Err(DataError::UnknownLevel(name.to_string())),
        }
    }

    fn update(&mut self, _world: &mut WorldContext) {
        self.updates += 1;
    }
}
