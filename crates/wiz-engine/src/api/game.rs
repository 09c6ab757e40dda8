use std::collections::HashMap;

use glam::Vec2;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::api::types::{Allegiance, EntityId, GameEvent};
use crate::assets::manifest::{check_speed, DataError, LevelData};
use crate::assets::registry::DefinitionRegistry;
use crate::components::entity::{Entity, EntityKind};
use crate::components::hitbox::Hitbox;
use crate::core::actions::Value;
use crate::core::camera::Camera;
use crate::core::collision::CollisionWorld;
use crate::core::scene::Scene;
use crate::input::queue::KeyState;
use crate::systems::update;

/// Runtime tuning, provided by the game.
///
/// Speeds and distances are in world units, durations in frames at
/// `fps_target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed simulation rate (default: 60).
    pub fps_target: f32,
    /// Edge length of a tile in world units (default: 120).
    pub tile_size: f32,
    /// Added to vertical speed per frame while airborne (default: 15).
    pub gravity: f32,
    /// Terminal fall speed (default: 150).
    pub max_fall_speed: f32,
    /// Maximum upward speed (default: 300).
    pub max_rise_speed: f32,
    /// Horizontal speed lost per frame (default: 4).
    pub friction: f32,
    /// Largest per-axis distance moved in one collision sub-step (default: 10).
    pub move_tick_amount: f32,
    /// Bound on push-out and ground-snap searches (default: 600).
    pub correction_search_cap: u32,
    /// How many times a split enemy may split again (default: 3).
    pub max_division_iterations: u32,
    /// Invulnerability of the first split clone (default: 30).
    pub split_invulnerability: f32,
    /// Extra invulnerability for each further clone (default: 15).
    pub split_stagger: f32,
    /// Upward speed given to split clones (default: 40).
    pub split_hop: f32,
    /// Length of the hurt stun (default: 20).
    pub stun_duration: f32,
    /// Palette flicker cycles during the hurt stun (default: 3).
    pub damage_flicker_count: u32,
    /// Invulnerability after taking damage (default: 45).
    pub damage_invulnerability: f32,
    /// Camera viewport in world units (default: 16 x 9 tiles).
    pub view_size: Vec2,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fps_target: 60.0,
            tile_size: 120.0,
            gravity: 15.0,
            max_fall_speed: 150.0,
            max_rise_speed: 300.0,
            friction: 4.0,
            move_tick_amount: 10.0,
            correction_search_cap: 600,
            max_division_iterations: 3,
            split_invulnerability: 30.0,
            split_stagger: 15.0,
            split_hop: 40.0,
            stun_duration: 20.0,
            damage_flicker_count: 3,
            damage_invulnerability: 45.0,
            view_size: Vec2::new(1920.0, 1080.0),
        }
    }
}

impl GameConfig {
    /// Parse a config, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject speed limits that would make vertical clamping impossible.
    pub fn validate(&self) -> Result<(), DataError> {
        check_speed("config", "max_fall_speed", self.max_fall_speed)?;
        check_speed("config", "max_rise_speed", self.max_rise_speed)
    }

    /// Fixed timestep in seconds.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.fps_target
    }
}

/// The contract a concrete game fulfills for the runner.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Static definitions shared by every level.
    fn definitions(&self) -> Result<DefinitionRegistry, DataError>;

    /// Name of the level loaded at init.
    fn first_level(&self) -> String;

    /// Fetch a level by name, for init and for level transitions.
    fn level(&self, name: &str) -> Result<LevelData, DataError>;

    /// Called after every fixed tick, for win conditions and scripted events.
    fn update(&mut self, _world: &mut WorldContext) {}
}

/// Everything one running level owns.
///
/// Built once, refilled on every level load and emptied on unload.
/// Passed by reference into every update call.
pub struct WorldContext {
    pub config: GameConfig,
    pub scene: Scene,
    pub collision: CollisionWorld,
    pub camera: Camera,
    pub registry: DefinitionRegistry,
    pub keys: KeyState,
    /// Shared named values, visible to `GlobalStateEquals` pop-conditions.
    pub globals: HashMap<String, Value>,
    /// Events produced since the last drain.
    pub events: Vec<GameEvent>,
    /// Level requested by `TransitionLevel`, loaded between ticks.
    pub pending_level: Option<String>,
    pub level_name: Option<String>,
    /// Fixed ticks run since the level loaded.
    pub frame: u64,
}

impl WorldContext {
    pub fn new(config: GameConfig, registry: DefinitionRegistry) -> Self {
        let collision = CollisionWorld::new(config.tile_size, registry.tile_shapes());
        let camera = Camera::new(config.view_size);
        Self {
            config,
            scene: Scene::new(),
            collision,
            camera,
            registry,
            keys: KeyState::new(),
            globals: HashMap::new(),
            events: Vec::new(),
            pending_level: None,
            level_name: None,
            frame: 0,
        }
    }

    /// Replace the current level.
    ///
    /// Everything is validated before the old level is torn down, so a bad
    /// level leaves the current one running.
    pub fn load_level(&mut self, level: &LevelData) -> Result<(), DataError> {
        let collision = CollisionWorld::from_level(level, self.registry.tiles(), self.config.tile_size)?;
        if let Some(missing) = level
            .objects
            .iter()
            .find(|p| self.registry.object(&p.object).is_none())
        {
            return Err(DataError::UnknownObject(missing.object.clone()));
        }

        self.unload_level();
        self.collision = collision;
        for placement in &level.objects {
            let id = self.spawn_object(&placement.object, placement.pos, placement.layer)?;
            if placement.focus {
                self.camera.set_focus(Some(id));
            }
        }
        self.level_name = Some(level.name.clone());
        info!("loaded level {:?} with {} entities", level.name, self.scene.len());
        Ok(())
    }

    /// Drop every entity and layer. Globals and key state survive.
    pub fn unload_level(&mut self) {
        if let Some(name) = self.level_name.take() {
            info!("unloading level {name:?}");
        }
        self.scene.clear();
        self.collision.clear();
        self.camera = Camera::new(self.config.view_size);
        self.pending_level = None;
        self.frame = 0;
    }

    /// Instantiate a named object, attaching its default hitboxes.
    pub fn spawn_object(&mut self, name: &str, pos: Vec2, layer: u32) -> Result<EntityId, DataError> {
        let def = self
            .registry
            .object(name)
            .ok_or_else(|| DataError::UnknownObject(name.to_string()))?;
        let attach = def.attach.clone();
        let entity = Entity::from_def(name, def).with_pos(pos).with_layer(layer);
        let id = self.scene.spawn(entity);
        debug!("spawned {name} as {id:?}");
        for template in &attach {
            self.attach_hitbox(id, template)?;
        }
        Ok(id)
    }

    /// Spawn a hitbox child from one of the owner's templates.
    ///
    /// The hitbox inherits the owner's layer, allegiance and facing.
    pub fn attach_hitbox(&mut self, owner: EntityId, template: &str) -> Result<EntityId, DataError> {
        let parent = self.scene.get(owner).ok_or(DataError::StaleEntity(owner))?;
        let def = self
            .registry
            .object(&parent.name)
            .and_then(|def| def.hitboxes.get(template))
            .ok_or_else(|| DataError::UnknownHitbox {
                object: parent.name.clone(),
                template: template.to_string(),
            })?;

        let hitbox = Hitbox::from_template(def);
        let pos = hitbox.anchor(parent.pos, parent.size, def.size, parent.direction);
        let mut child = Entity::new(template, EntityKind::Hitbox)
            .with_pos(pos)
            .with_size(def.size)
            .with_layer(parent.layer)
            .with_allegiance(parent.allegiance)
            .with_hitbox(hitbox);
        child.direction = parent.direction;
        child.parent = Some(owner);

        let id = self.scene.spawn(child);
        if let Some(parent) = self.scene.get_mut(owner) {
            parent.children.push(id);
        }
        Ok(id)
    }

    /// Remove an entity and everything it owns.
    ///
    /// Detaches it from its parent and clears any camera reference in the same
    /// call. Emits nothing; deaths are reported by the death handlers. Returns
    /// false if the entity was already gone.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.scene.despawn(id) else {
            return false;
        };
        self.camera.forget(id);
        if let Some(parent) = entity.parent.and_then(|p| self.scene.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
        for child in &entity.children {
            self.despawn(*child);
        }
        if entity.kind != EntityKind::Hitbox {
            debug!("despawned {} {id:?}", entity.name);
        }
        true
    }

    /// Change allegiance for an entity and its hitboxes.
    pub fn set_allegiance(&mut self, id: EntityId, allegiance: Allegiance) {
        let Some(entity) = self.scene.get_mut(id) else {
            return;
        };
        entity.allegiance = allegiance;
        let children = entity.children.clone();
        for child in children {
            self.set_allegiance(child, allegiance);
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one fixed tick. `dt` is in frames (1.0 at `fps_target`).
    pub fn tick(&mut self, dt: f32) {
        update::tick(self, dt);
        self.frame += 1;
    }
}
