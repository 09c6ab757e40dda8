use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{Allegiance, EntityId};
use crate::assets::manifest::ObjectDef;
use crate::components::hitbox::Hitbox;
use crate::core::actions::{ActionQueue, Value};
use crate::input::queue::KeyBinding;

/// Tagged entity kind. Replaces type-name checks for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Boss,
    Projectile,
    Hitbox,
    /// Solid-less gameplay object (pickups, switches, spawners).
    Prop,
    /// Purely visual; never takes part in overlap resolution.
    Decoration,
}

impl EntityKind {
    /// Takes part in entity-vs-entity overlap tests.
    pub fn is_collidable(self) -> bool {
        !matches!(self, EntityKind::Decoration)
    }

    /// Can lose health to damage hitboxes.
    pub fn is_damageable(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Enemy | EntityKind::Boss)
    }

    /// Eligible target for split hitboxes.
    pub fn is_splittable(self) -> bool {
        matches!(self, EntityKind::Enemy | EntityKind::Boss)
    }

    /// Moves through the tilemap under physics.
    pub fn has_body(self) -> bool {
        !matches!(self, EntityKind::Hitbox | EntityKind::Decoration)
    }

    pub fn as_u32(self) -> u32 {
        match self {
            EntityKind::Player => 0,
            EntityKind::Enemy => 1,
            EntityKind::Boss => 2,
            EntityKind::Projectile => 3,
            EntityKind::Hitbox => 4,
            EntityKind::Prop => 5,
            EntityKind::Decoration => 6,
        }
    }
}

/// What happens when an entity dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathHandler {
    /// Delete children, then the entity itself.
    #[default]
    Default,
    /// Divide into weaker clones, then delete.
    Split,
    /// Stay in the registry flagged dead (e.g. the player, awaiting a retry).
    Persist,
}

/// Contact flags produced by tile collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyState {
    pub grounded: bool,
    pub top_blocked: bool,
    pub left_blocked: bool,
    pub right_blocked: bool,
}

impl BodyState {
    pub fn any_blocked(&self) -> bool {
        self.top_blocked || self.left_blocked || self.right_blocked
    }
}

/// The four edge midpoints used for tile collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbePoints {
    pub left: Vec2,
    pub right: Vec2,
    pub top: Vec2,
    pub bottom: Vec2,
}

/// Per-entity movement tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub max_speed: f32,
    pub gravity_scale: f32,
    pub friction_scale: f32,
    /// Snap down onto ground when running off small steps.
    pub ground_snap: bool,
    /// Die as soon as any side is blocked (projectiles).
    pub die_on_wall: bool,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            max_speed: 20.0,
            gravity_scale: 1.0,
            friction_scale: 1.0,
            ground_snap: false,
            die_on_wall: false,
        }
    }
}

/// State remembered from the end of the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
}

/// Fat Entity: one struct with optional components.
///
/// Position is the top-left corner of an axis-aligned box of `size`.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Assigned by the scene on spawn.
    pub id: EntityId,
    /// Object definition name.
    pub name: String,
    pub kind: EntityKind,
    /// Inactive entities are skipped by every system.
    pub active: bool,
    pub pos: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    /// Second half of this tick's gravity (y) and friction magnitude (x),
    /// applied when velocities are committed at the end of the tick.
    pub velocity_adjust: Vec2,
    /// 1.0 facing right, -1.0 facing left.
    pub direction: f32,
    pub body: BodyState,
    pub motion: Motion,
    pub previous: Snapshot,
    /// Layer id this entity collides against.
    pub layer: u32,
    pub allegiance: Allegiance,
    pub health: f32,
    pub max_health: f32,
    pub stun: bool,
    pub dead: bool,
    /// Frames of remaining damage/split immunity.
    pub invulnerable: f32,
    pub palette: String,
    /// Palette to restore when a stun ends.
    pub stored_palette: String,
    /// Animation hint for renderers. Cleared by the runner once exported.
    pub requested_animation: Option<String>,
    pub actions: ActionQueue,
    /// Behavior reloaded into an idle, unstunned entity.
    pub behavior: Option<String>,
    pub death: DeathHandler,
    pub split_count: u32,
    pub division_iteration: u32,
    pub parent: Option<EntityId>,
    /// Owned children moved in lock-step with this entity.
    pub children: Vec<EntityId>,
    /// Live projectiles fired by this entity.
    pub projectiles: Vec<EntityId>,
    pub fire_limit: Option<usize>,
    pub hitbox: Option<Hitbox>,
    pub controls: Vec<KeyBinding>,
    /// Free-form attributes set by `SetAttribute`.
    pub attributes: HashMap<String, Value>,
}

impl Entity {
    /// Create an entity of the given kind at the origin.
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: EntityId::new(0, 0),
            name: name.into(),
            kind,
            active: true,
            pos: Vec2::ZERO,
            size: Vec2::ONE,
            velocity: Vec2::ZERO,
            velocity_adjust: Vec2::ZERO,
            direction: 1.0,
            body: BodyState::default(),
            motion: Motion::default(),
            previous: Snapshot::default(),
            layer: 0,
            allegiance: Allegiance::Neutral,
            health: 1.0,
            max_health: 1.0,
            stun: false,
            dead: false,
            invulnerable: 0.0,
            palette: "Default".to_string(),
            stored_palette: "Default".to_string(),
            requested_animation: None,
            actions: ActionQueue::new(),
            behavior: None,
            death: DeathHandler::Default,
            split_count: 2,
            division_iteration: 0,
            parent: None,
            children: Vec::new(),
            projectiles: Vec::new(),
            fire_limit: None,
            hitbox: None,
            controls: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Instantiate an object definition.
    pub fn from_def(name: &str, def: &ObjectDef) -> Self {
        let mut entity = Self::new(name, def.kind)
            .with_size(def.size)
            .with_allegiance(def.allegiance)
            .with_health(def.health);
        entity.motion = Motion {
            max_speed: def.max_speed,
            gravity_scale: def.gravity_scale,
            friction_scale: def.friction_scale,
            ground_snap: def.ground_snap,
            die_on_wall: def.die_on_wall,
        };
        entity.behavior = def.behavior.clone();
        entity.death = def.death;
        entity.split_count = def.split_count;
        entity.fire_limit = def.fire_limit;
        entity.palette = def.palette.clone();
        entity.stored_palette = def.palette.clone();
        entity.controls = def.controls.clone();
        entity
    }

    // -- Builder pattern --

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self.previous.pos = pos;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_allegiance(mut self, allegiance: Allegiance) -> Self {
        self.allegiance = allegiance;
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self.max_health = health;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_hitbox(mut self, hitbox: Hitbox) -> Self {
        self.hitbox = Some(hitbox);
        self
    }

    pub fn with_behavior(mut self, behavior: impl Into<String>) -> Self {
        self.behavior = Some(behavior.into());
        self
    }

    /// Edge midpoints of the current box.
    ///
    /// Always derived from the live position, so they can never be stale.
    pub fn points(&self) -> ProbePoints {
        let half = self.size / 2.0;
        ProbePoints {
            left: Vec2::new(self.pos.x, self.pos.y + half.y),
            right: Vec2::new(self.pos.x + self.size.x, self.pos.y + half.y),
            top: Vec2::new(self.pos.x + half.x, self.pos.y),
            bottom: Vec2::new(self.pos.x + half.x, self.pos.y + self.size.y),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Look up an attribute for `SelfAttributeEquals` pop-conditions.
    ///
    /// Built-in state is exposed under fixed names; everything else comes from
    /// `attributes`.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "grounded" => Value::Bool(self.body.grounded),
            "top_blocked" => Value::Bool(self.body.top_blocked),
            "left_blocked" => Value::Bool(self.body.left_blocked),
            "right_blocked" => Value::Bool(self.body.right_blocked),
            "stun" => Value::Bool(self.stun),
            "dead" => Value::Bool(self.dead),
            "health" => Value::Number(self.health),
            "direction" => Value::Number(self.direction),
            "division_iteration" => Value::Number(self.division_iteration as f32),
            "palette" => Value::Text(self.palette.clone()),
            _ => return self.attributes.get(name).cloned(),
        };
        Some(value)
    }
}
