//! Per-entity action queues.
//!
//! An action queue is an ordered list of timed commands. Every tick each item
//! either counts down its delay or fires its primitive and then checks its
//! pop-condition. Player input, enemy AI, damage reactions and projectiles all
//! run through the same interpreter.

use std::collections::HashMap;

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::api::game::WorldContext;
use crate::api::types::EntityId;
use crate::components::entity::Entity;
use crate::core::primitives::{self, Primitive};
use crate::input::queue::KeyState;

/// A loosely typed value compared by pop-conditions and stored as an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f32),
    Text(String),
}

impl Value {
    /// Equality with bool <-> 1/0 coercion.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Number(b)) | (Value::Number(b), Value::Bool(a)) => {
                (if *a { 1.0 } else { 0.0 }) == *b
            }
            _ => self == other,
        }
    }
}

/// Argument kinds, checked against each primitive when definitions load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    None,
    Number,
    Vector,
    Text,
    Assign,
}

/// Argument of a command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArg {
    #[default]
    None,
    Number(f32),
    Vector(Vec2),
    Text(String),
    /// Key/value pair for `set_attribute` and `set_global`.
    Assign { key: String, value: Value },
}

impl CommandArg {
    pub fn kind(&self) -> ArgKind {
        match self {
            CommandArg::None => ArgKind::None,
            CommandArg::Number(_) => ArgKind::Number,
            CommandArg::Vector(_) => ArgKind::Vector,
            CommandArg::Text(_) => ArgKind::Text,
            CommandArg::Assign { .. } => ArgKind::Assign,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            CommandArg::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec2> {
        match self {
            CommandArg::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CommandArg::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A primitive plus its argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub primitive: Primitive,
    #[serde(default)]
    pub arg: CommandArg,
}

impl Command {
    pub fn new(primitive: Primitive, arg: CommandArg) -> Self {
        Self { primitive, arg }
    }

    pub fn bare(primitive: Primitive) -> Self {
        Self::new(primitive, CommandArg::None)
    }
}

/// When a fired command leaves the queue.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PopSpec", into = "PopSpec")]
pub enum PopCondition {
    /// Pop after firing once.
    #[default]
    None,
    SelfAttributeEquals { attr: String, value: Value },
    GlobalStateEquals { key: String, value: Value },
    KeyStateEquals { key: u32, pressed: bool },
    /// Re-fire every tick until `remaining` frames have elapsed.
    TimerExpires { remaining: f32 },
    /// A source this runtime does not understand. Popped with a warning.
    Unknown { source: String },
}

/// Flat wire form of a pop-condition.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PopSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_code: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pressed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ticks: Option<f32>,
}

impl From<PopSpec> for PopCondition {
    fn from(spec: PopSpec) -> Self {
        let when = spec.when.unwrap_or_else(|| "none".to_string());
        let condition = match when.as_str() {
            "none" => Some(PopCondition::None),
            "self_attribute" => spec
                .attr
                .zip(spec.value)
                .map(|(attr, value)| PopCondition::SelfAttributeEquals { attr, value }),
            "global" => spec
                .key
                .zip(spec.value)
                .map(|(key, value)| PopCondition::GlobalStateEquals { key, value }),
            "key" => spec
                .key_code
                .zip(spec.pressed)
                .map(|(key, pressed)| PopCondition::KeyStateEquals { key, pressed }),
            "timer" => spec.ticks.map(|remaining| PopCondition::TimerExpires { remaining }),
            _ => None,
        };
        condition.unwrap_or(PopCondition::Unknown { source: when })
    }
}

impl From<PopCondition> for PopSpec {
    fn from(pop: PopCondition) -> Self {
        match pop {
            PopCondition::None => PopSpec::default(),
            PopCondition::SelfAttributeEquals { attr, value } => PopSpec {
                when: Some("self_attribute".into()),
                attr: Some(attr),
                value: Some(value),
                ..PopSpec::default()
            },
            PopCondition::GlobalStateEquals { key, value } => PopSpec {
                when: Some("global".into()),
                key: Some(key),
                value: Some(value),
                ..PopSpec::default()
            },
            PopCondition::KeyStateEquals { key, pressed } => PopSpec {
                when: Some("key".into()),
                key_code: Some(key),
                pressed: Some(pressed),
                ..PopSpec::default()
            },
            PopCondition::TimerExpires { remaining } => PopSpec {
                when: Some("timer".into()),
                ticks: Some(remaining),
                ..PopSpec::default()
            },
            PopCondition::Unknown { source } => PopSpec {
                when: Some(source),
                ..PopSpec::default()
            },
        }
    }
}

/// One queue entry: `(delay remaining, command, pop-condition)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Frames left before the command fires.
    #[serde(default)]
    pub delay: f32,
    pub command: Command,
    #[serde(default)]
    pub pop: PopCondition,
}

impl QueuedAction {
    pub fn new(delay: f32, command: Command, pop: PopCondition) -> Self {
        Self { delay, command, pop }
    }

    /// Fire once after `delay` frames.
    pub fn once(delay: f32, command: Command) -> Self {
        Self::new(delay, command, PopCondition::None)
    }
}

/// Ordered list of timed commands owned by one entity.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    items: Vec<QueuedAction>,
    /// Bumped whenever the queue is replaced or cleared wholesale.
    generation: u32,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command. Appended items are first considered next tick.
    pub fn push(&mut self, action: QueuedAction) {
        self.items.push(action);
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = QueuedAction>) {
        self.items.extend(actions);
    }

    /// Swap in a whole new timeline (behavior load).
    pub fn replace(&mut self, actions: Vec<QueuedAction>) {
        self.items = actions;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.items.iter()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Run one interpreter tick over an entity's queue.
///
/// Items fire in order. If a primitive deletes the entity, the run stops. If a
/// primitive replaces or clears the queue, the rest of the old timeline is
/// dropped and the new one starts next tick.
pub fn run_queue(world: &mut WorldContext, id: EntityId, dt: f32) {
    let (pending, generation) = match world.scene.get_mut(id) {
        Some(entity) => (std::mem::take(&mut entity.actions.items), entity.actions.generation),
        None => return,
    };

    let mut kept = Vec::with_capacity(pending.len());
    for mut action in pending {
        if action.delay > 0.0 {
            action.delay -= dt;
            kept.push(action);
            continue;
        }

        primitives::execute(world, id, &action.command, dt);

        let Some(entity) = world.scene.get(id) else {
            return;
        };
        if entity.actions.generation != generation {
            return;
        }
        if !pop_ready(&mut action.pop, entity, &world.globals, &world.keys, dt) {
            kept.push(action);
        }
    }

    if let Some(entity) = world.scene.get_mut(id) {
        kept.append(&mut entity.actions.items);
        entity.actions.items = kept;
    }
}

/// Evaluate a pop-condition after its command fired.
pub fn pop_ready(
    pop: &mut PopCondition,
    entity: &Entity,
    globals: &HashMap<String, Value>,
    keys: &KeyState,
    dt: f32,
) -> bool {
    match pop {
        PopCondition::None => true,
        PopCondition::SelfAttributeEquals { attr, value } => {
            entity.attribute(attr).is_some_and(|current| current.matches(value))
        }
        PopCondition::GlobalStateEquals { key, value } => {
            globals.get(key.as_str()).is_some_and(|current| current.matches(value))
        }
        PopCondition::KeyStateEquals { key, pressed } => keys.is_down(*key) == *pressed,
        PopCondition::TimerExpires { remaining } => {
            *remaining -= dt;
            *remaining <= 0.0
        }
        PopCondition::Unknown { source } => {
            warn!("{}: dropping command with unknown pop condition {source:?}", entity.name);
            true
        }
    }
}

/// Reload the entity's behavior if its queue ran dry and it is free to act.
pub fn refill_idle(world: &mut WorldContext, id: EntityId) {
    let Some(entity) = world.scene.get(id) else {
        return;
    };
    if !entity.actions.is_empty() || entity.stun || entity.dead {
        return;
    }
    let Some(name) = entity.behavior.as_deref() else {
        return;
    };
    let Some(timeline) = world.registry.behavior(name) else {
        warn!("{}: behavior {name:?} is not defined", entity.name);
        return;
    };
    let timeline = timeline.to_vec();
    if let Some(entity) = world.scene.get_mut(id) {
        entity.actions.replace(timeline);
    }
}
