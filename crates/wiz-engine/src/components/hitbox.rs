use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::EntityId;
use crate::assets::manifest::HitboxTemplate;

/// What a hitbox does to whatever it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitboxMode {
    /// Deal `amount` damage to targets of another allegiance.
    Damage,
    /// Passive shield: suppresses damage hitboxes overlapping it.
    Block,
    /// Mark the owner as triggered when touched by another allegiance.
    Trigger,
    /// Divide eligible enemies into weaker clones.
    Split,
}

/// Hitbox component carried by child entities.
#[derive(Debug, Clone)]
pub struct Hitbox {
    /// Offset from the parent's top-left corner, for a parent facing right.
    pub offset: Vec2,
    pub mode: HitboxMode,
    pub amount: f32,
    /// Frames left before the hitbox removes itself.
    pub lifespan: f32,
    hit: HashSet<EntityId>,
}

impl Hitbox {
    pub fn new(mode: HitboxMode, offset: Vec2, amount: f32, lifespan: f32) -> Self {
        Self {
            offset,
            mode,
            amount,
            lifespan,
            hit: HashSet::new(),
        }
    }

    pub fn from_template(template: &HitboxTemplate) -> Self {
        Self::new(template.mode, template.offset, template.amount, template.lifespan)
    }

    /// Whether `target` was already affected during this activation.
    pub fn has_hit(&self, target: EntityId) -> bool {
        self.hit.contains(&target)
    }

    /// Record a target. Returns false if it was already recorded.
    pub fn record_hit(&mut self, target: EntityId) -> bool {
        self.hit.insert(target)
    }

    pub fn hit_count(&self) -> usize {
        self.hit.len()
    }

    /// Advance the lifespan. Returns true once the hitbox has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.lifespan -= dt;
        self.lifespan <= 0.0
    }

    /// World-space top-left for a parent at `parent_pos` of `parent_size`,
    /// mirroring the offset when the parent faces left.
    pub fn anchor(&self, parent_pos: Vec2, parent_size: Vec2, size: Vec2, direction: f32) -> Vec2 {
        if direction < 0.0 {
            Vec2::new(
                parent_pos.x + parent_size.x - self.offset.x - size.x,
                parent_pos.y + self.offset.y,
            )
        } else {
            parent_pos + self.offset
        }
    }
}
