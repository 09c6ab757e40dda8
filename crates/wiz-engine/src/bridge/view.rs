//! Per-frame export of world state for hosts and renderers.
//!
//! Numeric entity state is packed into a flat `#[repr(C)]` array a host can
//! read through a pointer; palette and animation labels travel alongside as
//! strings, in the same order.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::components::entity::Entity;
use crate::core::camera::Camera;
use crate::core::scene::Scene;

/// One live entity as seen by a renderer. 16 floats/u32s = 64 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct EntityView {
    pub id: u32,
    pub generation: u32,
    pub kind: u32,
    /// Bit set of `EntityView::GROUNDED` and friends.
    pub flags: u32,
    pub x: f32,
    pub y: f32,
    /// Position at the start of the last tick, for interpolation.
    pub prev_x: f32,
    pub prev_y: f32,
    pub w: f32,
    pub h: f32,
    pub vx: f32,
    pub vy: f32,
    pub direction: f32,
    pub health: f32,
    pub layer: u32,
    pub parent: u32,
}

impl EntityView {
    pub const FLOATS: usize = 16;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub const GROUNDED: u32 = 1;
    pub const STUNNED: u32 = 1 << 1;
    pub const DEAD: u32 = 1 << 2;
    pub const INVULNERABLE: u32 = 1 << 3;
    pub const FACING_LEFT: u32 = 1 << 4;

    /// Marker for `parent` when the entity has none.
    pub const NO_PARENT: u32 = u32::MAX;

    pub fn from_entity(entity: &Entity) -> Self {
        let mut flags = 0;
        if entity.body.grounded {
            flags |= Self::GROUNDED;
        }
        if entity.stun {
            flags |= Self::STUNNED;
        }
        if entity.dead {
            flags |= Self::DEAD;
        }
        if entity.invulnerable > 0.0 {
            flags |= Self::INVULNERABLE;
        }
        if entity.direction < 0.0 {
            flags |= Self::FACING_LEFT;
        }
        Self {
            id: entity.id.index,
            generation: entity.id.generation,
            kind: entity.kind.as_u32(),
            flags,
            x: entity.pos.x,
            y: entity.pos.y,
            prev_x: entity.previous.pos.x,
            prev_y: entity.previous.pos.y,
            w: entity.size.x,
            h: entity.size.y,
            vx: entity.velocity.x,
            vy: entity.velocity.y,
            direction: entity.direction,
            health: entity.health,
            layer: entity.layer,
            parent: entity.parent.map_or(Self::NO_PARENT, |p| p.index),
        }
    }

    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Position blended between the previous and current tick.
    pub fn lerp_pos(&self, alpha: f32) -> Vec2 {
        let prev = Vec2::new(self.prev_x, self.prev_y);
        prev.lerp(Vec2::new(self.x, self.y), alpha)
    }
}

/// Labels that don't fit the packed layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityLabels {
    pub name: String,
    pub palette: String,
    /// Set only on the frame an animation was requested.
    pub animation: Option<String>,
}

/// Everything a renderer needs for one host frame.
#[derive(Debug, Clone, Default)]
pub struct ViewBuffer {
    pub entities: Vec<EntityView>,
    /// Parallel to `entities`.
    pub labels: Vec<EntityLabels>,
    pub camera_pos: Vec2,
    pub camera_last_pos: Vec2,
    /// Progress between the last tick and the next (0.0 to 1.0).
    pub alpha: f32,
}

impl ViewBuffer {
    pub fn new() -> Self {
        Self {
            entities: Vec::with_capacity(256),
            labels: Vec::with_capacity(256),
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.labels.clear();
    }

    /// Refill from the scene. Inactive entities are left out.
    pub fn rebuild(&mut self, scene: &Scene, camera: &Camera, alpha: f32) {
        self.clear();
        for entity in scene.iter().filter(|e| e.active) {
            self.entities.push(EntityView::from_entity(entity));
            self.labels.push(EntityLabels {
                name: entity.name.clone(),
                palette: entity.palette.clone(),
                animation: entity.requested_animation.clone(),
            });
        }
        self.camera_pos = camera.pos;
        self.camera_last_pos = camera.last_pos;
        self.alpha = alpha;
    }

    /// Camera position blended the same way as entity positions.
    pub fn camera_at(&self) -> Vec2 {
        self.camera_last_pos.lerp(self.camera_pos, self.alpha)
    }

    pub fn entity_count(&self) -> u32 {
        self.entities.len() as u32
    }

    /// Raw pointer to the packed entity data for host reads.
    pub fn entities_ptr(&self) -> *const f32 {
        self.entities.as_ptr() as *const f32
    }

    /// Packed entity data as plain bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entities)
    }
}
