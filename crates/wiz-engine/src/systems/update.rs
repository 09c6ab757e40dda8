//! The fixed-tick pipeline.
//!
//! Every phase walks the ids that were live when the tick started and
//! revalidates each one, so an entity deleted by an earlier phase (or earlier
//! in the same phase) is skipped rather than touched. Entities spawned during
//! the tick are not in that list and join at the next one.

use log::trace;

use crate::api::game::WorldContext;
use crate::api::types::EntityId;
use crate::components::entity::Snapshot;
use crate::core::actions::{self, QueuedAction};
use crate::core::{body, overlap};

/// Advance the world by one fixed tick of `dt` frames.
pub fn tick(world: &mut WorldContext, dt: f32) {
    let ids = world.scene.ids();

    for entity in world.scene.iter_mut() {
        entity.previous = Snapshot {
            pos: entity.pos,
            velocity: entity.velocity,
            grounded: entity.body.grounded,
        };
    }

    move_bodies(world, &ids, dt);
    overlap::resolve(world);
    snap_bodies(world, &ids, dt);
    follow_parents(world, &ids);
    run_actions(world, &ids, dt);
    commit_bodies(world, &ids);
    age(world, &ids, dt);
    world.camera.update(&world.scene, world.collision.layers());
}

fn move_bodies(world: &mut WorldContext, ids: &[EntityId], dt: f32) {
    let mut wall_hits = Vec::new();
    {
        let WorldContext {
            scene,
            collision,
            config,
            ..
        } = &mut *world;
        for &id in ids {
            let Some(entity) = scene.get_mut(id) else {
                continue;
            };
            if !entity.active || !entity.kind.has_body() {
                continue;
            }
            body::physics(entity, config, dt);
            let displacement = entity.velocity * dt;
            body::move_and_collide(entity, collision, config, displacement);
            if entity.motion.die_on_wall && entity.body.any_blocked() {
                wall_hits.push(id);
            }
        }
    }
    for id in wall_hits {
        trace!("{id:?} hit a wall");
        world.despawn(id);
    }
}

fn snap_bodies(world: &mut WorldContext, ids: &[EntityId], dt: f32) {
    let WorldContext {
        scene,
        collision,
        config,
        ..
    } = &mut *world;
    for &id in ids {
        if let Some(entity) = scene.get_mut(id).filter(|e| e.active && e.kind.has_body()) {
            body::ground_snap(entity, collision, config, dt);
        }
    }
}

/// Re-anchor hitboxes to wherever their owners ended up.
fn follow_parents(world: &mut WorldContext, ids: &[EntityId]) {
    for &id in ids {
        let Some(child) = world.scene.get(id) else {
            continue;
        };
        let (Some(parent_id), Some(hitbox)) = (child.parent, child.hitbox.as_ref()) else {
            continue;
        };
        let Some(parent) = world.scene.get(parent_id) else {
            continue;
        };
        let pos = hitbox.anchor(parent.pos, parent.size, child.size, parent.direction);
        let direction = parent.direction;
        if let Some(child) = world.scene.get_mut(id) {
            child.pos = pos;
            child.direction = direction;
        }
    }
}

/// Controllers enqueue first, idle entities reload their behavior, then every
/// queue runs.
fn run_actions(world: &mut WorldContext, ids: &[EntityId], dt: f32) {
    for &id in ids {
        let keys = &world.keys;
        let Some(entity) = world.scene.get_mut(id) else {
            continue;
        };
        if !entity.active {
            continue;
        }
        if !entity.stun && !entity.dead {
            let commands: Vec<_> = entity
                .controls
                .iter()
                .filter(|binding| binding.is_active(keys))
                .map(|binding| QueuedAction::once(0.0, binding.command.clone()))
                .collect();
            entity.actions.extend(commands);
        }

        actions::refill_idle(world, id);
        actions::run_queue(world, id, dt);
    }
}

fn commit_bodies(world: &mut WorldContext, ids: &[EntityId]) {
    let WorldContext { scene, config, .. } = &mut *world;
    for &id in ids {
        if let Some(entity) = scene.get_mut(id).filter(|e| e.active && e.kind.has_body()) {
            body::commit(entity, config);
        }
    }
}

/// Count down hitbox lifespans and invulnerability.
fn age(world: &mut WorldContext, ids: &[EntityId], dt: f32) {
    let mut expired = Vec::new();
    for &id in ids {
        let Some(entity) = world.scene.get_mut(id) else {
            continue;
        };
        if entity.invulnerable > 0.0 {
            entity.invulnerable = (entity.invulnerable - dt).max(0.0);
        }
        if let Some(hitbox) = entity.hitbox.as_mut() {
            if hitbox.tick(dt) {
                expired.push(id);
            }
        }
    }
    for id in expired {
        world.despawn(id);
    }
}
