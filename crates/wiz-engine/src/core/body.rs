//! Tile-space movement for entity bodies.
//!
//! Each tick a body goes through `physics` (first half of gravity and
//! friction), `move_and_collide` (sub-stepped travel with push-out after every
//! sub-step), optionally `ground_snap`, and finally `commit` (second half of
//! gravity and friction).
//!
//! Collision uses the four edge midpoints only. Corner-only contacts are not
//! detected, which small fast bodies can exploit; levels are authored around
//! this leniency.

use glam::Vec2;
use log::trace;

use crate::api::game::GameConfig;
use crate::components::entity::Entity;
use crate::core::collision::CollisionWorld;

/// Apply the first half of this tick's gravity and friction.
///
/// The second half is stashed in `velocity_adjust` and applied by `commit`.
pub fn physics(entity: &mut Entity, config: &GameConfig, dt: f32) {
    if entity.body.grounded {
        entity.velocity.y = 0.0;
        entity.velocity_adjust.y = 0.0;
    } else {
        let half_gravity = config.gravity * entity.motion.gravity_scale * dt / 2.0;
        entity.velocity.y =
            (entity.velocity.y + half_gravity).clamp(-config.max_rise_speed, config.max_fall_speed);
        entity.velocity_adjust.y = half_gravity;
    }

    let decay = config.friction * entity.motion.friction_scale * dt;
    if entity.velocity.x.abs() <= decay {
        entity.velocity.x = 0.0;
        entity.velocity_adjust.x = 0.0;
    } else {
        entity.velocity.x -= entity.velocity.x.signum() * decay / 2.0;
        entity.velocity_adjust.x = decay / 2.0;
    }
}

/// Number of sub-steps needed for a displacement.
pub fn substeps(displacement: Vec2, move_tick_amount: f32) -> u32 {
    let largest = displacement.x.abs().max(displacement.y.abs());
    (largest / move_tick_amount.max(1.0)).ceil() as u32
}

/// Travel `displacement`, at most `move_tick_amount` per axis per sub-step,
/// resolving tile collisions after every sub-step.
///
/// Always collides at least once, even when standing still. Returns the number
/// of sub-steps taken.
pub fn move_and_collide(
    entity: &mut Entity,
    world: &CollisionWorld,
    config: &GameConfig,
    displacement: Vec2,
) -> u32 {
    let limit = Vec2::splat(config.move_tick_amount.max(1.0));
    let steps = substeps(displacement, config.move_tick_amount);
    let mut remaining = displacement;
    for _ in 0..steps {
        let peel = remaining.clamp(-limit, limit);
        entity.pos += peel;
        remaining -= peel;
        collide(entity, world, config);
    }
    if steps == 0 {
        collide(entity, world, config);
    }
    steps
}

/// Probe the four edge midpoints and push the body out of solid tiles.
///
/// Each probe is re-derived from the current position, so a push from an
/// earlier probe is seen by the later ones. A pushed edge stays one unit inside
/// the surface, which keeps a resting body grounded on the next tick. A probe
/// with no free position within `correction_search_cap` leaves the body where
/// it is; only the blocked flag is set.
pub fn collide(entity: &mut Entity, world: &CollisionWorld, config: &GameConfig) {
    let layer = entity.layer;
    let cap = config.correction_search_cap;

    let bottom = entity.points().bottom;
    entity.body.grounded = world.point_collides(bottom, layer);
    if entity.body.grounded {
        if let Some(dist) = free_distance(cap, &entity.name, |d| {
            !world.point_collides(bottom - Vec2::new(0.0, d), layer)
        }) {
            entity.pos.y -= dist - 1.0;
        }
    }

    let top = entity.points().top;
    entity.body.top_blocked = world.point_collides(top, layer);
    if entity.body.top_blocked {
        if let Some(dist) = free_distance(cap, &entity.name, |d| {
            !world.point_collides(top + Vec2::new(0.0, d), layer)
        }) {
            entity.pos.y += dist - 1.0;
        }
    }

    let left = entity.points().left;
    entity.body.left_blocked = world.point_collides(left, layer);
    if entity.body.left_blocked {
        if let Some(dist) = free_distance(cap, &entity.name, |d| {
            !world.point_collides(left + Vec2::new(d, 0.0), layer)
        }) {
            entity.pos.x += dist - 1.0;
        }
    }

    let right = entity.points().right;
    entity.body.right_blocked = world.point_collides(right, layer);
    if entity.body.right_blocked {
        if let Some(dist) = free_distance(cap, &entity.name, |d| {
            !world.point_collides(right - Vec2::new(d, 0.0), layer)
        }) {
            entity.pos.x -= dist - 1.0;
        }
    }
}

/// Snap an airborne body onto ground that is closer below it than the
/// horizontal distance it travels this tick.
///
/// Only bodies with `ground_snap` enabled are affected, and never while rising.
/// Returns true if the body was snapped.
pub fn ground_snap(entity: &mut Entity, world: &CollisionWorld, config: &GameConfig, dt: f32) -> bool {
    if !entity.motion.ground_snap || entity.body.grounded || entity.velocity.y < 0.0 {
        return false;
    }
    let reach = (entity.velocity.x * dt).abs();
    let bottom = entity.points().bottom;
    let layer = entity.layer;
    let found = (1..=config.correction_search_cap)
        .map(|d| d as f32)
        .take_while(|&d| d < reach)
        .find(|&d| world.point_collides(bottom + Vec2::new(0.0, d), layer));
    match found {
        Some(dist) => {
            entity.pos.y += dist;
            entity.body.grounded = true;
            true
        }
        None => false,
    }
}

/// Apply the deferred half of gravity and friction.
pub fn commit(entity: &mut Entity, config: &GameConfig) {
    if entity.body.grounded {
        entity.velocity.y = 0.0;
    } else {
        entity.velocity.y = (entity.velocity.y + entity.velocity_adjust.y)
            .clamp(-config.max_rise_speed, config.max_fall_speed);
    }

    let step = entity.velocity_adjust.x;
    if entity.velocity.x.abs() <= step {
        entity.velocity.x = 0.0;
    } else {
        entity.velocity.x -= entity.velocity.x.signum() * step;
    }
    entity.velocity_adjust = Vec2::ZERO;
}

/// First distance in 1..=cap for which `is_free` holds.
fn free_distance(cap: u32, name: &str, is_free: impl Fn(f32) -> bool) -> Option<f32> {
    let found = (1..=cap).map(|d| d as f32).find(|&d| is_free(d));
    if found.is_none() {
        trace!("{name}: no free position within {cap} units");
    }
    found
}
