//! Move primitives: the closed instruction set of the action-queue interpreter.

use glam::Vec2;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::api::game::WorldContext;
use crate::api::types::{EntityId, GameEvent};
use crate::components::entity::DeathHandler;
use crate::core::actions::{ArgKind, Command, CommandArg, QueuedAction};
use crate::core::overlap;

/// Every command an action queue can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    /// Leave the ground with upward speed `arg`. No-op while airborne.
    Jump,
    /// Counter half of gravity while still rising.
    JumpStall,
    /// Accelerate by `arg` per frame, capped at the entity's max speed.
    Walk,
    /// Face left (negative) or right.
    Face,
    SetForce,
    AddForce,
    Delete,
    Stun,
    Destun,
    SetPalette,
    TakeDamage,
    Die,
    /// Immune to damage and splitting for `arg` frames.
    SetInvulnerable,
    SpawnHitbox,
    /// Launch a projectile object, subject to the fire limit.
    Fire,
    Spawn,
    SetAttribute,
    SetGlobal,
    TransitionLevel,
    RequestAnimation,
    LoadBehavior,
    FocusCamera,
    LockCamera,
    UnlockCamera,
}

impl Primitive {
    /// Argument kind this primitive expects.
    pub fn arg_kind(self) -> ArgKind {
        use Primitive::*;
        match self {
            JumpStall | Delete | Stun | Destun | Die | FocusCamera | LockCamera | UnlockCamera => ArgKind::None,
            Jump | Walk | Face | TakeDamage | SetInvulnerable => ArgKind::Number,
            SetForce | AddForce => ArgKind::Vector,
            SetPalette | SpawnHitbox | Fire | Spawn | TransitionLevel | RequestAnimation | LoadBehavior => {
                ArgKind::Text
            }
            SetAttribute | SetGlobal => ArgKind::Assign,
        }
    }
}

/// Run one command against an entity.
///
/// Arguments were checked when definitions loaded; a mismatched argument that
/// still reaches here is logged and skipped.
pub fn execute(world: &mut WorldContext, id: EntityId, command: &Command, dt: f32) {
    if command.arg.kind() != command.primitive.arg_kind() {
        warn!(
            "{:?}: expected a {:?} argument, got {:?}",
            command.primitive,
            command.primitive.arg_kind(),
            command.arg
        );
        return;
    }

    match (command.primitive, &command.arg) {
        (Primitive::Jump, &CommandArg::Number(height)) => {
            if let Some(e) = world.scene.get_mut(id) {
                if e.body.grounded {
                    e.velocity.y = -height;
                    e.body.grounded = false;
                }
            }
        }
        (Primitive::JumpStall, _) => {
            let half_gravity = world.config.gravity / 2.0;
            if let Some(e) = world.scene.get_mut(id) {
                if e.velocity.y < 0.0 {
                    e.velocity.y -= half_gravity * e.motion.gravity_scale * dt;
                }
            }
        }
        (Primitive::Walk, &CommandArg::Number(speed)) => {
            if let Some(e) = world.scene.get_mut(id) {
                let max = e.motion.max_speed;
                e.velocity.x = (e.velocity.x + speed * dt).clamp(-max, max);
                if speed != 0.0 {
                    e.direction = speed.signum();
                }
            }
        }
        (Primitive::Face, &CommandArg::Number(direction)) => {
            if let Some(e) = world.scene.get_mut(id) {
                e.direction = if direction < 0.0 { -1.0 } else { 1.0 };
            }
        }
        (Primitive::SetForce, &CommandArg::Vector(force)) => {
            if let Some(e) = world.scene.get_mut(id) {
                e.velocity = force;
                if force.y < 0.0 {
                    e.body.grounded = false;
                }
            }
        }
        (Primitive::AddForce, &CommandArg::Vector(force)) => {
            if let Some(e) = world.scene.get_mut(id) {
                e.velocity += force;
                if e.velocity.y < 0.0 {
                    e.body.grounded = false;
                }
            }
        }
        (Primitive::Delete, _) => {
            world.despawn(id);
        }
        (Primitive::Stun, _) => {
            if let Some(e) = world.scene.get_mut(id) {
                if !e.stun {
                    e.stored_palette = std::mem::take(&mut e.palette);
                }
                e.stun = true;
                e.palette = "Stun".to_string();
            }
        }
        (Primitive::Destun, _) => {
            if let Some(e) = world.scene.get_mut(id) {
                if e.stun {
                    e.palette = e.stored_palette.clone();
                }
                e.stun = false;
            }
        }
        (Primitive::SetPalette, CommandArg::Text(name)) => {
            if let Some(e) = world.scene.get_mut(id) {
                e.palette = name.clone();
            }
        }
        (Primitive::TakeDamage, &CommandArg::Number(amount)) => {
            take_damage(world, id, amount);
        }
        (Primitive::Die, _) => die(world, id),
        (Primitive::SetInvulnerable, &CommandArg::Number(frames)) => {
            if let Some(e) = world.scene.get_mut(id) {
                e.invulnerable = frames;
            }
        }
        (Primitive::SpawnHitbox, CommandArg::Text(template)) => {
            if let Err(err) = world.attach_hitbox(id, template) {
                warn!("spawn_hitbox: {err}");
            }
        }
        (Primitive::Fire, CommandArg::Text(object)) => fire(world, id, object),
        (Primitive::Spawn, CommandArg::Text(object)) => {
            let Some((pos, layer, direction)) = world.scene.get(id).map(|e| (e.pos, e.layer, e.direction)) else {
                return;
            };
            match world.spawn_object(object, pos, layer) {
                Ok(child) => {
                    if let Some(e) = world.scene.get_mut(child) {
                        e.direction = direction;
                    }
                }
                Err(err) => warn!("spawn: {err}"),
            }
        }
        (Primitive::SetAttribute, CommandArg::Assign { key, value }) => {
            if let Some(e) = world.scene.get_mut(id) {
                e.attributes.insert(key.clone(), value.clone());
            }
        }
        (Primitive::SetGlobal, CommandArg::Assign { key, value }) => {
            world.globals.insert(key.clone(), value.clone());
        }
        (Primitive::TransitionLevel, CommandArg::Text(level)) => {
            debug!("level transition to {level:?} requested");
            world.pending_level = Some(level.clone());
        }
        (Primitive::RequestAnimation, CommandArg::Text(name)) => {
            if let Some(e) = world.scene.get_mut(id) {
                e.requested_animation = Some(name.clone());
            }
        }
        (Primitive::LoadBehavior, CommandArg::Text(name)) => {
            let Some(timeline) = world.registry.behavior(name).map(<[QueuedAction]>::to_vec) else {
                warn!("load_behavior: no behavior named {name:?}");
                return;
            };
            if let Some(e) = world.scene.get_mut(id) {
                e.behavior = Some(name.clone());
                e.actions.replace(timeline);
            }
        }
        (Primitive::FocusCamera, _) => {
            if world.scene.contains(id) {
                world.camera.set_focus(Some(id));
            }
        }
        (Primitive::LockCamera, _) => world.camera.lock(id),
        (Primitive::UnlockCamera, _) => world.camera.unlock(id),
        // Unreachable after the kind check above.
        _ => {}
    }
}

/// Apply damage unless the target is dead or invulnerable.
///
/// Queues the hurt reaction (stun, palette flicker, destun) or death. Returns
/// true if the damage landed.
pub fn take_damage(world: &mut WorldContext, id: EntityId, amount: f32) -> bool {
    let config = &world.config;
    let Some(e) = world.scene.get_mut(id) else {
        return false;
    };
    if e.dead || e.invulnerable > 0.0 {
        return false;
    }

    e.health -= amount;
    e.invulnerable = config.damage_invulnerability;
    debug!("{} took {amount} damage, {} left", e.name, e.health);
    let event = GameEvent::new(GameEvent::DAMAGE, id.index as f32, amount, e.health);

    if e.health <= 0.0 {
        e.actions.push(QueuedAction::once(0.0, Command::bare(Primitive::Die)));
    } else {
        let flickers = config.damage_flicker_count * 2;
        let step = config.stun_duration / (flickers + 1) as f32;
        e.actions.push(QueuedAction::once(0.0, Command::bare(Primitive::Stun)));
        for i in 0..flickers {
            let palette = if i % 2 == 0 { "Hurt" } else { "Stun" };
            e.actions.push(QueuedAction::once(
                step * (i + 1) as f32,
                Command::new(Primitive::SetPalette, CommandArg::Text(palette.to_string())),
            ));
        }
        e.actions.push(QueuedAction::once(config.stun_duration, Command::bare(Primitive::Destun)));
    }
    world.emit(event);
    true
}

/// Run the entity's death handler and report the death.
pub fn die(world: &mut WorldContext, id: EntityId) {
    let Some((handler, pos, dead)) = world.scene.get(id).map(|e| (e.death, e.pos, e.dead)) else {
        return;
    };
    if dead {
        return;
    }
    world.emit(GameEvent::new(GameEvent::DEATH, id.index as f32, pos.x, pos.y));
    match handler {
        DeathHandler::Default => {
            world.despawn(id);
        }
        DeathHandler::Split => {
            overlap::split(world, id);
        }
        DeathHandler::Persist => {
            if let Some(e) = world.scene.get_mut(id) {
                e.dead = true;
                e.velocity.x = 0.0;
                e.actions.clear();
                e.requested_animation = Some("Die".to_string());
                debug!("{} died and persists", e.name);
            }
        }
    }
}

/// Launch a projectile from the entity's facing side.
fn fire(world: &mut WorldContext, id: EntityId, object: &str) {
    let Some(size) = world.registry.object(object).map(|def| def.size) else {
        warn!("fire: no object definition named {object:?}");
        return;
    };
    let Some(owner) = world.scene.get(id) else {
        return;
    };

    let mut live: Vec<EntityId> = owner
        .projectiles
        .iter()
        .copied()
        .filter(|p| world.scene.contains(*p))
        .collect();
    let limit = owner.fire_limit;
    let direction = owner.direction;
    let (layer, allegiance) = (owner.layer, owner.allegiance);
    let x = if direction < 0.0 {
        owner.pos.x - size.x
    } else {
        owner.pos.x + owner.size.x
    };
    let pos = Vec2::new(x, owner.center().y - size.y / 2.0);

    if limit.is_some_and(|limit| live.len() >= limit) {
        trace!("{}: fire limit reached", owner.name);
    } else {
        match world.spawn_object(object, pos, layer) {
            Ok(projectile) => {
                world.set_allegiance(projectile, allegiance);
                if let Some(p) = world.scene.get_mut(projectile) {
                    p.direction = direction;
                    p.velocity.x = direction * p.motion.max_speed;
                }
                live.push(projectile);
            }
            Err(err) => warn!("fire: {err}"),
        }
    }

    if let Some(owner) = world.scene.get_mut(id) {
        owner.projectiles = live;
    }
}
