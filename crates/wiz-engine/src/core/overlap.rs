//! Entity-vs-entity overlap resolution.
//!
//! Brute force: every live hitbox is tested against every other collidable
//! entity on its layer. Contacts are collected in one pass and applied in a
//! second, so deletes and spawns caused by one contact never disturb the scan.

use glam::Vec2;
use log::{debug, warn};

use crate::api::game::WorldContext;
use crate::api::types::{EntityId, GameEvent};
use crate::components::entity::{Entity, EntityKind};
use crate::components::hitbox::HitboxMode;
use crate::core::actions::Value;
use crate::core::primitives;
use crate::core::scene::Scene;

/// A hitbox touching another entity this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub hitbox: EntityId,
    pub target: EntityId,
}

/// Closed-interval span test: either span contains an end of the other.
fn spans_overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> bool {
    (a0 <= b0 && b0 <= a1) || (a0 <= b1 && b1 <= a1) || (b0 <= a0 && a0 <= b1) || (b0 <= a1 && a1 <= b1)
}

/// Axis-aligned overlap with touching edges counting as overlap.
pub fn boxes_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    spans_overlap(a_pos.x, a_pos.x + a_size.x, b_pos.x, b_pos.x + b_size.x)
        && spans_overlap(a_pos.y, a_pos.y + a_size.y, b_pos.y, b_pos.y + b_size.y)
}

pub fn entities_overlap(a: &Entity, b: &Entity) -> bool {
    boxes_overlap(a.pos, a.size, b.pos, b.size)
}

/// Find every hitbox/target pair that overlaps.
///
/// A hitbox never reacts to itself, its owner, its owner's other hitboxes,
/// other hitboxes, or entities on another layer.
pub fn collect_contacts(scene: &Scene) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for hitbox in scene.iter().filter(|e| e.active && e.hitbox.is_some()) {
        for target in scene.iter() {
            if target.id == hitbox.id
                || !target.active
                || target.kind == EntityKind::Hitbox
                || !target.kind.is_collidable()
                || target.layer != hitbox.layer
                || Some(target.id) == hitbox.parent
            {
                continue;
            }
            if entities_overlap(hitbox, target) {
                contacts.push(Contact {
                    hitbox: hitbox.id,
                    target: target.id,
                });
            }
        }
    }
    contacts
}

/// Apply collected contacts, revalidating both handles first.
pub fn apply_contacts(world: &mut WorldContext, contacts: &[Contact]) {
    for contact in contacts {
        let Some(mode) = world
            .scene
            .get(contact.hitbox)
            .and_then(|e| e.hitbox.as_ref())
            .map(|h| h.mode)
        else {
            continue;
        };
        if !world.scene.contains(contact.target) {
            continue;
        }
        match mode {
            HitboxMode::Damage => apply_damage(world, *contact),
            HitboxMode::Trigger => apply_trigger(world, *contact),
            HitboxMode::Split => apply_split(world, *contact),
            HitboxMode::Block => {}
        }
    }
}

/// Run both phases for the whole scene.
pub fn resolve(world: &mut WorldContext) {
    let contacts = collect_contacts(&world.scene);
    apply_contacts(world, &contacts);
}

fn apply_damage(world: &mut WorldContext, contact: Contact) {
    let (Some(hitbox), Some(target)) = (world.scene.get(contact.hitbox), world.scene.get(contact.target)) else {
        return;
    };
    let Some(component) = hitbox.hitbox.as_ref() else {
        return;
    };
    if hitbox.allegiance == target.allegiance
        || !target.kind.is_damageable()
        || target.dead
        || component.has_hit(target.id)
    {
        return;
    }
    let amount = component.amount;
    let owner = hitbox.parent;
    let blocker = blocking_child(&world.scene, hitbox, target);

    if let Some(blocker) = blocker {
        record_hit(world, contact);
        world.emit(GameEvent::new(
            GameEvent::BLOCKED,
            blocker.index as f32,
            contact.hitbox.index as f32,
            0.0,
        ));
        despawn_projectile(world, owner);
        return;
    }

    if primitives::take_damage(world, contact.target, amount) {
        record_hit(world, contact);
        despawn_projectile(world, owner);
    }
}

/// A block hitbox owned by `target` that overlaps the attacking hitbox.
fn blocking_child(scene: &Scene, attacker: &Entity, target: &Entity) -> Option<EntityId> {
    target.children.iter().copied().find(|child| {
        scene.get(*child).is_some_and(|c| {
            c.active
                && c.hitbox.as_ref().is_some_and(|h| h.mode == HitboxMode::Block)
                && entities_overlap(c, attacker)
        })
    })
}

fn apply_trigger(world: &mut WorldContext, contact: Contact) {
    let (Some(hitbox), Some(target)) = (world.scene.get(contact.hitbox), world.scene.get(contact.target)) else {
        return;
    };
    let Some(component) = hitbox.hitbox.as_ref() else {
        return;
    };
    if hitbox.allegiance == target.allegiance || component.has_hit(target.id) {
        return;
    }
    let amount = component.amount;
    let owner = hitbox.parent;
    record_hit(world, contact);
    if let Some(owner) = owner.and_then(|o| world.scene.get_mut(o)) {
        owner.attributes.insert("triggered".to_string(), Value::Bool(true));
    }
    world.emit(GameEvent::new(
        GameEvent::TRIGGER,
        contact.hitbox.index as f32,
        contact.target.index as f32,
        amount,
    ));
}

fn apply_split(world: &mut WorldContext, contact: Contact) {
    let (Some(hitbox), Some(target)) = (world.scene.get(contact.hitbox), world.scene.get(contact.target)) else {
        return;
    };
    let Some(component) = hitbox.hitbox.as_ref() else {
        return;
    };
    if hitbox.allegiance == target.allegiance
        || !target.kind.is_splittable()
        || target.invulnerable > 0.0
        || component.has_hit(target.id)
    {
        return;
    }
    let owner = hitbox.parent;
    record_hit(world, contact);
    split(world, contact.target);
    despawn_projectile(world, owner);
}

fn record_hit(world: &mut WorldContext, contact: Contact) {
    if let Some(h) = world.scene.get_mut(contact.hitbox).and_then(|e| e.hitbox.as_mut()) {
        h.record_hit(contact.target);
    }
}

/// Projectiles are used up by their first hit.
fn despawn_projectile(world: &mut WorldContext, owner: Option<EntityId>) {
    let Some(owner) = owner else {
        return;
    };
    if world.scene.get(owner).is_some_and(|e| e.kind == EntityKind::Projectile) {
        world.despawn(owner);
    }
}

/// Divide an entity into weaker clones of the same object.
///
/// The original is always removed. Clones get half the original's max health
/// (at least 1), one more division iteration, staggered invulnerability and a
/// fanned-out hop. At the iteration cap no clones are made. Returns the number
/// of clones spawned.
pub fn split(world: &mut WorldContext, id: EntityId) -> u32 {
    let Some(e) = world.scene.get(id) else {
        return 0;
    };
    let config = world.config.clone();
    if e.division_iteration >= config.max_division_iterations {
        debug!("{} reached the division cap", e.name);
        world.despawn(id);
        return 0;
    }

    let name = e.name.clone();
    let (pos, layer, direction) = (e.pos, e.layer, e.direction);
    let count = e.split_count;
    let iteration = e.division_iteration + 1;
    let health = (e.max_health / 2.0).floor().max(1.0);
    world.despawn(id);

    let mut spawned = 0;
    for i in 0..count {
        let clone = match world.spawn_object(&name, pos, layer) {
            Ok(clone) => clone,
            Err(err) => {
                warn!("split: {err}");
                continue;
            }
        };
        if let Some(c) = world.scene.get_mut(clone) {
            let fan = i as f32 - (count.saturating_sub(1)) as f32 / 2.0;
            c.division_iteration = iteration;
            c.max_health = health;
            c.health = health;
            c.direction = direction;
            c.invulnerable = config.split_invulnerability + i as f32 * config.split_stagger;
            c.velocity = Vec2::new(fan * c.motion.max_speed / 2.0, -config.split_hop);
            c.body.grounded = false;
        }
        spawned += 1;
    }

    debug!("{name} split into {spawned} (iteration {iteration})");
    world.emit(GameEvent::new(
        GameEvent::SPLIT,
        id.index as f32,
        spawned as f32,
        iteration as f32,
    ));
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Allegiance;
    use crate::components::hitbox::Hitbox;
    use crate::test_support;

    fn actor(world: &mut WorldContext, allegiance: Allegiance, x: f32) -> EntityId {
        world.scene.spawn(
            Entity::new("actor", EntityKind::Enemy)
                .with_pos(Vec2::new(x, 100.0))
                .with_size(Vec2::new(40.0, 40.0))
                .with_allegiance(allegiance)
                .with_health(5.0),
        )
    }

    fn hitbox(world: &mut WorldContext, owner: EntityId, mode: HitboxMode, pos: Vec2, size: Vec2) -> EntityId {
        let allegiance = world.scene.get(owner).unwrap().allegiance;
        let mut e = Entity::new("hb", EntityKind::Hitbox)
            .with_pos(pos)
            .with_size(size)
            .with_allegiance(allegiance)
            .with_hitbox(Hitbox::new(mode, Vec2::ZERO, 1.0, 60.0));
        e.parent = Some(owner);
        let id = world.scene.spawn(e);
        world.scene.get_mut(owner).unwrap().children.push(id);
        id
    }

    #[test]
    fn closed_interval_overlap() {
        let size = Vec2::splat(10.0);
        assert!(boxes_overlap(Vec2::ZERO, size, Vec2::new(10.0, 10.0), size));
        assert!(!boxes_overlap(Vec2::ZERO, size, Vec2::new(10.1, 0.0), size));
        // Containment either way.
        assert!(boxes_overlap(Vec2::ZERO, Vec2::splat(100.0), Vec2::new(40.0, 40.0), size));
        assert!(boxes_overlap(Vec2::new(40.0, 40.0), size, Vec2::ZERO, Vec2::splat(100.0)));
    }

    #[test]
    fn friendly_fire_is_suppressed_and_foes_are_hit_once() {
        let mut world = test_support::world();
        let hero = actor(&mut world, Allegiance::Hero, 0.0);
        let attack = hitbox(&mut world, hero, HitboxMode::Damage, Vec2::new(100.0, 100.0), Vec2::new(100.0, 40.0));
        let friend_a = actor(&mut world, Allegiance::Hero, 110.0);
        let friend_b = actor(&mut world, Allegiance::Hero, 150.0);
        let foe_a = actor(&mut world, Allegiance::Enemy, 110.0);
        let foe_b = actor(&mut world, Allegiance::Enemy, 150.0);

        for _ in 0..3 {
            resolve(&mut world);
            // Invulnerability would hide a second hit; clear it to prove the hit-set holds.
            for id in [foe_a, foe_b] {
                world.scene.get_mut(id).unwrap().invulnerable = 0.0;
            }
        }

        assert_eq!(world.scene.get(friend_a).unwrap().health, 5.0);
        assert_eq!(world.scene.get(friend_b).unwrap().health, 5.0);
        assert_eq!(world.scene.get(foe_a).unwrap().health, 4.0);
        assert_eq!(world.scene.get(foe_b).unwrap().health, 4.0);
        assert_eq!(world.scene.get(attack).unwrap().hitbox.as_ref().unwrap().hit_count(), 2);
    }

    #[test]
    fn block_child_suppresses_damage() {
        let mut world = test_support::world();
        let hero = actor(&mut world, Allegiance::Hero, 0.0);
        hitbox(&mut world, hero, HitboxMode::Damage, Vec2::new(100.0, 100.0), Vec2::new(30.0, 40.0));
        let foe = actor(&mut world, Allegiance::Enemy, 110.0);
        hitbox(&mut world, foe, HitboxMode::Block, Vec2::new(105.0, 100.0), Vec2::new(10.0, 40.0));

        resolve(&mut world);
        assert_eq!(world.scene.get(foe).unwrap().health, 5.0);
        assert!(world.events.iter().any(|e| e.kind == GameEvent::BLOCKED));
    }

    #[test]
    fn owner_is_never_hit_by_its_own_hitbox() {
        let mut world = test_support::world();
        let foe = actor(&mut world, Allegiance::Enemy, 100.0);
        hitbox(&mut world, foe, HitboxMode::Damage, Vec2::new(100.0, 100.0), Vec2::new(40.0, 40.0));
        assert!(collect_contacts(&world.scene).is_empty());
    }

    #[test]
    fn trigger_marks_owner_once() {
        let mut world = test_support::world();
        let switch = actor(&mut world, Allegiance::Neutral, 0.0);
        hitbox(&mut world, switch, HitboxMode::Trigger, Vec2::new(100.0, 100.0), Vec2::new(40.0, 40.0));
        actor(&mut world, Allegiance::Hero, 110.0);

        resolve(&mut world);
        resolve(&mut world);
        assert_eq!(
            world.scene.get(switch).unwrap().attribute("triggered"),
            Some(Value::Bool(true))
        );
        assert_eq!(world.events.iter().filter(|e| e.kind == GameEvent::TRIGGER).count(), 1);
    }

    #[test]
    fn split_hitbox_divides_enemy() {
        let mut world = test_support::world();
        let hero = actor(&mut world, Allegiance::Hero, 0.0);
        hitbox(&mut world, hero, HitboxMode::Split, Vec2::new(200.0, 100.0), Vec2::new(40.0, 40.0));
        let blob = world.spawn_object("Blob", Vec2::new(210.0, 100.0), 0).unwrap();

        resolve(&mut world);
        assert!(!world.scene.contains(blob));
        let clones: Vec<&Entity> = world.scene.iter().filter(|e| e.name == "Blob").collect();
        assert_eq!(clones.len(), 2);
        for c in &clones {
            assert_eq!(c.division_iteration, 1);
            assert_eq!(c.max_health, 2.0);
            assert!(c.invulnerable > 0.0);
        }
        assert_ne!(clones[0].invulnerable, clones[1].invulnerable);

        // Freshly split clones are invulnerable, so the same hitbox cannot re-split them.
        resolve(&mut world);
        assert_eq!(world.scene.iter().filter(|e| e.name == "Blob").count(), 2);
    }

    #[test]
    fn splitting_stops_at_the_iteration_cap() {
        let mut world = test_support::world();
        let blob = world.spawn_object("Blob", Vec2::new(210.0, 100.0), 0).unwrap();
        world.scene.get_mut(blob).unwrap().division_iteration = world.config.max_division_iterations;
        assert_eq!(split(&mut world, blob), 0);
        assert!(!world.scene.contains(blob));
        assert_eq!(world.scene.iter().filter(|e| e.name == "Blob").count(), 0);
    }

    #[test]
    fn same_allegiance_cannot_split() {
        let mut world = test_support::world();
        let blob = world.spawn_object("Blob", Vec2::new(210.0, 100.0), 0).unwrap();
        let ally = actor(&mut world, Allegiance::Enemy, 0.0);
        hitbox(&mut world, ally, HitboxMode::Split, Vec2::new(200.0, 100.0), Vec2::new(40.0, 40.0));
        resolve(&mut world);
        assert!(world.scene.contains(blob));
    }
}
