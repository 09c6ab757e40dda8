use crate::api::types::EntityId;
use crate::components::entity::Entity;

struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Entity registry backed by a generational arena.
///
/// Handles stay valid across spawns and deletes: a deleted slot is reused with
/// a bumped generation, so stale handles simply stop resolving.
/// Designed for small-to-medium entity counts (hundreds, not millions).
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a scene with a specific entity capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Add an entity to the scene and assign its handle.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                EntityId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entity: None,
                });
                EntityId::new(self.slots.len() as u32 - 1, 0)
            }
        };
        entity.id = id;
        self.slots[id.index as usize].entity = Some(entity);
        self.live += 1;
        id
    }

    /// Remove an entity by handle. Removing a stale handle is a no-op.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entity = slot.entity.take()?;
        self.free.push(id.index);
        self.live -= 1;
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Handles of all live entities, in slot order.
    ///
    /// Systems iterate this snapshot and revalidate each handle, so spawns and
    /// deletes during the pass are safe.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|e| e.id).collect()
    }

    /// Iterate over all entities.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    /// Iterate over all entities mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter_map(|slot| slot.entity.as_mut())
    }

    /// Find the first entity spawned from the given object definition.
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.iter().find(|e| e.name == name)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Clear all entities. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entity.take().is_some() {
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entity::EntityKind;
    use glam::Vec2;

    fn thing() -> Entity {
        Entity::new("thing", EntityKind::Prop)
    }

    #[test]
    fn spawn_and_get() {
        let mut scene = Scene::new();
        let id = scene.spawn(thing().with_pos(Vec2::new(10.0, 20.0)));
        let e = scene.get(id).unwrap();
        assert_eq!(e.pos, Vec2::new(10.0, 20.0));
        assert_eq!(e.id, id);
    }

    #[test]
    fn despawn_is_idempotent() {
        let mut scene = Scene::new();
        let id = scene.spawn(thing());
        assert!(scene.despawn(id).is_some());
        assert!(scene.despawn(id).is_none());
        assert_eq!(scene.len(), 0);
    }

    #[test]
    fn stale_handle_does_not_resolve_after_reuse() {
        let mut scene = Scene::new();
        let old = scene.spawn(thing());
        scene.despawn(old);
        let new = scene.spawn(Entity::new("other", EntityKind::Enemy));
        assert_eq!(old.index, new.index);
        assert_ne!(old, new);
        assert!(scene.get(old).is_none());
        assert!(scene.despawn(old).is_none());
        assert_eq!(scene.get(new).unwrap().name, "other");
    }

    #[test]
    fn ids_snapshot_survives_mutation() {
        let mut scene = Scene::new();
        let a = scene.spawn(thing());
        let b = scene.spawn(thing());
        let ids = scene.ids();
        scene.despawn(a);
        scene.spawn(thing());
        let live: Vec<_> = ids.into_iter().filter(|id| scene.contains(*id)).collect();
        assert_eq!(live, vec![b]);
    }

    #[test]
    fn find_by_name() {
        let mut scene = Scene::new();
        scene.spawn(thing());
        let hero = scene.spawn(Entity::new("hero", EntityKind::Player));
        assert_eq!(scene.find_by_name("hero").unwrap().id, hero);
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut scene = Scene::new();
        let id = scene.spawn(thing());
        scene.clear();
        assert!(scene.is_empty());
        assert!(!scene.contains(id));
        let reused = scene.spawn(thing());
        assert_ne!(reused, id);
    }
}
