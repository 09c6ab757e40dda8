use std::collections::HashSet;

use glam::Vec2;
use log::info;

use crate::api::types::EntityId;
use crate::components::tilemap::TileLayer;
use crate::core::scene::Scene;

/// Side-scrolling camera.
///
/// `pos` is the top-left corner of the view in world units. The camera centers
/// on its focus entity, stays put while any lock is held, and never pans past
/// the edge of a non-looping layer.
#[derive(Debug, Clone)]
pub struct Camera {
    pub pos: Vec2,
    /// Position before the latest update, for interpolation.
    pub last_pos: Vec2,
    /// Visible area in world units.
    pub view_size: Vec2,
    /// World point kept at the center of the view.
    pub focus_point: Vec2,
    /// Parallax offset of the focus entity's layer (parallax - 1).
    pub depth: f32,
    focus: Option<EntityId>,
    locks: HashSet<EntityId>,
}

impl Camera {
    pub fn new(view_size: Vec2) -> Self {
        Self {
            pos: Vec2::ZERO,
            last_pos: Vec2::ZERO,
            view_size,
            focus_point: view_size / 2.0,
            depth: 0.0,
            focus: None,
            locks: HashSet::new(),
        }
    }

    pub fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Option<EntityId>) {
        if self.focus != focus {
            info!("camera focus {:?} -> {:?}", self.focus, focus);
            self.focus = focus;
        }
    }

    /// Freeze panning until `holder` releases its lock.
    pub fn lock(&mut self, holder: EntityId) {
        self.locks.insert(holder);
    }

    pub fn unlock(&mut self, holder: EntityId) {
        self.locks.remove(&holder);
    }

    pub fn is_locked(&self) -> bool {
        !self.locks.is_empty()
    }

    /// Drop every reference to a deleted entity.
    pub fn forget(&mut self, id: EntityId) {
        if self.focus == Some(id) {
            self.set_focus(None);
        }
        self.locks.remove(&id);
    }

    /// Follow the focus and clamp against the given layers.
    pub fn update<'a>(&mut self, scene: &Scene, layers: impl IntoIterator<Item = &'a TileLayer> + Clone) {
        self.last_pos = self.pos;

        if let Some(target) = self.focus.and_then(|id| scene.get(id)) {
            self.focus_point = target.center();
            let layer_id = target.layer;
            self.depth = layers
                .clone()
                .into_iter()
                .find(|l| l.id == layer_id)
                .map_or(0.0, |l| l.parallax - 1.0);
        }

        if self.locks.is_empty() {
            self.pos = self.focus_point - self.view_size / 2.0;
        }

        for layer in layers {
            self.clamp_to(layer);
        }
    }

    /// Keep the view inside a non-looping layer, scaled by its parallax.
    fn clamp_to(&mut self, layer: &TileLayer) {
        let scale = layer.parallax - self.depth;
        if scale <= 0.0 {
            return;
        }
        if !layer.loop_x {
            if self.pos.x * scale < 0.0 {
                self.pos.x = 0.0;
            } else if (self.pos.x + self.view_size.x) * scale > layer.pixel_width() {
                self.pos.x = layer.pixel_width() - self.view_size.x;
            }
        }
        if !layer.loop_y {
            if self.pos.y * scale < 0.0 {
                self.pos.y = 0.0;
            } else if (self.pos.y + self.view_size.y) * scale > layer.pixel_height() {
                self.pos.y = layer.pixel_height() - self.view_size.y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entity::{Entity, EntityKind};

    fn scene_with_hero(pos: Vec2) -> (Scene, EntityId) {
        let mut scene = Scene::new();
        let id = scene.spawn(
            Entity::new("hero", EntityKind::Player)
                .with_pos(pos)
                .with_size(Vec2::new(20.0, 20.0)),
        );
        (scene, id)
    }

    #[test]
    fn centers_on_focus() {
        let (scene, id) = scene_with_hero(Vec2::new(490.0, 290.0));
        let layer = TileLayer::new(0, 100, 100, 10.0);
        let mut cam = Camera::new(Vec2::new(200.0, 100.0));
        cam.set_focus(Some(id));
        cam.update(&scene, [&layer]);
        assert_eq!(cam.pos, Vec2::new(400.0, 250.0));
    }

    #[test]
    fn clamps_at_layer_edges() {
        let (scene, id) = scene_with_hero(Vec2::new(0.0, 990.0));
        let layer = TileLayer::new(0, 100, 100, 10.0);
        let mut cam = Camera::new(Vec2::new(200.0, 100.0));
        cam.set_focus(Some(id));
        cam.update(&scene, [&layer]);
        assert_eq!(cam.pos, Vec2::new(0.0, 900.0));
    }

    #[test]
    fn looping_axis_is_not_clamped() {
        let (scene, id) = scene_with_hero(Vec2::new(0.0, 500.0));
        let layer = TileLayer::new(0, 100, 100, 10.0).with_loop(true, false);
        let mut cam = Camera::new(Vec2::new(200.0, 100.0));
        cam.set_focus(Some(id));
        cam.update(&scene, [&layer]);
        assert_eq!(cam.pos.x, -90.0);
    }

    #[test]
    fn locks_freeze_panning() {
        let (mut scene, id) = scene_with_hero(Vec2::new(490.0, 290.0));
        let layer = TileLayer::new(0, 100, 100, 10.0);
        let mut cam = Camera::new(Vec2::new(200.0, 100.0));
        cam.set_focus(Some(id));
        cam.update(&scene, [&layer]);
        cam.lock(id);
        scene.get_mut(id).unwrap().pos.x += 100.0;
        cam.update(&scene, [&layer]);
        assert_eq!(cam.pos.x, 400.0);

        cam.unlock(id);
        cam.update(&scene, [&layer]);
        assert_eq!(cam.pos.x, 500.0);
    }

    #[test]
    fn forget_clears_focus_and_locks() {
        let mut cam = Camera::new(Vec2::new(200.0, 100.0));
        let id = EntityId::new(1, 0);
        cam.set_focus(Some(id));
        cam.lock(id);
        cam.forget(id);
        assert_eq!(cam.focus(), None);
        assert!(!cam.is_locked());
    }
}
