//! Point-vs-tilemap collision queries.

use glam::Vec2;
use log::info;

use crate::assets::manifest::{DataError, LevelData, TileDef};
use crate::components::tilemap::TileLayer;
use crate::core::geometry::{self, TileShape};

/// The collidable layers of the loaded level plus the tile shape table.
#[derive(Debug, Clone, Default)]
pub struct CollisionWorld {
    pub tile_size: f32,
    layers: Vec<TileLayer>,
    /// Collision shape per tile id. None means the tile never collides.
    shapes: Vec<Option<TileShape>>,
}

impl CollisionWorld {
    pub fn new(tile_size: f32, shapes: Vec<Option<TileShape>>) -> Self {
        Self {
            tile_size,
            layers: Vec::new(),
            shapes,
        }
    }

    /// Build the layers of a level, checking every tile id against the table.
    pub fn from_level(level: &LevelData, tiles: &[TileDef], tile_size: f32) -> Result<Self, DataError> {
        let shapes = tiles.iter().map(|t| t.shape).collect();
        let mut world = Self::new(tile_size, shapes);
        for data in &level.layers {
            let layer = TileLayer::from_data(data, tile_size)?;
            if let Some(tile_id) = layer.tile_ids().find(|&id| id as usize >= tiles.len()) {
                return Err(DataError::UnknownTile {
                    layer: layer.id,
                    tile_id,
                });
            }
            world.add_layer(layer);
        }
        info!("level {:?}: {} collision layers", level.name, world.layers.len());
        Ok(world)
    }

    pub fn add_layer(&mut self, layer: TileLayer) {
        self.layers.push(layer);
    }

    pub fn layer(&self, id: u32) -> Option<&TileLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layers(&self) -> std::slice::Iter<'_, TileLayer> {
        self.layers.iter()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Shape for a tile id; ids outside the table never collide.
    pub fn shape(&self, tile_id: u16) -> Option<TileShape> {
        self.shapes.get(tile_id as usize).copied().flatten()
    }

    /// Whether a world point is inside solid geometry on the given layer.
    ///
    /// Cells outside a non-looping layer count as solid, so nothing can fall
    /// out of the map. A layer id with no tiles has nothing to collide with.
    pub fn point_collides(&self, point: Vec2, layer_id: u32) -> bool {
        let Some(layer) = self.layer(layer_id) else {
            return false;
        };
        let Some((tx, ty)) = layer.world_to_tile(point) else {
            return true;
        };
        let Some(cell) = layer.get(tx, ty) else {
            return true;
        };
        let Some(shape) = self.shape(cell.tile_id) else {
            return false;
        };
        let t = layer.tile_size;
        geometry::is_solid_at(
            point.x.rem_euclid(t),
            point.y.rem_euclid(t),
            shape,
            cell.flip,
            cell.rotation,
            t,
        )
    }
}
