//! Tile layers.
//!
//! A layer is a grid of tile ids plus parallel flip/rotation/palette grids.
//! Collision against a layer is resolved by `core::collision`; this module only
//! owns the storage and the world <-> grid conversions.

use glam::Vec2;

use crate::assets::manifest::{DataError, LayerData};
use crate::core::geometry::{Flip, Rotation};

/// Everything stored for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileCell {
    /// Index into the tile table.
    pub tile_id: u16,
    pub flip: Flip,
    pub rotation: Rotation,
    pub palette: u16,
}

/// One collidable grid slice of a level.
///
/// Cells are stored in row-major order: index = y * width + x.
/// Immutable once loaded.
#[derive(Debug, Clone)]
pub struct TileLayer {
    /// Depth key. Entities collide against the layer whose id matches theirs.
    pub id: u32,
    /// Width of the layer in tiles.
    pub width: u32,
    /// Height of the layer in tiles.
    pub height: u32,
    /// Size of each tile in world units.
    pub tile_size: f32,
    /// Camera-offset scaling factor.
    pub parallax: f32,
    /// Wrap horizontally.
    pub loop_x: bool,
    /// Wrap vertically.
    pub loop_y: bool,
    cells: Vec<TileCell>,
}

impl TileLayer {
    /// Create a layer filled with tile id 0.
    pub fn new(id: u32, width: u32, height: u32, tile_size: f32) -> Self {
        let count = (width * height) as usize;
        Self {
            id,
            width,
            height,
            tile_size,
            parallax: 1.0,
            loop_x: false,
            loop_y: false,
            cells: vec![TileCell::default(); count],
        }
    }

    /// Build a layer from its pre-parsed grid bundle.
    ///
    /// All four grids must have the same shape as `tiles`, and every row the
    /// same length.
    pub fn from_data(data: &LayerData, tile_size: f32) -> Result<Self, DataError> {
        let height = data.tiles.len();
        let width = data.tiles.first().map_or(0, |row| row.len());

        check_grid("tiles", &data.tiles, width, height, data.depth)?;
        check_grid("flips", &data.flips, width, height, data.depth)?;
        check_grid("rotations", &data.rotations, width, height, data.depth)?;
        if !data.palettes.is_empty() {
            check_grid("palettes", &data.palettes, width, height, data.depth)?;
        }

        let mut layer = Self::new(data.depth, width as u32, height as u32, tile_size)
            .with_parallax(data.parallax)
            .with_loop(data.loop_x, data.loop_y);

        for y in 0..height {
            for x in 0..width {
                let flip_code = data.flips[y][x];
                let rotation_code = data.rotations[y][x];
                let flip = Flip::from_u8(flip_code).ok_or(DataError::BadFlip {
                    layer: data.depth,
                    code: flip_code,
                })?;
                let rotation = Rotation::from_u8(rotation_code).ok_or(DataError::BadRotation {
                    layer: data.depth,
                    code: rotation_code,
                })?;
                let palette = data.palettes.get(y).and_then(|row| row.get(x)).copied().unwrap_or(0);
                layer.set(
                    x as u32,
                    y as u32,
                    TileCell {
                        tile_id: data.tiles[y][x],
                        flip,
                        rotation,
                        palette,
                    },
                );
            }
        }
        Ok(layer)
    }

    pub fn with_parallax(mut self, parallax: f32) -> Self {
        self.parallax = parallax;
        self
    }

    pub fn with_loop(mut self, loop_x: bool, loop_y: bool) -> Self {
        self.loop_x = loop_x;
        self.loop_y = loop_y;
        self
    }

    /// Get the cell at grid position (x, y).
    pub fn get(&self, x: u32, y: u32) -> Option<&TileCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize)
    }

    /// Set the cell at grid position (x, y). Out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, cell: TileCell) {
        if x < self.width && y < self.height {
            self.cells[(y * self.width + x) as usize] = cell;
        }
    }

    /// Pixel width of the layer.
    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    /// Pixel height of the layer.
    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    /// Grid index of the tile under a world position, applying the loop flags.
    ///
    /// Returns None when the (possibly wrapped) index falls outside the grid.
    pub fn world_to_tile(&self, world_pos: Vec2) -> Option<(u32, u32)> {
        let tx = (world_pos.x / self.tile_size).floor() as i64;
        let ty = (world_pos.y / self.tile_size).floor() as i64;
        let tx = wrap_axis(tx, self.width, self.loop_x)?;
        let ty = wrap_axis(ty, self.height, self.loop_y)?;
        Some((tx, ty))
    }

    /// Tile id of every cell in row-major order, repeats included.
    pub fn tile_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.cells.iter().map(|c| c.tile_id)
    }
}

fn wrap_axis(index: i64, extent: u32, looping: bool) -> Option<u32> {
    let index = if looping && extent > 0 {
        index.rem_euclid(extent as i64)
    } else {
        index
    };
    if index < 0 || index >= extent as i64 {
        None
    } else {
        Some(index as u32)
    }
}

fn check_grid<T>(
    grid: &'static str,
    rows: &[Vec<T>],
    width: usize,
    height: usize,
    layer: u32,
) -> Result<(), DataError> {
    if rows.len() != height {
        return Err(DataError::GridShape {
            layer,
            grid,
            expected: (width, height),
            found: (rows.first().map_or(0, |r| r.len()), rows.len()),
        });
    }
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(DataError::RaggedRow {
            layer,
            grid,
            row,
            expected: width,
            found: r.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(id: u16) -> TileCell {
        TileCell {
            tile_id: id,
            ..TileCell::default()
        }
    }

    #[test]
    fn new_layer_is_empty() {
        let layer = TileLayer::new(0, 10, 10, 32.0);
        assert!(layer.tile_ids().all(|id| id == 0));
        assert_eq!(layer.tile_ids().count(), 100);
        assert_eq!(layer.pixel_width(), 320.0);
    }

    #[test]
    fn set_and_get_cell() {
        let mut layer = TileLayer::new(0, 5, 5, 16.0);
        layer.set(2, 3, solid(7));
        layer.set(10, 10, solid(7));
        assert_eq!(layer.get(2, 3).unwrap().tile_id, 7);
        assert_eq!(layer.tile_ids().filter(|&id| id == 7).count(), 1);
        assert!(layer.get(10, 10).is_none());
    }

    #[test]
    fn world_to_tile_floors_negative_coordinates() {
        let layer = TileLayer::new(0, 4, 4, 10.0);
        assert_eq!(layer.world_to_tile(Vec2::new(15.0, 39.9)), Some((1, 3)));
        assert_eq!(layer.world_to_tile(Vec2::new(-0.5, 5.0)), None);
        assert_eq!(layer.world_to_tile(Vec2::new(40.0, 5.0)), None);
    }

    #[test]
    fn looping_layer_wraps_each_axis_independently() {
        let layer = TileLayer::new(0, 4, 4, 10.0).with_loop(true, false);
        assert_eq!(layer.world_to_tile(Vec2::new(-0.5, 5.0)), Some((3, 0)));
        assert_eq!(layer.world_to_tile(Vec2::new(45.0, 5.0)), Some((0, 0)));
        assert_eq!(layer.world_to_tile(Vec2::new(5.0, 45.0)), None);
    }

    #[test]
    fn from_data_reads_parallel_grids() {
        let data = LayerData {
            tiles: vec![vec![0, 1], vec![2, 0]],
            flips: vec![vec![0, 1], vec![0, 3]],
            rotations: vec![vec![0, 0], vec![2, 0]],
            palettes: vec![],
            depth: 4,
            parallax: 0.5,
            loop_x: true,
            loop_y: false,
        };
        let layer = TileLayer::from_data(&data, 16.0).unwrap();
        assert_eq!(layer.id, 4);
        assert_eq!((layer.width, layer.height), (2, 2));
        assert_eq!(layer.get(1, 0).unwrap().flip, Flip::Horizontal);
        assert_eq!(layer.get(0, 1).unwrap().rotation, Rotation::R180);
        assert_eq!(layer.get(0, 1).unwrap().tile_id, 2);
        assert!(layer.loop_x);
        assert_eq!(layer.parallax, 0.5);
    }

    #[test]
    fn from_data_rejects_ragged_rows() {
        let data = LayerData {
            tiles: vec![vec![0, 1], vec![2]],
            flips: vec![vec![0, 0], vec![0, 0]],
            rotations: vec![vec![0, 0], vec![0, 0]],
            palettes: vec![],
            depth: 0,
            parallax: 1.0,
            loop_x: false,
            loop_y: false,
        };
        assert!(matches!(
            TileLayer::from_data(&data, 16.0),
            Err(DataError::RaggedRow { grid: "tiles", row: 1, .. })
        ));
    }

    #[test]
    fn from_data_rejects_bad_flip_code() {
        let data = LayerData {
            tiles: vec![vec![1]],
            flips: vec![vec![9]],
            rotations: vec![vec![0]],
            palettes: vec![],
            depth: 2,
            parallax: 1.0,
            loop_x: false,
            loop_y: false,
        };
        assert!(matches!(
            TileLayer::from_data(&data, 16.0),
            Err(DataError::BadFlip { layer: 2, code: 9 })
        ));
    }
}
