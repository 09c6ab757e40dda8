//! Tile collision shapes.
//!
//! Every collidable tile is one of a handful of procedurally described shapes.
//! A point inside a tile is tested in tile-local space `[0, tile_size)`, after
//! undoing the tile's flip and then its rotation.

use serde::{Deserialize, Serialize};

/// Collision shape class of a tile.
///
/// The numeric codes match the tile table's `terrain` column: 0 is reserved for
/// "no collision" and is represented as `None` by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TileShape {
    Solid = 1,
    /// Diagonal from bottom-left to top-right, solid below/right of the line.
    Ramp45 = 2,
    /// Shallow ramp covering the lower half of the rise.
    RampLow22 = 3,
    /// Shallow ramp covering the upper half of the rise.
    RampHigh22 = 4,
    /// Bottom half block.
    Slab = 5,
}

impl TileShape {
    pub const ALL: [TileShape; 5] = [
        TileShape::Solid,
        TileShape::Ramp45,
        TileShape::RampLow22,
        TileShape::RampHigh22,
        TileShape::Slab,
    ];

    /// Convert from a terrain code. Returns None for 0 (air) and unknown codes.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Solid),
            2 => Some(Self::Ramp45),
            3 => Some(Self::RampLow22),
            4 => Some(Self::RampHigh22),
            5 => Some(Self::Slab),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether a tile-local point is inside this shape.
    ///
    /// Boundaries are inclusive: a point exactly on a ramp's diagonal is solid.
    pub fn is_solid_at(self, local_x: f32, local_y: f32, tile_size: f32) -> bool {
        let half = tile_size / 2.0;
        match self {
            TileShape::Solid => true,
            TileShape::Ramp45 => local_x >= tile_size - local_y,
            TileShape::Slab => local_y >= half,
            TileShape::RampLow22 => local_x >= (tile_size - local_y) * 2.0,
            TileShape::RampHigh22 => local_x >= (tile_size - local_y - half) * 2.0,
        }
    }
}

/// Mirror code stored per tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Flip {
    #[default]
    None = 0,
    Horizontal = 1,
    Both = 2,
    Vertical = 3,
}

impl Flip {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Horizontal),
            2 => Some(Self::Both),
            3 => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Quarter-turn rotation code stored per tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Rotation {
    #[default]
    R0 = 0,
    R90 = 1,
    R180 = 2,
    R270 = 3,
}

impl Rotation {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::R0),
            1 => Some(Self::R90),
            2 => Some(Self::R180),
            3 => Some(Self::R270),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Map a tile-local point into the shape's canonical orientation.
///
/// Flip is applied first, then rotation; the two are stored independently.
pub fn to_shape_space(x: f32, y: f32, flip: Flip, rotation: Rotation, tile_size: f32) -> (f32, f32) {
    let t = tile_size;
    let (x, y) = match flip {
        Flip::None => (x, y),
        Flip::Horizontal => (t - x, y),
        Flip::Both => (t - x, t - y),
        Flip::Vertical => (x, t - y),
    };
    match rotation {
        Rotation::R0 => (x, y),
        Rotation::R90 => (t - y, x),
        Rotation::R180 => (t - x, t - y),
        Rotation::R270 => (y, t - x),
    }
}

/// Test a tile-local point against a flipped/rotated shape.
pub fn is_solid_at(
    local_x: f32,
    local_y: f32,
    shape: TileShape,
    flip: Flip,
    rotation: Rotation,
    tile_size: f32,
) -> bool {
    let (x, y) = to_shape_space(local_x, local_y, flip, rotation, tile_size);
    shape.is_solid_at(x, y, tile_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: f32 = 120.0;

    const FLIPS: [Flip; 4] = [Flip::None, Flip::Horizontal, Flip::Both, Flip::Vertical];
    const ROTATIONS: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    #[test]
    fn solid_is_solid_under_every_orientation() {
        for flip in FLIPS {
            for rotation in ROTATIONS {
                for &(x, y) in &[(0.0, 0.0), (119.9, 0.0), (0.0, 119.9), (60.0, 60.0)] {
                    assert!(is_solid_at(x, y, TileShape::Solid, flip, rotation, T));
                }
            }
        }
    }

    #[test]
    fn ramp45_diagonal_is_inclusive() {
        // localX == tileSize - localY
        assert!(TileShape::Ramp45.is_solid_at(40.0, 80.0, T));
        assert!(TileShape::Ramp45.is_solid_at(41.0, 80.0, T));
        assert!(!TileShape::Ramp45.is_solid_at(39.0, 80.0, T));
    }

    #[test]
    fn slab_is_bottom_half() {
        assert!(!TileShape::Slab.is_solid_at(10.0, 59.0, T));
        assert!(TileShape::Slab.is_solid_at(10.0, 60.0, T));
    }

    #[test]
    fn shallow_ramps_split_the_rise() {
        // Low ramp: at the bottom edge only the right half is solid.
        assert!(!TileShape::RampLow22.is_solid_at(59.0, 90.0, T));
        assert!(TileShape::RampLow22.is_solid_at(60.0, 90.0, T));
        // Nothing of the low ramp reaches the top half.
        assert!(!TileShape::RampLow22.is_solid_at(119.0, 50.0, T));

        // High ramp: the whole bottom half is solid.
        assert!(TileShape::RampHigh22.is_solid_at(0.0, 60.0, T));
        assert!(TileShape::RampHigh22.is_solid_at(60.0, 30.0, T));
        assert!(!TileShape::RampHigh22.is_solid_at(59.0, 30.0, T));
    }

    #[test]
    fn horizontal_flip_mirrors_ramp() {
        // Unflipped ramp is solid at the bottom-right, flipped at the bottom-left.
        assert!(is_solid_at(110.0, 110.0, TileShape::Ramp45, Flip::None, Rotation::R0, T));
        assert!(!is_solid_at(10.0, 60.0, TileShape::Ramp45, Flip::None, Rotation::R0, T));
        assert!(is_solid_at(10.0, 110.0, TileShape::Ramp45, Flip::Horizontal, Rotation::R0, T));
        assert!(!is_solid_at(110.0, 60.0, TileShape::Ramp45, Flip::Horizontal, Rotation::R0, T));
    }

    #[test]
    fn vertical_flip_turns_slab_into_ceiling() {
        assert!(is_solid_at(10.0, 10.0, TileShape::Slab, Flip::Vertical, Rotation::R0, T));
        assert!(!is_solid_at(10.0, 110.0, TileShape::Slab, Flip::Vertical, Rotation::R0, T));
    }

    #[test]
    fn half_turn_matches_double_flip() {
        for shape in TileShape::ALL {
            for &(x, y) in &[(5.0, 5.0), (30.0, 100.0), (100.0, 30.0), (60.0, 61.0)] {
                assert_eq!(
                    is_solid_at(x, y, shape, Flip::None, Rotation::R180, T),
                    is_solid_at(x, y, shape, Flip::Both, Rotation::R0, T),
                );
            }
        }
    }

    #[test]
    fn quarter_turn_moves_slab_to_a_side() {
        // R90 maps (x, y) -> (T - y, x): the solid half ends up on the right.
        assert!(is_solid_at(100.0, 10.0, TileShape::Slab, Flip::None, Rotation::R90, T));
        assert!(!is_solid_at(10.0, 10.0, TileShape::Slab, Flip::None, Rotation::R90, T));
        // R270 maps (x, y) -> (y, T - x): the solid half ends up on the left.
        assert!(is_solid_at(10.0, 10.0, TileShape::Slab, Flip::None, Rotation::R270, T));
        assert!(!is_solid_at(100.0, 10.0, TileShape::Slab, Flip::None, Rotation::R270, T));
    }

    #[test]
    fn round_trip_codes() {
        for shape in TileShape::ALL {
            assert_eq!(TileShape::from_u8(shape.as_u8()), Some(shape));
        }
        assert!(TileShape::from_u8(0).is_none());
        assert!(TileShape::from_u8(6).is_none());
        for v in 0..4u8 {
            assert_eq!(Flip::from_u8(v).unwrap().as_u8(), v);
            assert_eq!(Rotation::from_u8(v).unwrap().as_u8(), v);
        }
        assert!(Flip::from_u8(4).is_none());
        assert!(Rotation::from_u8(4).is_none());
    }
}
