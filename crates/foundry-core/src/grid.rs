//! Grid geometry: tile coordinates, facing directions, and the pixel space
//! that loose items move through.
//!
//! A tile `(gx, gy)` covers the half-open pixel square
//! `[gx * T, (gx + 1) * T) x [gy * T, (gy + 1) * T)` where `T` is the tile
//! size. Items snap to tile centres when spawned.

use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GridPosition
// ---------------------------------------------------------------------------

/// A position on the 2D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring tile `steps` tiles away in `direction`.
    pub fn step(self, direction: Direction, steps: i32) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx * steps, self.y + dy * steps)
    }

    /// Pixel coordinates of this tile's centre.
    pub fn center(self, tile_size: Fixed64) -> PixelPosition {
        let half = tile_size / Fixed64::from_num(2);
        PixelPosition {
            x: Fixed64::from_num(self.x) * tile_size + half,
            y: Fixed64::from_num(self.y) * tile_size + half,
        }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Cardinal facing. Discriminants are quarter turns clockwise from East,
/// with +Y pointing down the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl Direction {
    /// All four cardinal directions in rotation order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::East,
            Direction::South,
            Direction::West,
            Direction::North,
        ]
    }

    /// Build from a rotation index. Wraps modulo 4.
    pub fn from_rotation(rotation: u8) -> Self {
        Self::all()[(rotation % 4) as usize]
    }

    /// Quarter turns clockwise from East.
    pub fn rotation(self) -> u8 {
        self as u8
    }

    /// Rotate by `quarter_turns` clockwise.
    pub fn rotated(self, quarter_turns: u8) -> Self {
        Self::from_rotation(self.rotation() + quarter_turns % 4)
    }

    /// Rotate 90 degrees clockwise.
    pub fn rotate_cw(self) -> Self {
        self.rotated(1)
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Self {
        self.rotated(2)
    }

    /// Grid offset of one step in this direction.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::North => (0, -1),
        }
    }

    /// Whether travel in this direction is along the X axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }
}

// ---------------------------------------------------------------------------
// PixelPosition
// ---------------------------------------------------------------------------

/// A continuous position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPosition {
    pub x: Fixed64,
    pub y: Fixed64,
}

impl PixelPosition {
    pub fn new(x: Fixed64, y: Fixed64) -> Self {
        Self { x, y }
    }

    /// The tile containing this position (floor division).
    pub fn tile(self, tile_size: Fixed64) -> GridPosition {
        GridPosition::new(
            (self.x / tile_size).floor().to_num::<i32>(),
            (self.y / tile_size).floor().to_num::<i32>(),
        )
    }

    /// Squared Euclidean distance. Avoids a square root in hot loops.
    /// Saturates at `Fixed64::MAX` for points more than about 46,000 px
    /// apart.
    pub fn distance_squared(self, other: PixelPosition) -> Fixed64 {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// True iff the Euclidean distance to `other` is strictly below `radius`.
    pub fn within(self, other: PixelPosition, radius: Fixed64) -> bool {
        let dx = self.x.saturating_sub(other.x).saturating_abs();
        let dy = self.y.saturating_sub(other.y).saturating_abs();
        if dx >= radius || dy >= radius {
            return false;
        }
        self.distance_squared(other) < radius.saturating_mul(radius)
    }
}
