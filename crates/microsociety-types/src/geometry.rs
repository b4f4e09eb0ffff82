//! Continuous positions and discrete tile coordinates.

use serde::{Deserialize, Serialize};

/// A continuous position in world units (pixels in a rendered view).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Integer tile bucket along each axis, `floor(coord / tile_size)`.
    ///
    /// Negative positions produce negative buckets; callers that need a grid
    /// coordinate go through `TileCoord::from_bucket`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn bucket(self, tile_size: f64) -> (i32, i32) {
        if tile_size <= 0.0 {
            return (0, 0);
        }
        (
            (self.x / tile_size).floor() as i32,
            (self.y / tile_size).floor() as i32,
        )
    }
}

/// A tile coordinate on the grid (column `x`, row `y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl TileCoord {
    /// Create a tile coordinate.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Convert a signed bucket into a coordinate, rejecting negatives.
    pub fn from_bucket(bucket: (i32, i32)) -> Option<Self> {
        let x = u32::try_from(bucket.0).ok()?;
        let y = u32::try_from(bucket.1).ok()?;
        Some(Self { x, y })
    }

    /// Manhattan distance between two tiles.
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// The position of this tile's centre for the given tile size.
    pub fn center(self, tile_size: f64) -> Position {
        Position {
            x: (f64::from(self.x) + 0.5) * tile_size,
            y: (f64::from(self.y) + 0.5) * tile_size,
        }
    }
}

impl core::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
