//! The tile grid and the accessor trait the decision core consumes.
//!
//! [`TileAccess`] is the narrow seam between the core and whatever owns the
//! map: it answers "what object is on this tile" and performs the single
//! structural mutation (removing a harvested resource). [`TileGrid`] is the
//! in-memory implementation used by the simulation and the tests.

use microsociety_types::{ObjectKind, Position, TileCoord};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Read access to tile objects plus the single removal operation.
pub trait TileAccess {
    /// Grid size in tiles as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Edge length of one tile in world units.
    fn tile_size(&self) -> f64;

    /// The object on the tile, or `None` if the tile is empty or outside
    /// the grid.
    fn object_at(&self, coord: TileCoord) -> Option<ObjectKind>;

    /// Remove the resource object on the tile and return its kind.
    ///
    /// Fails on empty tiles, out-of-bounds coordinates, and permanent
    /// structures. A successful removal happens exactly once per object.
    fn remove_object(&mut self, coord: TileCoord) -> Result<ObjectKind, WorldError>;

    /// Whether the tile holds an object.
    fn has_object(&self, coord: TileCoord) -> bool {
        self.object_at(coord).is_some()
    }

    /// Map a continuous position to the tile containing it.
    ///
    /// Returns `None` for positions outside the grid.
    fn tile_at(&self, position: Position) -> Option<TileCoord> {
        let coord = TileCoord::from_bucket(position.bucket(self.tile_size()))?;
        let (width, height) = self.dimensions();
        (coord.x < width && coord.y < height).then_some(coord)
    }
}

/// A rectangular grid of tiles stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Width in tiles.
    width: u32,
    /// Height in tiles.
    height: u32,
    /// Edge length of one tile in world units.
    tile_size: f64,
    /// Row-major tile contents.
    tiles: Vec<Option<ObjectKind>>,
}

impl TileGrid {
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either dimension is zero,
    /// the tile size is not positive, or the tile count overflows.
    pub fn new(width: u32, height: u32, tile_size: f64) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions {
                width,
                height,
                reason: "grid must have at least one tile",
            });
        }
        if tile_size.is_nan() || tile_size <= 0.0 {
            return Err(WorldError::InvalidDimensions {
                width,
                height,
                reason: "tile size must be positive",
            });
        }
        let count = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .ok_or(WorldError::InvalidDimensions {
                width,
                height,
                reason: "tile count overflows",
            })?;
        Ok(Self {
            width,
            height,
            tile_size,
            tiles: vec![None; count],
        })
    }

    /// Row-major index of a coordinate, or `None` when out of bounds.
    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        let row = usize::try_from(coord.y).ok()?;
        let col = usize::try_from(coord.x).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(col)
    }

    const fn out_of_bounds(&self, coord: TileCoord) -> WorldError {
        WorldError::OutOfBounds {
            coord,
            width: self.width,
            height: self.height,
        }
    }

    /// Place an object on an empty tile.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] or [`WorldError::Occupied`].
    pub fn place_object(&mut self, coord: TileCoord, kind: ObjectKind) -> Result<(), WorldError> {
        let idx = self.index(coord).ok_or_else(|| self.out_of_bounds(coord))?;
        let slot = self
            .tiles
            .get_mut(idx)
            .ok_or(WorldError::OutOfBounds {
                coord,
                width: self.width,
                height: self.height,
            })?;
        if let Some(existing) = *slot {
            return Err(WorldError::Occupied { coord, existing });
        }
        *slot = Some(kind);
        Ok(())
    }

    /// Iterate over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| TileCoord::new(x, y)))
    }

    /// Find the tile holding `kind` closest to `from` by Manhattan distance.
    ///
    /// Ties are broken by row-major order, so the result is deterministic.
    pub fn find_nearest(&self, from: TileCoord, kind: ObjectKind) -> Option<TileCoord> {
        self.coords()
            .filter(|coord| self.object_at(*coord) == Some(kind))
            .min_by_key(|coord| (from.manhattan_distance(*coord), coord.y, coord.x))
    }

    /// Count the tiles holding `kind` across the whole grid.
    pub fn count_objects(&self, kind: ObjectKind) -> usize {
        self.tiles.iter().filter(|slot| **slot == Some(kind)).count()
    }

    /// Coordinates of every empty tile, in row-major order.
    pub fn empty_tiles(&self) -> Vec<TileCoord> {
        self.coords().filter(|coord| !self.has_object(*coord)).collect()
    }
}

impl TileAccess for TileGrid {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn tile_size(&self) -> f64 {
        self.tile_size
    }

    fn object_at(&self, coord: TileCoord) -> Option<ObjectKind> {
        self.index(coord)
            .and_then(|idx| self.tiles.get(idx))
            .copied()
            .flatten()
    }

    fn remove_object(&mut self, coord: TileCoord) -> Result<ObjectKind, WorldError> {
        let idx = self.index(coord).ok_or_else(|| self.out_of_bounds(coord))?;
        let (width, height) = (self.width, self.height);
        let slot = self.tiles.get_mut(idx).ok_or(WorldError::OutOfBounds {
            coord,
            width,
            height,
        })?;
        match *slot {
            None => Err(WorldError::NoObject { coord }),
            Some(kind) if kind.is_structure() => {
                Err(WorldError::PermanentStructure { coord, kind })
            }
            Some(kind) => {
                *slot = None;
                Ok(kind)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        TileGrid::new(5, 4, 32.0).unwrap()
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(TileGrid::new(0, 4, 32.0).is_err());
        assert!(TileGrid::new(4, 0, 32.0).is_err());
        assert!(TileGrid::new(4, 4, 0.0).is_err());
    }

    #[test]
    fn new_grid_is_empty() {
        let g = grid();
        assert_eq!(g.dimensions(), (5, 4));
        assert_eq!(g.empty_tiles().len(), 20);
    }

    #[test]
    fn place_and_query() {
        let mut g = grid();
        g.place_object(TileCoord::new(2, 3), ObjectKind::Tree).unwrap();
        assert_eq!(g.object_at(TileCoord::new(2, 3)), Some(ObjectKind::Tree));
        assert!(g.has_object(TileCoord::new(2, 3)));
        assert!(!g.has_object(TileCoord::new(3, 2)));
    }

    #[test]
    fn place_on_occupied_tile_fails() {
        let mut g = grid();
        g.place_object(TileCoord::new(1, 1), ObjectKind::Rock).unwrap();
        let err = g.place_object(TileCoord::new(1, 1), ObjectKind::Bush);
        assert_eq!(
            err,
            Err(WorldError::Occupied {
                coord: TileCoord::new(1, 1),
                existing: ObjectKind::Rock,
            })
        );
    }

    #[test]
    fn out_of_bounds_is_empty_and_unplaceable() {
        let mut g = grid();
        assert_eq!(g.object_at(TileCoord::new(5, 0)), None);
        assert!(g.place_object(TileCoord::new(0, 4), ObjectKind::Tree).is_err());
    }

    #[test]
    fn remove_resource_happens_once() {
        let mut g = grid();
        let coord = TileCoord::new(0, 0);
        g.place_object(coord, ObjectKind::Bush).unwrap();
        assert_eq!(g.remove_object(coord), Ok(ObjectKind::Bush));
        assert_eq!(g.remove_object(coord), Err(WorldError::NoObject { coord }));
    }

    #[test]
    fn structures_cannot_be_removed() {
        let mut g = grid();
        let coord = TileCoord::new(4, 3);
        g.place_object(coord, ObjectKind::House).unwrap();
        assert!(g.remove_object(coord).is_err());
        assert_eq!(g.object_at(coord), Some(ObjectKind::House));
    }

    #[test]
    fn tile_at_maps_positions() {
        let g = grid();
        assert_eq!(
            g.tile_at(Position::new(70.0, 40.0)),
            Some(TileCoord::new(2, 1))
        );
        assert_eq!(g.tile_at(Position::new(-1.0, 0.0)), None);
        assert_eq!(g.tile_at(Position::new(5.0 * 32.0, 0.0)), None);
    }

    #[test]
    fn find_nearest_prefers_distance_then_row_major() {
        let mut g = grid();
        g.place_object(TileCoord::new(4, 0), ObjectKind::Tree).unwrap();
        g.place_object(TileCoord::new(0, 2), ObjectKind::Tree).unwrap();
        g.place_object(TileCoord::new(2, 0), ObjectKind::Tree).unwrap();
        // From (2, 2): (2, 0) and (0, 2) are both at distance 2; row 0 wins.
        assert_eq!(
            g.find_nearest(TileCoord::new(2, 2), ObjectKind::Tree),
            Some(TileCoord::new(2, 0))
        );
        assert_eq!(g.find_nearest(TileCoord::new(2, 2), ObjectKind::Rock), None);
    }

    #[test]
    fn count_objects_by_kind() {
        let mut g = grid();
        g.place_object(TileCoord::new(0, 0), ObjectKind::Rock).unwrap();
        g.place_object(TileCoord::new(1, 0), ObjectKind::Rock).unwrap();
        g.place_object(TileCoord::new(2, 0), ObjectKind::Tree).unwrap();
        assert_eq!(g.count_objects(ObjectKind::Rock), 2);
        assert_eq!(g.count_objects(ObjectKind::Tree), 1);
        assert_eq!(g.count_objects(ObjectKind::Market), 0);
    }
}
