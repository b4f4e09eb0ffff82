//! Seeded world generation and per-tick resource regrowth.
//!
//! Generation places the house and the market first, on fixed tiles along
//! the middle row, then scatters resources over the remaining tiles with
//! independent per-tile densities. Regrowth later refills empty tiles one
//! chance roll at a time.

use microsociety_types::{ObjectKind, TileCoord};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;
use crate::grid::TileGrid;

/// Inputs for [`generate_world`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Edge length of one tile in world units.
    pub tile_size: f64,
    /// Probability that a free tile receives a tree.
    pub tree_density: f64,
    /// Probability that a free tile receives a rock.
    pub rock_density: f64,
    /// Probability that a free tile receives a bush.
    pub bush_density: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            width: 25,
            height: 25,
            tile_size: 32.0,
            tree_density: 0.08,
            rock_density: 0.05,
            bush_density: 0.06,
        }
    }
}

/// A freshly generated world with the locations of its two structures.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWorld {
    /// The populated grid.
    pub grid: TileGrid,
    /// Tile holding the shared house.
    pub house: TileCoord,
    /// Tile holding the market.
    pub market: TileCoord,
}

/// Generate a world: house, market, then randomly scattered resources.
///
/// The house sits a quarter of the way across the middle row and the market
/// mirrors it from the right edge. Each remaining tile rolls once; the
/// densities are cumulative, so they should sum to at most 1.
///
/// # Errors
///
/// Returns [`WorldError::InvalidDimensions`] if the grid cannot hold two
/// distinct structure tiles.
pub fn generate_world<R: Rng + ?Sized>(
    params: &GenerationParams,
    rng: &mut R,
) -> Result<GeneratedWorld, WorldError> {
    if params.width < 2 {
        return Err(WorldError::InvalidDimensions {
            width: params.width,
            height: params.height,
            reason: "grid must be at least two tiles wide",
        });
    }
    let mut grid = TileGrid::new(params.width, params.height, params.tile_size)?;

    let quarter = params.width / 4;
    let row = params.height / 2;
    let house = TileCoord::new(quarter, row);
    let market = TileCoord::new(
        params.width.saturating_sub(1).saturating_sub(quarter),
        row,
    );
    grid.place_object(house, ObjectKind::House)?;
    grid.place_object(market, ObjectKind::Market)?;

    for coord in grid.empty_tiles() {
        if let Some(kind) = roll_resource(params, rng) {
            grid.place_object(coord, kind)?;
        }
    }

    debug!(
        width = params.width,
        height = params.height,
        trees = grid.count_objects(ObjectKind::Tree),
        rocks = grid.count_objects(ObjectKind::Rock),
        bushes = grid.count_objects(ObjectKind::Bush),
        %house,
        %market,
        "world generated"
    );

    Ok(GeneratedWorld {
        grid,
        house,
        market,
    })
}

/// Pick a resource for one tile according to the cumulative densities.
fn roll_resource<R: Rng + ?Sized>(params: &GenerationParams, rng: &mut R) -> Option<ObjectKind> {
    let roll: f64 = rng.random();
    let tree = params.tree_density;
    let rock = tree + params.rock_density;
    let bush = rock + params.bush_density;
    if roll < tree {
        Some(ObjectKind::Tree)
    } else if roll < rock {
        Some(ObjectKind::Rock)
    } else if roll < bush {
        Some(ObjectKind::Bush)
    } else {
        None
    }
}

/// Regrow resources on empty tiles.
///
/// Each empty tile regrows with probability `chance`; the regrown object is
/// chosen uniformly among tree, rock, and bush. Structures are never
/// touched because their tiles are never empty. Returns the number of
/// objects placed.
pub fn regrow_resources<R: Rng + ?Sized>(grid: &mut TileGrid, chance: f64, rng: &mut R) -> u32 {
    if chance <= 0.0 {
        return 0;
    }
    let mut regrown: u32 = 0;
    for coord in grid.empty_tiles() {
        if !rng.random_bool(chance.min(1.0)) {
            continue;
        }
        let pick = rng.random_range(0..ObjectKind::RESOURCES.len());
        let Some(kind) = ObjectKind::RESOURCES.get(pick).copied() else {
            continue;
        };
        if grid.place_object(coord, kind).is_ok() {
            regrown = regrown.saturating_add(1);
        }
    }
    if regrown > 0 {
        debug!(regrown, "resources regrew");
    }
    regrown
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::grid::TileAccess;

    #[test]
    fn structures_are_placed_on_distinct_tiles() {
        let mut rng = StdRng::seed_from_u64(7);
        let world = generate_world(&GenerationParams::default(), &mut rng).unwrap();
        assert_ne!(world.house, world.market);
        assert_eq!(world.grid.object_at(world.house), Some(ObjectKind::House));
        assert_eq!(world.grid.object_at(world.market), Some(ObjectKind::Market));
        assert_eq!(world.grid.count_objects(ObjectKind::House), 1);
        assert_eq!(world.grid.count_objects(ObjectKind::Market), 1);
    }

    #[test]
    fn narrowest_grid_still_fits_both_structures() {
        let params = GenerationParams {
            width: 2,
            height: 1,
            ..GenerationParams::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let world = generate_world(&params, &mut rng).unwrap();
        assert_eq!(world.house, TileCoord::new(0, 0));
        assert_eq!(world.market, TileCoord::new(1, 0));
    }

    #[test]
    fn single_column_grid_is_rejected() {
        let params = GenerationParams {
            width: 1,
            ..GenerationParams::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_world(&params, &mut rng).is_err());
    }

    #[test]
    fn same_seed_same_world() {
        let params = GenerationParams::default();
        let a = generate_world(&params, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = generate_world(&params, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_densities_leave_only_structures() {
        let params = GenerationParams {
            tree_density: 0.0,
            rock_density: 0.0,
            bush_density: 0.0,
            ..GenerationParams::default()
        };
        let world = generate_world(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        for kind in ObjectKind::RESOURCES {
            assert_eq!(world.grid.count_objects(kind), 0);
        }
    }

    #[test]
    fn full_density_fills_every_free_tile() {
        let params = GenerationParams {
            width: 6,
            height: 6,
            tree_density: 1.0,
            rock_density: 0.0,
            bush_density: 0.0,
            ..GenerationParams::default()
        };
        let world = generate_world(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(world.grid.count_objects(ObjectKind::Tree), 34);
    }

    #[test]
    fn regrowth_with_zero_chance_does_nothing() {
        let mut grid = TileGrid::new(4, 4, 32.0).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(regrow_resources(&mut grid, 0.0, &mut rng), 0);
        assert_eq!(grid.empty_tiles().len(), 16);
    }

    #[test]
    fn regrowth_with_certain_chance_fills_empty_tiles() {
        let mut grid = TileGrid::new(3, 3, 32.0).unwrap();
        grid.place_object(TileCoord::new(1, 1), ObjectKind::House).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(regrow_resources(&mut grid, 1.0, &mut rng), 8);
        assert!(grid.empty_tiles().is_empty());
        assert_eq!(grid.object_at(TileCoord::new(1, 1)), Some(ObjectKind::House));
    }
}
