//! Derivation of a discrete [`State`] from raw world data.
//!
//! Everything here is a pure function of its inputs: no hidden state, no
//! randomness, no mutation of the grid.

use microsociety_types::{ObjectKind, Position, State, TileCoord};
use microsociety_world::TileAccess;

use crate::config::Discretization;

/// Raw agent data needed to build a [`State`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// The agent's continuous position.
    pub position: Position,
    /// Current energy.
    pub energy: f64,
    /// Maximum energy, the top of the quantization range.
    pub max_energy: f64,
    /// Total items carried.
    pub inventory_size: u32,
    /// Inventory capacity, the top of the quantization range.
    pub inventory_capacity: u32,
}

/// Bucket `value` into one of `levels` equal-width buckets over `[min, max]`.
///
/// The value is clamped to the range first, so the result is always in
/// `0..levels` and is monotonic non-decreasing in `value`. The top of the
/// range falls into the last bucket. Degenerate inputs (zero levels, an
/// empty or inverted range, NaN) map to bucket 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(value: f64, min: f64, max: f64, levels: u32) -> u32 {
    if levels == 0 || value.is_nan() || max.is_nan() || min.is_nan() || max <= min {
        return 0;
    }
    let clamped = value.clamp(min, max);
    let ratio = (clamped - min) / (max - min);
    // ratio is in [0, 1], so the product is in [0, levels].
    let bucket = (ratio * f64::from(levels)).floor() as u32;
    bucket.min(levels.saturating_sub(1))
}

/// Count tiles holding exactly `kind` in the 3x3 neighborhood of `center`.
///
/// `center` is a signed tile bucket; neighbors outside the grid are skipped,
/// so corner and edge tiles see fewer than nine candidates.
pub fn count_nearby_objects<G: TileAccess + ?Sized>(
    grid: &G,
    center: (i32, i32),
    kind: ObjectKind,
) -> u32 {
    let mut count: u32 = 0;
    for dy in -1_i64..=1 {
        for dx in -1_i64..=1 {
            let x = i64::from(center.0).saturating_add(dx);
            let y = i64::from(center.1).saturating_add(dy);
            let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
                continue;
            };
            if grid.object_at(TileCoord::new(x, y)) == Some(kind) {
                count = count.saturating_add(1);
            }
        }
    }
    count
}

/// Build the [`State`] for an agent.
///
/// Position is bucketed by the grid's tile size, nearby counts cover the
/// 3x3 neighborhood, energy is quantized over `[0, max_energy]` and
/// inventory fill over `[0, inventory_capacity]`.
pub fn extract_state<G: TileAccess + ?Sized>(
    grid: &G,
    observation: &Observation,
    levels: Discretization,
) -> State {
    let bucket = observation.position.bucket(grid.tile_size());
    State {
        pos_x: bucket.0,
        pos_y: bucket.1,
        nearby_trees: count_nearby_objects(grid, bucket, ObjectKind::Tree),
        nearby_rocks: count_nearby_objects(grid, bucket, ObjectKind::Rock),
        nearby_bushes: count_nearby_objects(grid, bucket, ObjectKind::Bush),
        energy_level: quantize(
            observation.energy,
            0.0,
            observation.max_energy,
            levels.energy_levels,
        ),
        inventory_level: quantize(
            f64::from(observation.inventory_size),
            0.0,
            f64::from(observation.inventory_capacity),
            levels.inventory_levels,
        ),
    }
}
