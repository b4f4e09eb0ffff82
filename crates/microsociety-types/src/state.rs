//! The discretized agent situation used as a Q-table key.

use serde::{Deserialize, Serialize};

/// A discretized snapshot of an agent's situation.
///
/// Every field is derived by the state extractor from raw world data using
/// the same discretization parameters for the whole run, so two equal
/// states always describe the same bucketed situation. The derived
/// [`Ord`] gives a stable iteration order when the state is a map key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct State {
    /// Tile bucket along the horizontal axis.
    pub pos_x: i32,
    /// Tile bucket along the vertical axis.
    pub pos_y: i32,
    /// Trees in the 3x3 neighborhood around the agent's tile.
    pub nearby_trees: u32,
    /// Rocks in the 3x3 neighborhood around the agent's tile.
    pub nearby_rocks: u32,
    /// Bushes in the 3x3 neighborhood around the agent's tile.
    pub nearby_bushes: u32,
    /// Quantized energy level in `0..energy_levels`.
    pub energy_level: u32,
    /// Quantized inventory fill level in `0..inventory_levels`.
    pub inventory_level: u32,
}

impl State {
    /// Flatten the state into a feature vector for external models.
    ///
    /// Order: position x, position y, trees, rocks, bushes, energy level,
    /// inventory level.
    pub fn feature_vector(&self) -> [f64; 7] {
        [
            f64::from(self.pos_x),
            f64::from(self.pos_y),
            f64::from(self.nearby_trees),
            f64::from(self.nearby_rocks),
            f64::from(self.nearby_bushes),
            f64::from(self.energy_level),
            f64::from(self.inventory_level),
        ]
    }
}
