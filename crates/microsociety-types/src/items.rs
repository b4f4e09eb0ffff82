//! Item keys shared by inventories, house storage, and the market.
//!
//! Items are plain string keys so the market can lazily price items it has
//! never seen. The three essentials below are the ones the world produces.

/// Wood, harvested from trees.
pub const WOOD: &str = "wood";

/// Stone, mined from rocks.
pub const STONE: &str = "stone";

/// Bush, gathered from bushes.
pub const BUSH: &str = "bush";

/// The items produced by the world and required for house upgrades.
pub const ESSENTIAL_ITEMS: [&str; 3] = [WOOD, STONE, BUSH];
