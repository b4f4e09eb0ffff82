//! Tile grid, world generation, and resource regrowth for the MicroSociety
//! simulation.
//!
//! The world is a rectangular grid of tiles. Each tile holds at most one
//! object: a harvestable resource (tree, rock, bush) or a permanent
//! structure (house, market). Removing a harvested resource is the only
//! structural mutation the decision core performs on the grid.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid operations.
//! - [`grid`] -- [`TileGrid`] and the [`TileAccess`] trait consumed by the core.
//! - [`generation`] -- Seeded world generation and resource regrowth.

pub mod error;
pub mod generation;
pub mod grid;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use generation::{GeneratedWorld, GenerationParams, generate_world, regrow_resources};
pub use grid::{TileAccess, TileGrid};
