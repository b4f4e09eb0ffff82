//! Shared type definitions for the MicroSociety simulation.
//!
//! This crate is the single source of truth for the value types that flow
//! between the world grid, the learning policy, the agents, the economy, and
//! the tick cycle. It has no behavior beyond small pure helpers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Closed enumerations (actions, tile objects, decision modes)
//! - [`geometry`] -- Continuous positions and tile coordinates
//! - [`items`] -- Item keys used by inventories, storage, and the market
//! - [`state`] -- The discretized [`State`] used as a Q-table key
//! - [`experience`] -- The per-action [`Experience`] tuple published to sinks

pub mod enums;
pub mod experience;
pub mod geometry;
pub mod ids;
pub mod items;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionType, AgentKind, DecisionMode, ObjectKind};
pub use experience::Experience;
pub use geometry::{Position, TileCoord};
pub use ids::AgentId;
pub use items::{BUSH, ESSENTIAL_ITEMS, STONE, WOOD};
pub use state::State;
