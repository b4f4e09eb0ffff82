//! NPC agents for the MicroSociety simulation.
//!
//! An [`NpcAgent`] owns everything that is private to one participant: its
//! vitals, its inventory, its decision flags, its Q-learning policy, its
//! cooldown, and the anti-stagnation tracker. Shared resources (the grid,
//! the market, the house) live elsewhere and are passed in by the tick
//! cycle.
//!
//! # Modules
//!
//! - [`agent`] -- The [`NpcAgent`] record and its constructors.
//! - [`config`] -- Attribute maxima, starting values, and decision flags.
//! - [`error`] -- Error types for inventory and money operations.
//! - [`inventory`] -- Capacity-bounded item storage carried by an agent.
//! - [`stagnation`] -- Per-agent detection of repeated no-progress actions.
//! - [`vitals`] -- Clamped attributes and the per-tick vital update.

pub mod agent;
pub mod config;
pub mod error;
pub mod inventory;
pub mod stagnation;
pub mod vitals;

pub use agent::{DecisionFlags, NpcAgent};
pub use config::AgentConfig;
pub use error::AgentError;
pub use inventory::Inventory;
pub use stagnation::StagnationTracker;
pub use vitals::{AttributeLimits, VitalTickResult, Vitals, apply_vital_tick};
