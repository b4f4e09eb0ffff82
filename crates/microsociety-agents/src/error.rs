//! Error types for the microsociety-agents crate.
//!
//! Inventory and money operations validate their inputs at the boundary and
//! leave the agent untouched when they fail.

use microsociety_learning::LearningError;

/// Errors that can occur during agent state operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// An item key was empty.
    #[error("item name must not be empty")]
    EmptyItemName,

    /// A quantity was zero.
    #[error("quantity for {item} must be positive")]
    ZeroQuantity {
        /// The item the caller tried to move.
        item: String,
    },

    /// Adding items would exceed the inventory capacity.
    #[error(
        "inventory overflow: adding {attempted} {item} would exceed capacity (current load: {current_load}, capacity: {capacity})"
    )]
    InventoryOverflow {
        /// The item being added.
        item: String,
        /// The quantity the caller attempted to add.
        attempted: u32,
        /// Items currently carried.
        current_load: u32,
        /// The inventory capacity.
        capacity: u32,
    },

    /// Removing more of an item than the agent holds.
    #[error("insufficient {item}: wanted {requested} but only have {available}")]
    InsufficientItem {
        /// The item being removed.
        item: String,
        /// The quantity requested.
        requested: u32,
        /// The quantity held.
        available: u32,
    },

    /// Spending more money than the agent holds.
    #[error("insufficient money: need {required:.2}, have {available:.2}")]
    InsufficientMoney {
        /// The amount required.
        required: f64,
        /// The amount held.
        available: f64,
    },

    /// A money amount was negative or not finite.
    #[error("invalid money amount {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: f64,
    },

    /// The agent's learning policy could not be built.
    #[error("learning policy: {0}")]
    Learning(#[from] LearningError),
}
