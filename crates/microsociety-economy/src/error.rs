//! Error types for the microsociety-economy crate.
//!
//! Every failing market or house operation returns one of these and leaves
//! the market, the house, and the agent exactly as they were.

use microsociety_agents::AgentError;

/// Errors from market trades.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketError {
    /// An item key was empty.
    #[error("item name must not be empty")]
    EmptyItemName,

    /// A trade quantity was zero.
    #[error("trade quantity for {item} must be positive")]
    ZeroQuantity {
        /// The item being traded.
        item: String,
    },

    /// The buyer cannot pay.
    #[error("cannot afford {quantity} {item}: costs {required:.1}, has {available:.1}")]
    InsufficientFunds {
        /// The item being bought.
        item: String,
        /// Units requested.
        quantity: u32,
        /// Total cost.
        required: f64,
        /// Money held.
        available: f64,
    },

    /// The buyer has no room for the purchase.
    #[error("no inventory room for {quantity} {item}: {free} slots free")]
    NoInventoryRoom {
        /// The item being bought.
        item: String,
        /// Units requested.
        quantity: u32,
        /// Free slots.
        free: u32,
    },

    /// The seller does not hold enough.
    #[error("cannot sell {quantity} {item}: holds {available}")]
    InsufficientItems {
        /// The item being sold.
        item: String,
        /// Units requested.
        quantity: u32,
        /// Units held.
        available: u32,
    },

    /// An agent wallet or inventory operation failed after validation.
    #[error("agent update failed: {0}")]
    Agent(#[from] AgentError),
}

/// Errors from house storage and upgrades.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HouseError {
    /// An item key was empty.
    #[error("item name must not be empty")]
    EmptyItemName,

    /// A quantity was zero.
    #[error("quantity for {item} must be positive")]
    ZeroQuantity {
        /// The item being moved.
        item: String,
    },

    /// Storing would exceed the capacity.
    #[error("storage full: cannot store {quantity} {item}, {free} slots free")]
    StorageFull {
        /// The item being stored.
        item: String,
        /// Units requested.
        quantity: u32,
        /// Free slots.
        free: u32,
    },

    /// Not enough of an item in storage.
    #[error("storage holds {available} {item}, {requested} requested")]
    InsufficientStock {
        /// The item being taken.
        item: String,
        /// Units requested.
        requested: u32,
        /// Units stored.
        available: u32,
    },

    /// The taker has no room for the withdrawal.
    #[error("no inventory room for {quantity} {item}: {free} slots free")]
    NoInventoryRoom {
        /// The item being taken.
        item: String,
        /// Units requested.
        quantity: u32,
        /// Free slots.
        free: u32,
    },

    /// The upgrader cannot pay.
    #[error("upgrade to level {next_level} costs {required:.1}, has {available:.1}")]
    InsufficientFunds {
        /// The level the upgrade would reach.
        next_level: u32,
        /// Upgrade cost.
        required: f64,
        /// Money held.
        available: f64,
    },

    /// Storage lacks an upgrade resource.
    #[error("upgrade to level {next_level} needs {required} {item}, storage has {available}")]
    InsufficientResources {
        /// The level the upgrade would reach.
        next_level: u32,
        /// The missing resource.
        item: String,
        /// Units required.
        required: u32,
        /// Units stored.
        available: u32,
    },

    /// An agent wallet or inventory operation failed after validation.
    #[error("agent update failed: {0}")]
    Agent(#[from] AgentError),
}
