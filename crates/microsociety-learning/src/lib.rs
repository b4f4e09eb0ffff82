//! Tabular reinforcement learning for MicroSociety agents.
//!
//! An agent's situation is reduced to a discrete [`State`] by the state
//! extractor, looked up in the agent's private [`QTable`], and turned into an
//! action by the epsilon-greedy [`QLearningPolicy`]. After the action runs,
//! the policy receives the reward and the post-action state and applies the
//! one-step Q-learning update.
//!
//! # Modules
//!
//! - [`config`] -- Learning hyperparameters and quantization levels.
//! - [`error`] -- Error types for policy construction.
//! - [`state_extractor`] -- Pure derivation of a [`State`] from world data.
//! - [`q_table`] -- The lazily grown state/action value table.
//! - [`policy`] -- Action selection and the temporal-difference update.
//!
//! [`State`]: microsociety_types::State

pub mod config;
pub mod error;
pub mod policy;
pub mod q_table;
pub mod state_extractor;

pub use config::{Discretization, LearningConfig};
pub use error::LearningError;
pub use policy::{PolicyEntry, QLearningPolicy, random_action};
pub use q_table::QTable;
pub use state_extractor::{Observation, count_nearby_objects, extract_state, quantize};
