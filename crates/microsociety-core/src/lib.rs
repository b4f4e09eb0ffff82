//! Decision routing, action execution, reward feedback, and the tick cycle
//! for the MicroSociety simulation.
//!
//! Every turn an NPC observes a discretized [`State`], the router picks an
//! action from the highest-priority available source (external model,
//! Q-learning, rule-based), the executor mutates the world and returns a
//! reward, and the feedback pipeline updates the Q-table and publishes an
//! [`Experience`].
//!
//! # Modules
//!
//! - [`actions`] -- The action executor and its reward table.
//! - [`config`] -- Configuration loading from `microsociety-config.yaml`
//!   into strongly-typed structs.
//! - [`experience`] -- [`ExperienceSink`] and the in-memory buffer.
//! - [`feedback`] -- Q-update, reward accounting, and experience publishing.
//! - [`model`] -- [`ExternalModel`] trait and the always-unloaded stub.
//! - [`router`] -- Decision-source selection and stagnation forcing.
//! - [`runner`] -- Bounded run loop and end-of-run report.
//! - [`tick`] -- The tick cycle over the whole population.
//!
//! [`State`]: microsociety_types::State
//! [`Experience`]: microsociety_types::Experience
//! [`ExperienceSink`]: experience::ExperienceSink
//! [`ExternalModel`]: model::ExternalModel

pub mod actions;
pub mod config;
pub mod experience;
pub mod feedback;
pub mod model;
pub mod router;
pub mod runner;
pub mod tick;

pub use actions::{ActionContext, ActionOutcome, ActionTuning, FailureCause, RewardConfig, execute_action};
pub use config::{ConfigError, SimulationConfig};
pub use experience::{ExperienceBuffer, ExperienceSink, NullSink};
pub use feedback::{ExperienceConfig, Transition, apply_feedback};
pub use model::{ExternalModel, NoModel};
pub use router::{Decision, EconomyView, RouterConfig, decide};
pub use runner::{EndReason, SimulationReport, TickCallback, run_simulation};
pub use tick::{SimulationState, TickError, TickSummary, run_tick};
