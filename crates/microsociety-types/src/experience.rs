//! The per-action experience tuple published to experience sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ActionType;
use crate::ids::AgentId;
use crate::state::State;

/// One completed action, as seen by the learning pipeline.
///
/// Published once per executed action, including failed attempts, so that
/// an external exporter sees exactly the signal the Q-table received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    /// The agent that acted.
    pub agent_id: AgentId,
    /// The agent's display name.
    pub agent_name: String,
    /// State before the action.
    pub previous_state: State,
    /// The action attempted.
    pub action: ActionType,
    /// Reward produced by the executor.
    pub reward: f64,
    /// State after the action.
    pub next_state: State,
    /// Whether the episode ended (death, exhaustion, or a full inventory).
    pub terminal: bool,
    /// Simulation tick on which the action ran.
    pub tick: u64,
    /// Wall-clock time the record was produced.
    pub recorded_at: DateTime<Utc>,
}
