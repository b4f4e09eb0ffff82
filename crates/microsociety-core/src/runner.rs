//! Bounded simulation runner and end-of-run reporting.
//!
//! [`run_simulation`] repeats [`run_tick`] until one of the termination
//! conditions holds:
//!
//! - **Tick limit**: `world.max_ticks` ticks have run (0 means no limit)
//! - **Extinction**: no agent is left alive
//! - **Stop request**: the shared stop flag has been raised
//!
//! The loop is unpaced. Callers that want wall-clock pacing drive
//! [`run_tick`] themselves and use [`end_reason`] to decide when to stop.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use microsociety_types::AgentId;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::experience::ExperienceSink;
use crate::model::ExternalModel;
use crate::tick::{self, SimulationState, TickSummary};

/// Why a simulation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The configured tick limit was reached.
    MaxTicksReached,
    /// Every agent has died.
    AllAgentsDead,
    /// The stop flag was raised.
    Stopped,
}

/// Callback invoked after each tick completes.
pub trait TickCallback {
    /// Called after a tick completes.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Final figures for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    /// Agent id.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Whether the agent survived.
    pub alive: bool,
    /// Accumulated positive reward.
    pub total_reward: f64,
    /// Accumulated penalties, death included.
    pub total_penalty: f64,
    /// Actions executed.
    pub actions_taken: u64,
    /// Money held at the end.
    pub money: f64,
    /// Items carried at the end.
    pub inventory: u32,
    /// Distinct states in the agent's Q-table.
    pub learned_states: usize,
    /// Exploration rate at the end.
    pub epsilon: f64,
}

/// End-of-run snapshot of the whole simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Why the run ended, if it has.
    pub end_reason: Option<EndReason>,
    /// Ticks executed.
    pub ticks: u64,
    /// Simulated seconds elapsed.
    pub elapsed: f64,
    /// Agents still alive.
    pub agents_alive: u32,
    /// Per-agent figures, in turn order.
    pub agents: Vec<AgentReport>,
    /// Current market prices.
    pub prices: BTreeMap<String, f64>,
    /// Units bought from the market.
    pub items_bought: u32,
    /// Units sold to the market.
    pub items_sold: u32,
    /// House level.
    pub house_level: u32,
    /// Units held in house storage.
    pub house_storage: u32,
}

impl SimulationReport {
    /// Capture the current state of `state`.
    pub fn capture(state: &SimulationState, end_reason: Option<EndReason>) -> Self {
        let agents = state
            .agents
            .iter()
            .map(|agent| AgentReport {
                id: agent.id,
                name: agent.name.clone(),
                alive: agent.is_alive(),
                total_reward: agent.total_reward,
                total_penalty: agent.total_penalty,
                actions_taken: agent.actions_taken,
                money: agent.vitals.money(),
                inventory: agent.inventory.total(),
                learned_states: agent.policy.table().state_count(),
                epsilon: agent.policy.epsilon(),
            })
            .collect();
        Self {
            end_reason,
            ticks: state.tick,
            elapsed: state.elapsed,
            agents_alive: state.living_agents(),
            agents,
            prices: state.market.prices(),
            items_bought: state.market.total_items_bought(),
            items_sold: state.market.total_items_sold(),
            house_level: state.house.level(),
            house_storage: state.house.stored_total(),
        }
    }
}

/// The condition that ends the run now, if any.
///
/// Extinction is checked before the tick limit.
pub fn end_reason(state: &SimulationState, stop: &AtomicBool) -> Option<EndReason> {
    if stop.load(Ordering::Relaxed) {
        return Some(EndReason::Stopped);
    }
    if state.living_agents() == 0 {
        return Some(EndReason::AllAgentsDead);
    }
    let max_ticks = state.config.world.max_ticks;
    if max_ticks > 0 && state.tick >= max_ticks {
        return Some(EndReason::MaxTicksReached);
    }
    None
}

/// Run ticks until a termination condition holds.
///
/// A population that is empty from the start ends immediately with
/// [`EndReason::AllAgentsDead`] and no tick executed.
pub fn run_simulation(
    state: &mut SimulationState,
    model: &dyn ExternalModel,
    sink: &dyn ExperienceSink,
    callback: &mut dyn TickCallback,
    stop: &AtomicBool,
) -> SimulationReport {
    info!(
        agents = state.agents.len(),
        max_ticks = state.config.world.max_ticks,
        "simulation starting"
    );
    let reason = loop {
        if let Some(reason) = end_reason(state, stop) {
            break reason;
        }
        let summary = tick::run_tick(state, model, sink);
        callback.on_tick(&summary, state);
    };
    let report = SimulationReport::capture(state, Some(reason));
    log_simulation_end(&report);
    report
}

/// Log the final report.
pub fn log_simulation_end(report: &SimulationReport) {
    info!(
        reason = ?report.end_reason,
        ticks = report.ticks,
        alive = report.agents_alive,
        house_level = report.house_level,
        bought = report.items_bought,
        sold = report.items_sold,
        "simulation ended"
    );
    for agent in &report.agents {
        info!(
            name = %agent.name,
            alive = agent.alive,
            reward = agent.total_reward,
            penalty = agent.total_penalty,
            actions = agent.actions_taken,
            money = agent.money,
            learned_states = agent.learned_states,
            "agent result"
        );
    }
}
