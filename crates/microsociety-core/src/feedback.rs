//! The reward/feedback pipeline.
//!
//! Runs exactly once per executed action, failed or not: the Q-table is
//! updated with the before/after states, the agent's totals and remembered
//! state advance, and an [`Experience`] is handed to the sink.

use chrono::Utc;
use microsociety_agents::NpcAgent;
use microsociety_types::{ActionType, Experience, State};
use serde::Deserialize;
use tracing::trace;

use crate::experience::ExperienceSink;

/// Terminal-state thresholds and recording toggle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    /// Publish records to the sink.
    pub record: bool,
    /// Health at or below which a transition is terminal.
    pub terminal_health: f64,
    /// Energy at or below which a transition is terminal.
    pub terminal_energy: f64,
    /// Whether a full inventory ends the episode.
    pub terminal_on_full_inventory: bool,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            record: true,
            terminal_health: 10.0,
            terminal_energy: 10.0,
            terminal_on_full_inventory: true,
        }
    }
}

/// Whether `agent`'s current situation ends the learning episode.
pub fn is_terminal(agent: &NpcAgent, config: &ExperienceConfig) -> bool {
    agent.dead
        || agent.vitals.health() <= config.terminal_health
        || agent.vitals.energy() <= config.terminal_energy
        || (config.terminal_on_full_inventory && agent.inventory.is_full())
}

/// One executed action ready for feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// State observed before the action.
    pub previous: State,
    /// The action attempted.
    pub action: ActionType,
    /// Reward from the executor.
    pub reward: f64,
    /// State observed after the action.
    pub next: State,
    /// Tick on which the action ran.
    pub tick: u64,
}

/// Feed `transition` back into `agent` and publish it.
///
/// Returns the published record (also when recording is disabled).
pub fn apply_feedback(
    agent: &mut NpcAgent,
    transition: Transition,
    config: &ExperienceConfig,
    sink: &dyn ExperienceSink,
) -> Experience {
    let q = agent.policy.update_q_value(
        transition.previous,
        transition.action,
        transition.reward,
        &transition.next,
    );
    agent.record_reward(transition.reward);
    agent.previous_state = Some(transition.next);

    let experience = Experience {
        agent_id: agent.id,
        agent_name: agent.name.clone(),
        previous_state: transition.previous,
        action: transition.action,
        reward: transition.reward,
        next_state: transition.next,
        terminal: is_terminal(agent, config),
        tick: transition.tick,
        recorded_at: Utc::now(),
    };
    trace!(agent = %agent.id, action = ?transition.action, reward = transition.reward, q, "feedback applied");
    if config.record {
        sink.record(experience.clone());
    }
    experience
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use microsociety_agents::AgentConfig;
    use microsociety_learning::LearningConfig;
    use microsociety_types::{Position, WOOD};

    use super::*;
    use crate::experience::ExperienceBuffer;

    fn npc() -> NpcAgent {
        NpcAgent::new("Kai", Position::default(), &AgentConfig::default(), &LearningConfig::default(), 2)
            .unwrap()
    }

    fn transition(reward: f64) -> Transition {
        Transition {
            previous: State::default(),
            action: ActionType::ChopTree,
            reward,
            next: State {
                inventory_level: 1,
                ..State::default()
            },
            tick: 7,
        }
    }

    #[test]
    fn feedback_updates_table_totals_and_sink() {
        let mut agent = npc();
        let buffer = ExperienceBuffer::new();
        let exp = apply_feedback(&mut agent, transition(10.0), &ExperienceConfig::default(), &buffer);
        // alpha 0.1, unseen next state: 0 + 0.1 * (10 + 0 - 0)
        let q = agent.policy.table().value(&State::default(), ActionType::ChopTree);
        assert!((q - 1.0).abs() < 1e-9);
        assert!((agent.total_reward - 10.0).abs() < f64::EPSILON);
        assert_eq!(agent.previous_state, Some(exp.next_state));
        assert_eq!(exp.tick, 7);
        assert!(!exp.terminal);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn recording_can_be_disabled() {
        let mut agent = npc();
        let buffer = ExperienceBuffer::new();
        let config = ExperienceConfig {
            record: false,
            ..ExperienceConfig::default()
        };
        apply_feedback(&mut agent, transition(-5.0), &config, &buffer);
        assert!(buffer.is_empty());
        assert_eq!(agent.actions_taken, 1);
    }

    #[test]
    fn terminal_conditions() {
        let config = ExperienceConfig::default();
        let mut agent = npc();
        assert!(!is_terminal(&agent, &config));
        agent.inventory.add_item(WOOD, 10).unwrap();
        assert!(is_terminal(&agent, &config));
        let relaxed = ExperienceConfig {
            terminal_on_full_inventory: false,
            ..config.clone()
        };
        assert!(!is_terminal(&agent, &relaxed));
        agent.vitals.change_energy(-95.0);
        assert!(is_terminal(&agent, &relaxed));
    }
}
