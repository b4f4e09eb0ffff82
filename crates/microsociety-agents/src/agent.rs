//! The NPC agent record.
//!
//! An agent is created once at simulation start and mutated every tick by
//! the vital update, the action executor, and the reward pipeline. Death
//! only sets a flag: the agent stays in the population and is skipped.

use microsociety_learning::{LearningConfig, Observation, QLearningPolicy};
use microsociety_types::{ActionType, AgentId, AgentKind, DecisionMode, Position, State};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::inventory::Inventory;
use crate::stagnation::StagnationTracker;
use crate::vitals::Vitals;

/// Which decision sources an agent may consult.
///
/// Rule-based selection is always available as the final fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionFlags {
    /// Consult the agent's own Q-learning policy.
    pub q_learning: bool,
    /// Consult the shared external model when it reports itself loaded.
    pub external_model: bool,
}

/// An autonomous participant in the simulation.
#[derive(Debug, Clone)]
pub struct NpcAgent {
    /// Unique identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// NPC or player-controlled.
    pub kind: AgentKind,
    /// Continuous position in world units.
    pub position: Position,
    /// Health, energy, speed, strength, and money.
    pub vitals: Vitals,
    /// Carried items.
    pub inventory: Inventory,
    /// Enabled decision sources.
    pub flags: DecisionFlags,
    /// The agent's private Q-learning policy and table.
    pub policy: QLearningPolicy,
    /// Most recent action attempted.
    pub last_action: ActionType,
    /// Decision source that produced the most recent action.
    pub last_mode: Option<DecisionMode>,
    /// Seconds until the agent may act again (never negative).
    pub cooldown: f64,
    /// State observed after the most recent action.
    pub previous_state: Option<State>,
    /// Repeat detector for the anti-stagnation rule.
    pub stagnation: StagnationTracker,
    /// Set once when health or energy reaches zero.
    pub dead: bool,
    /// Sum of every action reward received.
    pub total_reward: f64,
    /// Sum of death penalties.
    pub total_penalty: f64,
    /// Number of actions executed.
    pub actions_taken: u64,
}

impl NpcAgent {
    /// Create an NPC with starting vitals and an empty inventory.
    ///
    /// `seed` drives the agent's exploration draws.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Learning`] if the learning configuration is
    /// invalid.
    pub fn new(
        name: impl Into<String>,
        position: Position,
        config: &AgentConfig,
        learning: &LearningConfig,
        seed: u64,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            id: AgentId::new(),
            name: name.into(),
            kind: AgentKind::Npc,
            position,
            vitals: Vitals::from_config(config),
            inventory: Inventory::new(config.inventory_capacity),
            flags: DecisionFlags {
                q_learning: config.use_q_learning,
                external_model: config.use_external_model,
            },
            policy: QLearningPolicy::new(learning, seed)?,
            last_action: ActionType::None,
            last_mode: None,
            cooldown: 0.0,
            previous_state: None,
            stagnation: StagnationTracker::new(),
            dead: false,
            total_reward: 0.0,
            total_penalty: 0.0,
            actions_taken: 0,
        })
    }

    /// Change the agent kind.
    #[must_use]
    pub fn with_kind(mut self, kind: AgentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the agent is alive.
    pub const fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Whether the router should decide for this agent this tick.
    pub fn can_act(&self) -> bool {
        !self.dead && self.cooldown <= 0.0 && self.kind == AgentKind::Npc
    }

    /// Raw inputs for state extraction.
    pub fn observation(&self) -> Observation {
        Observation {
            position: self.position,
            energy: self.vitals.energy(),
            max_energy: self.vitals.limits().max_energy,
            inventory_size: self.inventory.total(),
            inventory_capacity: self.inventory.capacity(),
        }
    }

    /// Add an action reward to the running total.
    pub fn record_reward(&mut self, reward: f64) {
        self.total_reward += reward;
        self.actions_taken = self.actions_taken.saturating_add(1);
    }

    /// Mark the agent dead if its vitals are depleted.
    ///
    /// The penalty is applied only on the transition to dead. Returns
    /// whether the agent died on this call.
    pub fn check_death(&mut self, death_penalty: f64) -> bool {
        if self.dead || !self.vitals.is_depleted() {
            return false;
        }
        self.dead = true;
        self.total_penalty += death_penalty;
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use microsociety_types::WOOD;

    use super::*;

    fn make(config: &AgentConfig) -> NpcAgent {
        NpcAgent::new("Bo", Position::new(48.0, 16.0), config, &LearningConfig::default(), 3)
            .unwrap()
    }

    #[test]
    fn new_agent_uses_config() {
        let config = AgentConfig {
            inventory_capacity: 7,
            use_q_learning: false,
            use_external_model: true,
            ..AgentConfig::default()
        };
        let agent = make(&config);
        assert_eq!(agent.name, "Bo");
        assert_eq!(agent.inventory.capacity(), 7);
        assert!(!agent.flags.q_learning);
        assert!(agent.flags.external_model);
        assert!(agent.is_alive());
        assert!(agent.can_act());
        assert_eq!(agent.last_action, ActionType::None);
        assert!(agent.previous_state.is_none());
    }

    #[test]
    fn invalid_learning_config_fails() {
        let learning = LearningConfig {
            learning_rate: -1.0,
            ..LearningConfig::default()
        };
        let result = NpcAgent::new("X", Position::default(), &AgentConfig::default(), &learning, 0);
        assert!(matches!(result, Err(AgentError::Learning(_))));
    }

    #[test]
    fn players_and_cooldowns_block_acting() {
        let mut agent = make(&AgentConfig::default());
        agent.cooldown = 1.0;
        assert!(!agent.can_act());
        agent.cooldown = 0.0;
        let player = agent.with_kind(AgentKind::Player);
        assert!(!player.can_act());
    }

    #[test]
    fn observation_reflects_inventory() {
        let mut agent = make(&AgentConfig::default());
        agent.inventory.add_item(WOOD, 3).unwrap();
        let obs = agent.observation();
        assert_eq!(obs.inventory_size, 3);
        assert_eq!(obs.inventory_capacity, 10);
        assert!((obs.max_energy - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn death_penalty_applies_once() {
        let mut agent = make(&AgentConfig::default());
        assert!(!agent.check_death(-100.0));
        agent.vitals.change_health(-1_000.0);
        assert!(agent.check_death(-100.0));
        assert!(!agent.check_death(-100.0));
        assert!((agent.total_penalty + 100.0).abs() < f64::EPSILON);
        assert!(!agent.can_act());
    }

    #[test]
    fn rewards_accumulate() {
        let mut agent = make(&AgentConfig::default());
        agent.record_reward(10.0);
        agent.record_reward(-5.0);
        assert!((agent.total_reward - 5.0).abs() < f64::EPSILON);
        assert_eq!(agent.actions_taken, 2);
    }
}
