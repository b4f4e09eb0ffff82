//! Epsilon-greedy action selection and the one-step Q-learning update.
//!
//! Each agent owns one [`QLearningPolicy`], including its random number
//! generator, so two agents never share exploration draws or table rows.
//!
//! Selection:
//!
//! 1. With probability ε, return a uniformly random non-`None` action.
//! 2. If the state has never been written, return a uniformly random
//!    non-`None` action (unknown state means explore).
//! 3. Otherwise return the stored argmax, lowest ordinal on ties.
//!
//! Update: `Q[s][a] += α' * (r + γ * max_a' Q[s'][a'] - Q[s][a])`, where an
//! unseen `s'` contributes 0 and `α' = α * negative_reward_scale` for
//! negative rewards.

use microsociety_types::{ActionType, State};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::LearningConfig;
use crate::error::LearningError;
use crate::q_table::QTable;

/// One row of an exported greedy policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// The visited state.
    pub state: State,
    /// The argmax action for that state.
    pub action: ActionType,
    /// The stored value of that action.
    pub value: f64,
}

/// Pick a uniformly random action from every variant except
/// [`ActionType::None`].
pub fn random_action<R: Rng + ?Sized>(rng: &mut R) -> ActionType {
    let ordinal = rng.random_range(1..=ActionType::max_ordinal());
    ActionType::from_ordinal(ordinal).unwrap_or(ActionType::Rest)
}

/// Tabular epsilon-greedy Q-learning policy.
#[derive(Debug, Clone)]
pub struct QLearningPolicy {
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    negative_reward_scale: f64,
    table: QTable,
    rng: StdRng,
    updates: u64,
}

impl QLearningPolicy {
    /// Build a policy with an empty table and a seeded generator.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError`] if the configuration fails validation.
    pub fn new(config: &LearningConfig, seed: u64) -> Result<Self, LearningError> {
        config.validate()?;
        Ok(Self {
            learning_rate: config.learning_rate,
            discount_factor: config.discount_factor,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            min_epsilon: config.min_epsilon,
            negative_reward_scale: config.negative_reward_scale,
            table: QTable::new(),
            rng: StdRng::seed_from_u64(seed),
            updates: 0,
        })
    }

    /// Choose an action for `state`.
    pub fn decide_action(&mut self, state: &State) -> ActionType {
        let roll: f64 = self.rng.random();
        if roll < self.epsilon {
            let action = random_action(&mut self.rng);
            trace!(action = action.as_str(), "exploring");
            return action;
        }
        match self.table.best_action(state) {
            Some((action, _)) => action,
            None => {
                let action = random_action(&mut self.rng);
                trace!(action = action.as_str(), "unseen state, exploring");
                action
            }
        }
    }

    /// Apply the one-step update for an executed action and return the new
    /// value of `Q[state][action]`.
    ///
    /// Call exactly once per executed action, with the state observed before
    /// the action and the state observed after it.
    pub fn update_q_value(
        &mut self,
        state: State,
        action: ActionType,
        reward: f64,
        next_state: &State,
    ) -> f64 {
        let current = self.table.value(&state, action);
        let max_next = self.table.max_value(next_state);
        let alpha = if reward < 0.0 {
            self.learning_rate * self.negative_reward_scale
        } else {
            self.learning_rate
        };
        let updated = current + alpha * (reward + self.discount_factor * max_next - current);
        self.table.set_value(state, action, updated);
        self.updates = self.updates.saturating_add(1);
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon.min(self.epsilon));
        updated
    }

    /// The argmax action of every visited state, in state order.
    pub fn greedy_policy(&self) -> Vec<PolicyEntry> {
        self.table
            .rows()
            .filter_map(|(state, _)| {
                self.table
                    .best_action(state)
                    .map(|(action, value)| PolicyEntry {
                        state: *state,
                        action,
                        value,
                    })
            })
            .collect()
    }

    /// Read access to the table.
    pub const fn table(&self) -> &QTable {
        &self.table
    }

    /// Current exploration probability.
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of updates applied so far.
    pub const fn update_count(&self) -> u64 {
        self.updates
    }
}
