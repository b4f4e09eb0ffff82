//! Clamped physical attributes and the per-tick vital update.
//!
//! Every attribute lives in `[0, max]` for its own configured maximum;
//! mutators clamp instead of failing, except money spending, which refuses
//! to go negative.
//!
//! The vital tick runs before an agent decides anything:
//!
//! 1. Count the action cooldown down by `dt`, floored at 0
//! 2. Drain passive energy
//! 3. Mark the agent dead (once) if health or energy reached zero

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::NpcAgent;
use crate::config::AgentConfig;
use crate::error::AgentError;

/// Upper bounds for each attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeLimits {
    /// Maximum health.
    pub max_health: f64,
    /// Maximum energy.
    pub max_energy: f64,
    /// Maximum speed.
    pub max_speed: f64,
    /// Maximum strength.
    pub max_strength: f64,
    /// Maximum money.
    pub max_money: f64,
}

/// An agent's physical attributes and wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    health: f64,
    energy: f64,
    speed: f64,
    strength: f64,
    money: f64,
    limits: AttributeLimits,
}

fn clamp_to(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}

impl Vitals {
    /// Build vitals from starting values, clamping each to its maximum.
    pub fn new(
        health: f64,
        energy: f64,
        speed: f64,
        strength: f64,
        money: f64,
        limits: AttributeLimits,
    ) -> Self {
        Self {
            health: clamp_to(health, limits.max_health),
            energy: clamp_to(energy, limits.max_energy),
            speed: clamp_to(speed, limits.max_speed),
            strength: clamp_to(strength, limits.max_strength),
            money: clamp_to(money, limits.max_money),
            limits,
        }
    }

    /// Starting vitals from the agent configuration.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            config.initial_health,
            config.initial_energy,
            config.initial_speed,
            config.initial_strength,
            config.initial_money,
            config.limits(),
        )
    }

    /// Current health.
    pub const fn health(&self) -> f64 {
        self.health
    }

    /// Current energy.
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    /// Current speed.
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Current strength.
    pub const fn strength(&self) -> f64 {
        self.strength
    }

    /// Current money.
    pub const fn money(&self) -> f64 {
        self.money
    }

    /// The configured maxima.
    pub const fn limits(&self) -> &AttributeLimits {
        &self.limits
    }

    /// Energy as a fraction of its maximum, 0 when the maximum is 0.
    pub fn energy_fraction(&self) -> f64 {
        if self.limits.max_energy > 0.0 {
            self.energy / self.limits.max_energy
        } else {
            0.0
        }
    }

    /// Add `delta` health (negative to damage), clamped.
    pub fn change_health(&mut self, delta: f64) {
        self.health = clamp_to(self.health + delta, self.limits.max_health);
    }

    /// Add `delta` energy (negative to consume), clamped.
    pub fn change_energy(&mut self, delta: f64) {
        self.energy = clamp_to(self.energy + delta, self.limits.max_energy);
    }

    /// Add `delta` speed, clamped.
    pub fn change_speed(&mut self, delta: f64) {
        self.speed = clamp_to(self.speed + delta, self.limits.max_speed);
    }

    /// Add `delta` strength, clamped.
    pub fn change_strength(&mut self, delta: f64) {
        self.strength = clamp_to(self.strength + delta, self.limits.max_strength);
    }

    /// Credit money, clamped to the maximum.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidAmount`] for negative or non-finite amounts.
    pub fn earn(&mut self, amount: f64) -> Result<(), AgentError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AgentError::InvalidAmount { amount });
        }
        self.money = clamp_to(self.money + amount, self.limits.max_money);
        Ok(())
    }

    /// Debit money.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidAmount`] for negative or non-finite
    /// amounts and [`AgentError::InsufficientMoney`] when the balance is too
    /// low. The balance is unchanged on error.
    pub fn spend(&mut self, amount: f64) -> Result<(), AgentError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AgentError::InvalidAmount { amount });
        }
        if amount > self.money {
            return Err(AgentError::InsufficientMoney {
                required: amount,
                available: self.money,
            });
        }
        self.money = clamp_to(self.money - amount, self.limits.max_money);
        Ok(())
    }

    /// Whether health or energy is exhausted.
    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0 || self.energy <= 0.0
    }
}

/// Outcome of one vital tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalTickResult {
    /// Cooldown left after the countdown.
    pub cooldown_remaining: f64,
    /// Energy drained this tick.
    pub energy_lost: f64,
    /// Whether the agent died during this tick.
    pub died: bool,
}

/// Apply one tick of vital mechanics to an agent.
///
/// Dead agents are left untouched.
pub fn apply_vital_tick(agent: &mut NpcAgent, dt: f64, config: &AgentConfig) -> VitalTickResult {
    if agent.dead {
        return VitalTickResult {
            cooldown_remaining: agent.cooldown,
            energy_lost: 0.0,
            died: false,
        };
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    agent.cooldown = (agent.cooldown - dt).max(0.0);

    let before = agent.vitals.energy();
    agent.vitals.change_energy(-config.energy_decay_per_second * dt);
    let energy_lost = before - agent.vitals.energy();

    let died = agent.check_death(config.death_penalty);
    if died {
        info!(agent = %agent.id, name = %agent.name, "agent died");
    }
    VitalTickResult {
        cooldown_remaining: agent.cooldown,
        energy_lost,
        died,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use microsociety_learning::LearningConfig;
    use microsociety_types::Position;

    use super::*;

    fn limits() -> AttributeLimits {
        AgentConfig::default().limits()
    }

    fn agent(config: &AgentConfig) -> NpcAgent {
        NpcAgent::new("Ada", Position::default(), config, &LearningConfig::default(), 1).unwrap()
    }

    #[test]
    fn construction_clamps() {
        let v = Vitals::new(150.0, -5.0, 3.0, 4.0, 10.0, limits());
        assert!((v.health() - 100.0).abs() < f64::EPSILON);
        assert!(v.energy().abs() < f64::EPSILON);
        assert!(v.is_depleted());
    }

    #[test]
    fn changes_clamp_independently() {
        let mut v = Vitals::new(50.0, 50.0, 3.0, 4.0, 10.0, limits());
        v.change_health(80.0);
        v.change_energy(-80.0);
        assert!((v.health() - 100.0).abs() < f64::EPSILON);
        assert!(v.energy().abs() < f64::EPSILON);
        assert!((v.energy_fraction()).abs() < f64::EPSILON);
    }

    #[test]
    fn spending_more_than_balance_fails() {
        let mut v = Vitals::new(50.0, 50.0, 3.0, 4.0, 10.0, limits());
        assert!(matches!(
            v.spend(10.5),
            Err(AgentError::InsufficientMoney { .. })
        ));
        assert!((v.money() - 10.0).abs() < f64::EPSILON);
        assert!(v.spend(10.0).is_ok());
        assert!(v.money().abs() < f64::EPSILON);
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut v = Vitals::new(50.0, 50.0, 3.0, 4.0, 10.0, limits());
        assert!(v.earn(-1.0).is_err());
        assert!(v.spend(f64::NAN).is_err());
        assert!((v.money() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cooldown_clamps_at_zero() {
        let config = AgentConfig::default();
        let mut a = agent(&config);
        a.cooldown = 0.5;
        let result = apply_vital_tick(&mut a, 1.0, &config);
        assert!(result.cooldown_remaining.abs() < f64::EPSILON);
        assert!(a.cooldown.abs() < f64::EPSILON);
    }

    #[test]
    fn passive_energy_decay() {
        let config = AgentConfig {
            energy_decay_per_second: 2.0,
            ..AgentConfig::default()
        };
        let mut a = agent(&config);
        let result = apply_vital_tick(&mut a, 1.5, &config);
        assert!((result.energy_lost - 3.0).abs() < 1e-9);
        assert!((a.vitals.energy() - 97.0).abs() < 1e-9);
        assert!(!result.died);
    }

    #[test]
    fn exhaustion_kills_once() {
        let config = AgentConfig {
            initial_energy: 1.0,
            energy_decay_per_second: 5.0,
            ..AgentConfig::default()
        };
        let mut a = agent(&config);
        let first = apply_vital_tick(&mut a, 1.0, &config);
        assert!(first.died);
        assert!(a.dead);
        assert!((a.total_penalty - config.death_penalty).abs() < f64::EPSILON);

        let second = apply_vital_tick(&mut a, 1.0, &config);
        assert!(!second.died);
        assert!((a.total_penalty - config.death_penalty).abs() < f64::EPSILON);
    }
}
