//! Learning hyperparameters.
//!
//! Mirrors the `learning` section of `microsociety-config.yaml`. The
//! defaults reproduce classic fixed-parameter Q-learning: a decay of 1.0 and
//! a negative-reward scale of 1.0 are both no-ops.

use serde::Deserialize;

use crate::error::LearningError;

/// Hyperparameters for [`QLearningPolicy`](crate::QLearningPolicy).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LearningConfig {
    /// Step size α of the update, in `(0, 1]`.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Discount γ applied to the best next-state value, in `[0, 1]`.
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,

    /// Exploration probability ε, in `[0, 1]`.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Multiplier applied to ε after every update (1.0 disables decay).
    #[serde(default = "default_epsilon_decay")]
    pub epsilon_decay: f64,

    /// Floor for ε when decay is enabled.
    #[serde(default = "default_min_epsilon")]
    pub min_epsilon: f64,

    /// Multiplier on α when the reward is negative (1.0 is the classic update).
    #[serde(default = "default_negative_reward_scale")]
    pub negative_reward_scale: f64,

    /// Number of buckets for the energy dimension of the state.
    #[serde(default = "default_levels")]
    pub energy_levels: u32,

    /// Number of buckets for the inventory-fill dimension of the state.
    #[serde(default = "default_levels")]
    pub inventory_levels: u32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            discount_factor: default_discount_factor(),
            epsilon: default_epsilon(),
            epsilon_decay: default_epsilon_decay(),
            min_epsilon: default_min_epsilon(),
            negative_reward_scale: default_negative_reward_scale(),
            energy_levels: default_levels(),
            inventory_levels: default_levels(),
        }
    }
}

impl LearningConfig {
    /// Check every parameter against its valid range.
    ///
    /// # Errors
    ///
    /// Returns the first [`LearningError`] found.
    pub fn validate(&self) -> Result<(), LearningError> {
        check_range("learning_rate", self.learning_rate, |v| v > 0.0 && v <= 1.0, "must be in (0, 1]")?;
        check_range("discount_factor", self.discount_factor, unit_interval, "must be in [0, 1]")?;
        check_range("epsilon", self.epsilon, unit_interval, "must be in [0, 1]")?;
        check_range("epsilon_decay", self.epsilon_decay, |v| v > 0.0 && v <= 1.0, "must be in (0, 1]")?;
        check_range("min_epsilon", self.min_epsilon, unit_interval, "must be in [0, 1]")?;
        check_range(
            "negative_reward_scale",
            self.negative_reward_scale,
            |v| v > 0.0 && v.is_finite(),
            "must be positive",
        )?;
        if self.energy_levels == 0 {
            return Err(LearningError::ZeroLevels {
                name: "energy_levels",
            });
        }
        if self.inventory_levels == 0 {
            return Err(LearningError::ZeroLevels {
                name: "inventory_levels",
            });
        }
        Ok(())
    }

    /// The quantization parameters shared by every state extraction.
    pub const fn discretization(&self) -> Discretization {
        Discretization {
            energy_levels: self.energy_levels,
            inventory_levels: self.inventory_levels,
        }
    }
}

/// Quantization levels used to bucket continuous agent attributes.
///
/// One value is fixed for a whole run so that equal states always mean the
/// same bucketed situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discretization {
    /// Buckets for energy.
    pub energy_levels: u32,
    /// Buckets for inventory fill.
    pub inventory_levels: u32,
}

impl Default for Discretization {
    fn default() -> Self {
        LearningConfig::default().discretization()
    }
}

fn unit_interval(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

fn check_range(
    name: &'static str,
    value: f64,
    valid: impl Fn(f64) -> bool,
    reason: &'static str,
) -> Result<(), LearningError> {
    if valid(value) {
        Ok(())
    } else {
        Err(LearningError::InvalidParameter {
            name,
            value,
            reason,
        })
    }
}

const fn default_learning_rate() -> f64 {
    0.1
}

const fn default_discount_factor() -> f64 {
    0.9
}

const fn default_epsilon() -> f64 {
    0.1
}

const fn default_epsilon_decay() -> f64 {
    1.0
}

const fn default_min_epsilon() -> f64 {
    0.01
}

const fn default_negative_reward_scale() -> f64 {
    1.0
}

const fn default_levels() -> u32 {
    3
}
