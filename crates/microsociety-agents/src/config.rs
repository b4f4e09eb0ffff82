//! Configuration for agent attributes and decision flags.
//!
//! Mirrors the `agents` section of `microsociety-config.yaml`. Every field
//! has a default, so an empty section yields the stock population: ten
//! NPCs with full health and energy, ten inventory slots, and Q-learning
//! enabled.

use serde::Deserialize;

use crate::vitals::AttributeLimits;

/// Population, attribute, and decision settings for spawned agents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// Number of NPCs spawned at simulation start.
    #[serde(default = "default_count")]
    pub count: u32,

    /// Maximum health.
    #[serde(default = "default_max_vital")]
    pub max_health: f64,

    /// Maximum energy.
    #[serde(default = "default_max_vital")]
    pub max_energy: f64,

    /// Maximum speed.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Maximum strength.
    #[serde(default = "default_max_strength")]
    pub max_strength: f64,

    /// Maximum money an agent can hold.
    #[serde(default = "default_max_money")]
    pub max_money: f64,

    /// Health at spawn.
    #[serde(default = "default_max_vital")]
    pub initial_health: f64,

    /// Energy at spawn.
    #[serde(default = "default_max_vital")]
    pub initial_energy: f64,

    /// Speed at spawn.
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,

    /// Strength at spawn.
    #[serde(default = "default_initial_strength")]
    pub initial_strength: f64,

    /// Money at spawn.
    #[serde(default = "default_initial_money")]
    pub initial_money: f64,

    /// Inventory capacity in items.
    #[serde(default = "default_inventory_capacity")]
    pub inventory_capacity: u32,

    /// Energy lost per second of simulated time.
    #[serde(default = "default_energy_decay")]
    pub energy_decay_per_second: f64,

    /// Penalty added once when an agent dies.
    #[serde(default = "default_death_penalty")]
    pub death_penalty: f64,

    /// Whether agents consult their Q-learning policy.
    #[serde(default = "default_true")]
    pub use_q_learning: bool,

    /// Whether agents consult the external model when one is loaded.
    #[serde(default)]
    pub use_external_model: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            max_health: default_max_vital(),
            max_energy: default_max_vital(),
            max_speed: default_max_speed(),
            max_strength: default_max_strength(),
            max_money: default_max_money(),
            initial_health: default_max_vital(),
            initial_energy: default_max_vital(),
            initial_speed: default_initial_speed(),
            initial_strength: default_initial_strength(),
            initial_money: default_initial_money(),
            inventory_capacity: default_inventory_capacity(),
            energy_decay_per_second: default_energy_decay(),
            death_penalty: default_death_penalty(),
            use_q_learning: true,
            use_external_model: false,
        }
    }
}

impl AgentConfig {
    /// The attribute maxima as a value the vitals can carry.
    pub const fn limits(&self) -> AttributeLimits {
        AttributeLimits {
            max_health: self.max_health,
            max_energy: self.max_energy,
            max_speed: self.max_speed,
            max_strength: self.max_strength,
            max_money: self.max_money,
        }
    }
}

const fn default_count() -> u32 {
    10
}

const fn default_max_vital() -> f64 {
    100.0
}

const fn default_max_speed() -> f64 {
    20.0
}

const fn default_max_strength() -> f64 {
    100.0
}

const fn default_max_money() -> f64 {
    100_000.0
}

const fn default_initial_speed() -> f64 {
    5.0
}

const fn default_initial_strength() -> f64 {
    10.0
}

const fn default_initial_money() -> f64 {
    50.0
}

const fn default_inventory_capacity() -> u32 {
    10
}

const fn default_energy_decay() -> f64 {
    0.5
}

const fn default_death_penalty() -> f64 {
    -100.0
}

const fn default_true() -> bool {
    true
}
