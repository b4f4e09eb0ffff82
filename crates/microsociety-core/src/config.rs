//! Configuration loading and typed config structures for the MicroSociety
//! simulation.
//!
//! The canonical configuration lives in `microsociety-config.yaml` at the
//! project root. Each section maps onto the settings struct of the crate
//! that owns the behavior; every field has a default, so an empty document
//! describes the stock simulation.

use std::path::{Path, PathBuf};

use microsociety_agents::AgentConfig;
use microsociety_economy::{HouseConfig, MarketConfig};
use microsociety_learning::LearningConfig;
use microsociety_world::GenerationParams;
use serde::Deserialize;

use crate::actions::{ActionTuning, RewardConfig};
use crate::feedback::ExperienceConfig;
use crate::router::RouterConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is inconsistent.
    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        /// Dotted path of the offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `microsociety-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Grid, seed, and timing.
    #[serde(default)]
    pub world: WorldSettings,

    /// Agent population and attributes.
    #[serde(default)]
    pub agents: AgentConfig,

    /// Q-learning hyperparameters.
    #[serde(default)]
    pub learning: LearningConfig,

    /// Decision router tuning.
    #[serde(default)]
    pub router: RouterConfig,

    /// Reward magnitudes.
    #[serde(default)]
    pub rewards: RewardConfig,

    /// Executor costs, gains, and cooldowns.
    #[serde(default)]
    pub actions: ActionTuning,

    /// Market pricing.
    #[serde(default)]
    pub market: MarketConfig,

    /// House ladder and storage.
    #[serde(default)]
    pub house: HouseConfig,

    /// Experience recording and terminal thresholds.
    #[serde(default)]
    pub experience: ExperienceConfig,

    /// Optional frozen policy used as the external model.
    #[serde(default)]
    pub external_model: ExternalModelConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a setting is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a setting is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        require(world.width >= 2 && world.height >= 1, "world.width", "must be at least 2x1 tiles")?;
        require(positive(world.tile_size), "world.tile_size", "must be positive")?;
        for (field, value) in [
            ("world.tree_density", world.tree_density),
            ("world.rock_density", world.rock_density),
            ("world.bush_density", world.bush_density),
            ("world.regrowth_chance", world.regrowth_chance),
            ("router.sell_probability", self.router.sell_probability),
        ] {
            require(probability(value), field, "must be in [0, 1]")?;
        }
        require(
            world.tree_density + world.rock_density + world.bush_density <= 1.0,
            "world.tree_density",
            "densities must sum to at most 1",
        )?;
        require(positive(world.tick_delta), "world.tick_delta", "must be positive")?;

        self.learning.validate().map_err(|err| ConfigError::Invalid {
            field: "learning",
            reason: err.to_string(),
        })?;

        let market = &self.market;
        require(market.buy_margin > 1.0, "market.buy_margin", "must exceed 1")?;
        require(
            market.sell_margin > 0.0 && market.sell_margin < 1.0,
            "market.sell_margin",
            "must be in (0, 1)",
        )?;
        require(positive(market.minimum_price), "market.minimum_price", "must be positive")?;
        require(
            market.price_adjustment_factor >= 0.0 && market.price_adjustment_factor.is_finite(),
            "market.price_adjustment_factor",
            "must be non-negative",
        )?;
        require(
            positive(market.stabilization_interval),
            "market.stabilization_interval",
            "must be positive",
        )?;

        require(self.agents.inventory_capacity > 0, "agents.inventory_capacity", "must be positive")?;
        require(positive(self.agents.max_energy), "agents.max_energy", "must be positive")?;
        require(
            self.actions.action_cooldown >= 0.0 && self.actions.regenerate_cooldown >= 0.0,
            "actions.action_cooldown",
            "cooldowns must be non-negative",
        )?;

        if self.external_model.enabled && self.external_model.policy_path.is_none() {
            return Err(ConfigError::Invalid {
                field: "external_model.policy_path",
                reason: String::from("is required when the external model is enabled"),
            });
        }
        Ok(())
    }
}

fn require(ok: bool, field: &'static str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: reason.to_owned(),
        })
    }
}

fn positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

fn probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// World-level settings: grid, seed, and timing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldSettings {
    /// Seed for world generation, agent policies, and the tick RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Grid width in tiles.
    #[serde(default = "default_grid_size")]
    pub width: u32,

    /// Grid height in tiles.
    #[serde(default = "default_grid_size")]
    pub height: u32,

    /// Tile edge length in world units.
    #[serde(default = "default_tile_size")]
    pub tile_size: f64,

    /// Probability that a free tile starts with a tree.
    #[serde(default = "default_tree_density")]
    pub tree_density: f64,

    /// Probability that a free tile starts with a rock.
    #[serde(default = "default_rock_density")]
    pub rock_density: f64,

    /// Probability that a free tile starts with a bush.
    #[serde(default = "default_bush_density")]
    pub bush_density: f64,

    /// Per-tick chance that an empty tile regrows a resource.
    #[serde(default = "default_regrowth_chance")]
    pub regrowth_chance: f64,

    /// Simulated seconds per tick.
    #[serde(default = "default_tick_delta")]
    pub tick_delta: f64,

    /// Stop after this many ticks (0 runs until every agent is dead).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Real-time pause between ticks in the engine binary, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            width: default_grid_size(),
            height: default_grid_size(),
            tile_size: default_tile_size(),
            tree_density: default_tree_density(),
            rock_density: default_rock_density(),
            bush_density: default_bush_density(),
            regrowth_chance: default_regrowth_chance(),
            tick_delta: default_tick_delta(),
            max_ticks: default_max_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl WorldSettings {
    /// Parameters for world generation.
    pub const fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            width: self.width,
            height: self.height,
            tile_size: self.tile_size,
            tree_density: self.tree_density,
            rock_density: self.rock_density,
            bush_density: self.bush_density,
        }
    }
}

/// External model settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExternalModelConfig {
    /// Load a frozen policy and offer it to agents with the model flag.
    #[serde(default)]
    pub enabled: bool,

    /// JSON file holding the exported greedy policy.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,

    /// Where the engine writes the best agent's greedy policy at shutdown.
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Log a tick summary every N ticks.
    #[serde(default = "default_summary_interval_ticks")]
    pub summary_interval_ticks: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            summary_interval_ticks: default_summary_interval_ticks(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_grid_size() -> u32 {
    25
}

const fn default_tile_size() -> f64 {
    32.0
}

const fn default_tree_density() -> f64 {
    0.08
}

const fn default_rock_density() -> f64 {
    0.05
}

const fn default_bush_density() -> f64 {
    0.06
}

const fn default_regrowth_chance() -> f64 {
    0.002
}

const fn default_tick_delta() -> f64 {
    1.0
}

const fn default_max_ticks() -> u64 {
    1_000
}

const fn default_tick_interval_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_summary_interval_ticks() -> u64 {
    50
}
