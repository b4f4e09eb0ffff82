//! Market and house tuning.
//!
//! Mirrors the `market` and `house` sections of `microsociety-config.yaml`.

use std::collections::BTreeMap;

use microsociety_types::{BUSH, STONE, WOOD};
use serde::Deserialize;

/// Pricing and clearing parameters for the [`Market`](crate::Market).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketConfig {
    /// Multiplier on the base price when an agent buys (must exceed 1).
    #[serde(default = "default_buy_margin")]
    pub buy_margin: f64,

    /// Multiplier on the base price when an agent sells (must be below 1).
    #[serde(default = "default_sell_margin")]
    pub sell_margin: f64,

    /// Sensitivity `k` of the per-trade price adjustment.
    #[serde(default = "default_price_adjustment_factor")]
    pub price_adjustment_factor: f64,

    /// Floor for every base price.
    #[serde(default = "default_minimum_price")]
    pub minimum_price: f64,

    /// Base price for items first referenced by a trade.
    #[serde(default = "default_price")]
    pub default_price: f64,

    /// Items listed at start, with their base prices.
    #[serde(default = "default_initial_prices")]
    pub initial_prices: BTreeMap<String, f64>,

    /// Demand counter for a newly listed item.
    #[serde(default = "default_initial_demand")]
    pub initial_demand: u32,

    /// Supply counter for a newly listed item.
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u32,

    /// Number of recent prices kept per item.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Seconds of simulated time between stabilization passes.
    #[serde(default = "default_stabilization_interval")]
    pub stabilization_interval: f64,

    /// Fraction of the gap to the target closed per second.
    #[serde(default = "default_stabilization_rate")]
    pub stabilization_rate: f64,

    /// Price the stabilization target is anchored to.
    #[serde(default = "default_price")]
    pub anchor_price: f64,

    /// How strongly the demand/supply ratio moves the target.
    #[serde(default = "default_target_sensitivity")]
    pub target_sensitivity: f64,

    /// Randomly nudge demand and supply before each stabilization pass.
    #[serde(default = "default_true")]
    pub drift_enabled: bool,

    /// Lower bound for drifted demand and supply counters.
    #[serde(default = "default_drift_floor")]
    pub drift_floor: u32,

    /// Minimum demand for an item to be suggested as a purchase.
    #[serde(default = "default_suggestion_demand_floor")]
    pub suggestion_demand_floor: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            buy_margin: default_buy_margin(),
            sell_margin: default_sell_margin(),
            price_adjustment_factor: default_price_adjustment_factor(),
            minimum_price: default_minimum_price(),
            default_price: default_price(),
            initial_prices: default_initial_prices(),
            initial_demand: default_initial_demand(),
            initial_supply: default_initial_supply(),
            history_capacity: default_history_capacity(),
            stabilization_interval: default_stabilization_interval(),
            stabilization_rate: default_stabilization_rate(),
            anchor_price: default_price(),
            target_sensitivity: default_target_sensitivity(),
            drift_enabled: true,
            drift_floor: default_drift_floor(),
            suggestion_demand_floor: default_suggestion_demand_floor(),
        }
    }
}

/// Upgrade ladder and storage parameters for the [`House`](crate::House).
///
/// Every derived value grows linearly with the level:
/// `base + per_level * (level - 1)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HouseConfig {
    /// Level the house starts at (at least 1).
    #[serde(default = "default_initial_level")]
    pub initial_level: u32,

    /// Fixed part of the upgrade cost.
    #[serde(default = "default_base_upgrade_cost")]
    pub base_upgrade_cost: f64,

    /// Coefficient of the `level^1.5` part of the upgrade cost.
    #[serde(default = "default_upgrade_cost_coefficient")]
    pub upgrade_cost_coefficient: f64,

    /// Wood needed for the first upgrade; one more per level after that.
    #[serde(default = "default_base_requirement")]
    pub base_wood_requirement: u32,

    /// Stone needed for the first upgrade; one more per level after that.
    #[serde(default = "default_base_requirement")]
    pub base_stone_requirement: u32,

    /// Bush needed for the first upgrade; one more per level after that.
    #[serde(default = "default_base_requirement")]
    pub base_bush_requirement: u32,

    /// Storage capacity at level 1.
    #[serde(default = "default_storage_step")]
    pub base_storage_capacity: u32,

    /// Storage added per level.
    #[serde(default = "default_storage_step")]
    pub storage_per_level: u32,

    /// Energy restored by one regeneration at level 1.
    #[serde(default = "default_base_energy_regen")]
    pub base_energy_regen: f64,

    /// Regeneration added per level.
    #[serde(default = "default_one")]
    pub energy_regen_per_level: f64,

    /// Health bonus at level 1, also the increment per level.
    #[serde(default = "default_health_bonus")]
    pub health_bonus_per_level: f64,

    /// Strength bonus at level 1, also the increment per level.
    #[serde(default = "default_strength_bonus")]
    pub strength_bonus_per_level: f64,

    /// Speed bonus at level 1, also the increment per level.
    #[serde(default = "default_one")]
    pub speed_bonus_per_level: f64,
}

impl Default for HouseConfig {
    fn default() -> Self {
        Self {
            initial_level: default_initial_level(),
            base_upgrade_cost: default_base_upgrade_cost(),
            upgrade_cost_coefficient: default_upgrade_cost_coefficient(),
            base_wood_requirement: default_base_requirement(),
            base_stone_requirement: default_base_requirement(),
            base_bush_requirement: default_base_requirement(),
            base_storage_capacity: default_storage_step(),
            storage_per_level: default_storage_step(),
            base_energy_regen: default_base_energy_regen(),
            energy_regen_per_level: default_one(),
            health_bonus_per_level: default_health_bonus(),
            strength_bonus_per_level: default_strength_bonus(),
            speed_bonus_per_level: default_one(),
        }
    }
}

impl HouseConfig {
    /// Base requirement for an upgrade resource, 0 for anything else.
    pub fn base_requirement(&self, item: &str) -> u32 {
        match item {
            WOOD => self.base_wood_requirement,
            STONE => self.base_stone_requirement,
            BUSH => self.base_bush_requirement,
            _ => 0,
        }
    }
}

const fn default_buy_margin() -> f64 {
    1.1
}

const fn default_sell_margin() -> f64 {
    0.9
}

const fn default_price_adjustment_factor() -> f64 {
    0.2
}

const fn default_minimum_price() -> f64 {
    1.0
}

const fn default_price() -> f64 {
    10.0
}

fn default_initial_prices() -> BTreeMap<String, f64> {
    BTreeMap::from([
        (WOOD.to_owned(), 10.0),
        (STONE.to_owned(), 12.0),
        (BUSH.to_owned(), 8.0),
    ])
}

const fn default_initial_demand() -> u32 {
    50
}

const fn default_initial_supply() -> u32 {
    100
}

const fn default_history_capacity() -> usize {
    10
}

const fn default_stabilization_interval() -> f64 {
    2.0
}

const fn default_stabilization_rate() -> f64 {
    0.1
}

const fn default_target_sensitivity() -> f64 {
    0.05
}

const fn default_true() -> bool {
    true
}

const fn default_drift_floor() -> u32 {
    10
}

const fn default_suggestion_demand_floor() -> u32 {
    5
}

const fn default_initial_level() -> u32 {
    1
}

const fn default_base_upgrade_cost() -> f64 {
    100.0
}

const fn default_upgrade_cost_coefficient() -> f64 {
    50.0
}

const fn default_base_requirement() -> u32 {
    3
}

const fn default_storage_step() -> u32 {
    10
}

const fn default_base_energy_regen() -> f64 {
    20.0
}

const fn default_one() -> f64 {
    1.0
}

const fn default_health_bonus() -> f64 {
    5.0
}

const fn default_strength_bonus() -> f64 {
    2.0
}
