//! Dynamic-pricing market.
//!
//! Each listed item carries a base price, demand and supply counters, a
//! bounded price history, and running transaction statistics. Agents never
//! pay the base price directly: buying costs `price * buy_margin` and
//! selling yields `price * sell_margin`, both rounded to one decimal and
//! floored at [`MIN_QUOTE`].
//!
//! # Price formation
//!
//! - A buy raises demand, lowers supply, and calls [`adjust_price_on_buy`]
//! - A sell raises supply, lowers demand, and calls [`adjust_price_on_sell`]
//! - Every `stabilization_interval` seconds, [`Market::update`] optionally
//!   drifts the counters and then pulls each price toward a
//!   demand/supply-implied target, recording it in the history ring
//!
//! A single trade can at most double a price, and a sell can at most halve
//! it. No price ever drops below `minimum_price`.

use std::collections::{BTreeMap, VecDeque};

use microsociety_agents::{Inventory, NpcAgent};
use microsociety_types::ESSENTIAL_ITEMS;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::MarketConfig;
use crate::error::MarketError;

/// Smallest per-unit quote. Rounding never turns a trade into a free one.
pub const MIN_QUOTE: f64 = 0.1;

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// New base price after a buy.
///
/// `clamp(price * (1 + k * demand / max(supply, 1)), min_price, price * 2)`.
pub fn adjust_price_on_buy(price: f64, demand: u32, supply: u32, k: f64, min_price: f64) -> f64 {
    let pressure = f64::from(demand) / f64::from(supply.max(1));
    let raw = price * (1.0 + k * pressure);
    let upper = (price * 2.0).max(min_price);
    raw.clamp(min_price, upper)
}

/// New base price after a sell.
///
/// `clamp(price * (1 - k * supply / max(demand, 1)), max(min_price, price / 2), price * 2)`.
pub fn adjust_price_on_sell(price: f64, demand: u32, supply: u32, k: f64, min_price: f64) -> f64 {
    let pressure = f64::from(supply) / f64::from(demand.max(1));
    let raw = price * (1.0 - k * pressure);
    let lower = (price / 2.0).max(min_price);
    let upper = (price * 2.0).max(lower);
    raw.clamp(lower, upper)
}

/// Direction of an item's recent prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceTrend {
    /// Latest recorded price above the oldest.
    Rising,
    /// Latest recorded price below the oldest.
    Falling,
    /// Unchanged, or fewer than two recorded prices.
    Flat,
}

/// Result of a completed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    /// The item traded.
    pub item: String,
    /// Units traded.
    pub quantity: u32,
    /// Price per unit paid or received.
    pub unit_price: f64,
    /// Total money moved.
    pub total: f64,
    /// Base price after the adjustment.
    pub new_price: f64,
}

/// Per-item market state.
#[derive(Debug, Clone, PartialEq)]
struct Listing {
    price: f64,
    demand: u32,
    supply: u32,
    history: VecDeque<f64>,
    bought: u32,
    sold: u32,
    revenue: f64,
    expenditure: f64,
}

impl Listing {
    const fn new(price: f64, demand: u32, supply: u32) -> Self {
        Self {
            price,
            demand,
            supply,
            history: VecDeque::new(),
            bought: 0,
            sold: 0,
            revenue: 0.0,
            expenditure: 0.0,
        }
    }

    fn record_price(&mut self, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while self.history.len() >= capacity {
            self.history.pop_front();
        }
        self.history.push_back(self.price);
    }
}

/// The market shared by all agents.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    listings: BTreeMap<String, Listing>,
    config: MarketConfig,
    since_stabilization: f64,
}

impl Market {
    /// Create a market with the configured initial listings.
    pub fn new(config: MarketConfig) -> Self {
        let mut market = Self {
            listings: BTreeMap::new(),
            config,
            since_stabilization: 0.0,
        };
        let initial: Vec<(String, f64)> = market
            .config
            .initial_prices
            .iter()
            .map(|(item, price)| (item.clone(), *price))
            .collect();
        for (item, price) in initial {
            // Keys come from a map, so none repeat; empty keys are skipped.
            market.set_price(&item, price);
        }
        market
    }

    /// The market configuration.
    pub const fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// List `item` at `price` with the initial demand and supply.
    ///
    /// Already listed items are left unchanged; prices only move through
    /// trades and stabilization after that. Returns whether a new listing
    /// was created.
    pub fn set_price(&mut self, item: &str, price: f64) -> bool {
        if item.is_empty() || self.listings.contains_key(item) {
            return false;
        }
        let price = if price.is_finite() {
            price.max(self.config.minimum_price)
        } else {
            self.config.default_price.max(self.config.minimum_price)
        };
        self.listings.insert(
            item.to_owned(),
            Listing::new(price, self.config.initial_demand, self.config.initial_supply),
        );
        true
    }

    fn ensure_listed(&mut self, item: &str) {
        let price = self.config.default_price;
        self.set_price(item, price);
    }

    fn listing_mut(&mut self, item: &str) -> Option<&mut Listing> {
        self.ensure_listed(item);
        self.listings.get_mut(item)
    }

    fn base_price(&self, item: &str) -> f64 {
        self.listings
            .get(item)
            .map_or_else(|| self.config.default_price.max(self.config.minimum_price), |l| l.price)
    }

    /// Whether `item` is listed.
    pub fn is_listed(&self, item: &str) -> bool {
        self.listings.contains_key(item)
    }

    /// Base price of a listed item.
    pub fn price(&self, item: &str) -> Option<f64> {
        self.listings.get(item).map(|l| l.price)
    }

    /// Demand counter of a listed item.
    pub fn demand(&self, item: &str) -> Option<u32> {
        self.listings.get(item).map(|l| l.demand)
    }

    /// Supply counter of a listed item.
    pub fn supply(&self, item: &str) -> Option<u32> {
        self.listings.get(item).map(|l| l.supply)
    }

    /// Snapshot of every base price.
    pub fn prices(&self) -> BTreeMap<String, f64> {
        self.listings
            .iter()
            .map(|(item, l)| (item.clone(), l.price))
            .collect()
    }

    /// Per-unit cost of buying `item`, rounded to one decimal and never
    /// below [`MIN_QUOTE`].
    ///
    /// Unlisted items are quoted at the default price they would be listed
    /// at on first trade.
    pub fn calculate_buy_price(&self, item: &str) -> f64 {
        round_to_tenth(self.base_price(item) * self.config.buy_margin).max(MIN_QUOTE)
    }

    /// Per-unit proceeds of selling `item`, rounded to one decimal and never
    /// below [`MIN_QUOTE`].
    pub fn calculate_sell_price(&self, item: &str) -> f64 {
        round_to_tenth(self.base_price(item) * self.config.sell_margin).max(MIN_QUOTE)
    }

    /// Buy `quantity` units of `item` for `agent`.
    ///
    /// Unknown items are listed at the default price first. On success the
    /// agent pays, receives the items, demand rises, supply falls (floored
    /// at 0), and the price is re-derived.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] for empty names, zero quantities, missing
    /// funds, or missing inventory room. Nothing changes on error, except
    /// that a valid unknown item stays listed.
    pub fn buy_item(
        &mut self,
        agent: &mut NpcAgent,
        item: &str,
        quantity: u32,
    ) -> Result<TradeReceipt, MarketError> {
        validate(item, quantity)?;
        self.ensure_listed(item);
        let unit_price = self.calculate_buy_price(item);
        let total = unit_price * f64::from(quantity);
        let available = agent.vitals.money();
        if available < total {
            return Err(MarketError::InsufficientFunds {
                item: item.to_owned(),
                quantity,
                required: total,
                available,
            });
        }
        let free = agent.inventory.remaining_capacity();
        if free < quantity {
            return Err(MarketError::NoInventoryRoom {
                item: item.to_owned(),
                quantity,
                free,
            });
        }

        agent.inventory.add_item(item, quantity)?;
        agent.vitals.spend(total)?;

        let k = self.config.price_adjustment_factor;
        let min_price = self.config.minimum_price;
        let listing = self.listing_mut(item).ok_or(MarketError::EmptyItemName)?;
        listing.demand = listing.demand.saturating_add(quantity);
        listing.supply = listing.supply.saturating_sub(quantity);
        listing.price = adjust_price_on_buy(listing.price, listing.demand, listing.supply, k, min_price);
        listing.bought = listing.bought.saturating_add(quantity);
        listing.expenditure += total;
        let new_price = listing.price;

        debug!(agent = %agent.id, item, quantity, unit_price, new_price, "market buy");
        Ok(TradeReceipt {
            item: item.to_owned(),
            quantity,
            unit_price,
            total,
            new_price,
        })
    }

    /// Sell `quantity` units of `item` from `agent`.
    ///
    /// The mirror of [`Market::buy_item`]: the agent gives up the items and
    /// is paid, supply rises, demand falls (floored at 0), and the price is
    /// re-derived.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] for empty names, zero quantities, or when the
    /// agent holds fewer than `quantity` units.
    pub fn sell_item(
        &mut self,
        agent: &mut NpcAgent,
        item: &str,
        quantity: u32,
    ) -> Result<TradeReceipt, MarketError> {
        validate(item, quantity)?;
        let available = agent.inventory.quantity(item);
        if available < quantity {
            return Err(MarketError::InsufficientItems {
                item: item.to_owned(),
                quantity,
                available,
            });
        }
        self.ensure_listed(item);
        let unit_price = self.calculate_sell_price(item);
        let total = unit_price * f64::from(quantity);

        agent.inventory.remove_item(item, quantity)?;
        agent.vitals.earn(total)?;

        let k = self.config.price_adjustment_factor;
        let min_price = self.config.minimum_price;
        let listing = self.listing_mut(item).ok_or(MarketError::EmptyItemName)?;
        listing.supply = listing.supply.saturating_add(quantity);
        listing.demand = listing.demand.saturating_sub(quantity);
        listing.price = adjust_price_on_sell(listing.price, listing.demand, listing.supply, k, min_price);
        listing.sold = listing.sold.saturating_add(quantity);
        listing.revenue += total;
        let new_price = listing.price;

        debug!(agent = %agent.id, item, quantity, unit_price, new_price, "market sell");
        Ok(TradeReceipt {
            item: item.to_owned(),
            quantity,
            unit_price,
            total,
            new_price,
        })
    }

    /// Advance the market clock by `dt` seconds.
    ///
    /// Once `stabilization_interval` has elapsed, runs the drift pass (when
    /// enabled) and a stabilization pass over the elapsed time. Returns
    /// whether a pass ran.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) -> bool {
        if !dt.is_finite() || dt <= 0.0 {
            return false;
        }
        self.since_stabilization += dt;
        if self.since_stabilization < self.config.stabilization_interval {
            return false;
        }
        let elapsed = self.since_stabilization;
        self.since_stabilization = 0.0;
        if self.config.drift_enabled {
            self.drift_demand_supply(rng);
        }
        self.stabilize_prices(elapsed);
        true
    }

    /// Nudge every demand and supply counter by -1, 0, or +1, floored at
    /// `drift_floor`.
    pub fn drift_demand_supply<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let floor = self.config.drift_floor;
        for listing in self.listings.values_mut() {
            listing.demand = drift(listing.demand, rng.random_range(-1..=1), floor);
            listing.supply = drift(listing.supply, rng.random_range(-1..=1), floor);
        }
    }

    /// Pull every price toward its demand/supply-implied target.
    ///
    /// `target = anchor * (1 + (demand / (supply + 1) - 1) * sensitivity)`,
    /// and the price closes `dt * rate` of the gap (at most all of it). The
    /// resulting price is appended to the history ring.
    pub fn stabilize_prices(&mut self, dt: f64) {
        let step = (dt * self.config.stabilization_rate).clamp(0.0, 1.0);
        let anchor = self.config.anchor_price;
        let sensitivity = self.config.target_sensitivity;
        let min_price = self.config.minimum_price;
        let capacity = self.config.history_capacity;
        for (item, listing) in &mut self.listings {
            let ratio = f64::from(listing.demand) / (f64::from(listing.supply) + 1.0);
            let target = anchor * (1.0 + (ratio - 1.0) * sensitivity);
            listing.price = (listing.price + (target - listing.price) * step).max(min_price);
            listing.record_price(capacity);
            trace!(item = item.as_str(), price = listing.price, target, "price stabilized");
        }
    }

    /// Recorded prices for `item`, oldest first.
    pub fn history(&self, item: &str) -> Vec<f64> {
        self.listings
            .get(item)
            .map(|l| l.history.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Population standard deviation of the recorded prices.
    ///
    /// 0 with fewer than two recorded prices.
    pub fn volatility(&self, item: &str) -> f64 {
        let Some(listing) = self.listings.get(item) else {
            return 0.0;
        };
        let n = listing.history.len();
        if n < 2 {
            return 0.0;
        }
        let count = n as f64;
        let mean = listing.history.iter().sum::<f64>() / count;
        let variance = listing
            .history
            .iter()
            .map(|p| (p - mean).powi(2))
            .sum::<f64>()
            / count;
        variance.sqrt()
    }

    /// Direction from the oldest to the newest recorded price.
    pub fn price_trend(&self, item: &str) -> PriceTrend {
        let Some(listing) = self.listings.get(item) else {
            return PriceTrend::Flat;
        };
        match (listing.history.front(), listing.history.back()) {
            (Some(first), Some(last)) if listing.history.len() >= 2 => {
                let delta = last - first;
                if delta > f64::EPSILON {
                    PriceTrend::Rising
                } else if delta < -f64::EPSILON {
                    PriceTrend::Falling
                } else {
                    PriceTrend::Flat
                }
            }
            _ => PriceTrend::Flat,
        }
    }

    /// The cheapest essential item to buy among those still in demand.
    ///
    /// Ties go to the earlier item in [`ESSENTIAL_ITEMS`].
    pub fn suggest_best_to_buy(&self) -> Option<&'static str> {
        let floor = self.config.suggestion_demand_floor;
        let mut best: Option<(&'static str, f64)> = None;
        for item in ESSENTIAL_ITEMS {
            let Some(listing) = self.listings.get(item) else {
                continue;
            };
            if listing.demand <= floor {
                continue;
            }
            let price = self.calculate_buy_price(item);
            if best.is_none_or(|(_, best_price)| price < best_price) {
                best = Some((item, price));
            }
        }
        best.map(|(item, _)| item)
    }

    /// The essential item that sells for the most among those the seller
    /// holds more than `reserve` of.
    pub fn suggest_best_to_sell(&self, inventory: &Inventory, reserve: u32) -> Option<&'static str> {
        let mut best: Option<(&'static str, f64)> = None;
        for item in ESSENTIAL_ITEMS {
            if inventory.quantity(item) <= reserve {
                continue;
            }
            let price = self.calculate_sell_price(item);
            if best.is_none_or(|(_, best_price)| price > best_price) {
                best = Some((item, price));
            }
        }
        best.map(|(item, _)| item)
    }

    /// Lowest buy price across the essential items.
    pub fn cheapest_buy_price(&self) -> f64 {
        ESSENTIAL_ITEMS
            .iter()
            .map(|item| self.calculate_buy_price(item))
            .fold(f64::INFINITY, f64::min)
    }

    /// Units of `item` bought by agents since the last reset.
    pub fn buy_transactions(&self, item: &str) -> u32 {
        self.listings.get(item).map_or(0, |l| l.bought)
    }

    /// Units of `item` sold by agents since the last reset.
    pub fn sell_transactions(&self, item: &str) -> u32 {
        self.listings.get(item).map_or(0, |l| l.sold)
    }

    /// Money paid out to sellers of `item` since the last reset.
    pub fn revenue(&self, item: &str) -> f64 {
        self.listings.get(item).map_or(0.0, |l| l.revenue)
    }

    /// Money taken from buyers of `item` since the last reset.
    pub fn expenditure(&self, item: &str) -> f64 {
        self.listings.get(item).map_or(0.0, |l| l.expenditure)
    }

    /// Units bought across all items.
    pub fn total_items_bought(&self) -> u32 {
        self.listings
            .values()
            .fold(0_u32, |acc, l| acc.saturating_add(l.bought))
    }

    /// Units sold across all items.
    pub fn total_items_sold(&self) -> u32 {
        self.listings
            .values()
            .fold(0_u32, |acc, l| acc.saturating_add(l.sold))
    }

    /// Zero every transaction counter; prices and counters are kept.
    pub fn reset_transactions(&mut self) {
        for listing in self.listings.values_mut() {
            listing.bought = 0;
            listing.sold = 0;
            listing.revenue = 0.0;
            listing.expenditure = 0.0;
        }
    }
}

fn validate(item: &str, quantity: u32) -> Result<(), MarketError> {
    if item.is_empty() {
        return Err(MarketError::EmptyItemName);
    }
    if quantity == 0 {
        return Err(MarketError::ZeroQuantity {
            item: item.to_owned(),
        });
    }
    Ok(())
}

fn drift(value: u32, step: i32, floor: u32) -> u32 {
    let moved = match step {
        s if s > 0 => value.saturating_add(s.unsigned_abs()),
        s => value.saturating_sub(s.unsigned_abs()),
    };
    moved.max(floor)
}
