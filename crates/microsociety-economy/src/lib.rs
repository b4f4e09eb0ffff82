//! Market and house economics for the MicroSociety simulation.
//!
//! The [`Market`] forms prices from per-item demand and supply counters and
//! clears trades against an agent's wallet and inventory. The [`House`] is
//! the shared dwelling: leveled storage, energy regeneration, and an
//! upgrade ladder gated on money and stored resources.
//!
//! Both are touched by many agents across ticks but by exactly one agent at
//! a time, so neither needs interior synchronization.
//!
//! # Modules
//!
//! - [`config`] -- Market and house tuning.
//! - [`error`] -- Trade and house error types.
//! - [`market`] -- Pricing, clearing, stabilization, history, suggestions.
//! - [`house`] -- Storage, upgrades, regeneration, and stat bonuses.

pub mod config;
pub mod error;
pub mod house;
pub mod market;

pub use config::{HouseConfig, MarketConfig};
pub use error::{HouseError, MarketError};
pub use house::{House, UpgradeReceipt};
pub use market::{
    MIN_QUOTE, Market, PriceTrend, TradeReceipt, adjust_price_on_buy, adjust_price_on_sell, round_to_tenth,
};
