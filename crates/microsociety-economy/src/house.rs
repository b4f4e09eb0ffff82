//! The shared house: leveled storage, energy regeneration, and upgrades.
//!
//! Every capacity and bonus derives from the current level, so an upgrade
//! only has to bump the level for storage and regeneration to grow.

use std::collections::BTreeMap;

use microsociety_agents::{Inventory, NpcAgent};
use microsociety_types::ESSENTIAL_ITEMS;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::HouseConfig;
use crate::error::HouseError;

/// Result of a successful upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeReceipt {
    /// Level after the upgrade.
    pub new_level: u32,
    /// Money paid.
    pub cost: f64,
    /// Resources consumed from storage.
    pub consumed: BTreeMap<String, u32>,
    /// Health granted to the upgrader.
    pub health_bonus: f64,
    /// Strength granted to the upgrader.
    pub strength_bonus: f64,
    /// Speed granted to the upgrader.
    pub speed_bonus: f64,
}

/// The house every agent can store items in and rest at.
#[derive(Debug, Clone, PartialEq)]
pub struct House {
    level: u32,
    storage: BTreeMap<String, u32>,
    config: HouseConfig,
}

impl House {
    /// Create an empty house at the configured initial level (at least 1).
    pub fn new(config: HouseConfig) -> Self {
        Self {
            level: config.initial_level.max(1),
            storage: BTreeMap::new(),
            config,
        }
    }

    /// Current level.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Levels gained beyond the first.
    const fn steps(&self) -> u32 {
        self.level.saturating_sub(1)
    }

    /// Total units the storage can hold at this level.
    pub const fn storage_capacity(&self) -> u32 {
        self.config
            .base_storage_capacity
            .saturating_add(self.config.storage_per_level.saturating_mul(self.steps()))
    }

    /// Energy restored by one regeneration at this level.
    pub fn energy_regen_rate(&self) -> f64 {
        self.config.base_energy_regen + self.config.energy_regen_per_level * f64::from(self.steps())
    }

    /// Health granted by this level.
    pub fn health_bonus(&self) -> f64 {
        self.config.health_bonus_per_level * f64::from(self.level)
    }

    /// Strength granted by this level.
    pub fn strength_bonus(&self) -> f64 {
        self.config.strength_bonus_per_level * f64::from(self.level)
    }

    /// Speed granted by this level.
    pub fn speed_bonus(&self) -> f64 {
        self.config.speed_bonus_per_level * f64::from(self.level)
    }

    /// Units currently stored.
    pub fn stored_total(&self) -> u32 {
        self.storage
            .values()
            .fold(0_u32, |acc, qty| acc.saturating_add(*qty))
    }

    /// Units of `item` in storage.
    pub fn stored_quantity(&self, item: &str) -> u32 {
        self.storage.get(item).copied().unwrap_or(0)
    }

    /// Stored items in key order.
    pub fn stored_items(&self) -> impl Iterator<Item = (&str, u32)> {
        self.storage.iter().map(|(item, qty)| (item.as_str(), *qty))
    }

    /// Units that can still be stored.
    pub fn remaining_capacity(&self) -> u32 {
        self.storage_capacity().saturating_sub(self.stored_total())
    }

    /// Whether no more units fit.
    pub fn is_storage_full(&self) -> bool {
        self.remaining_capacity() == 0
    }

    /// Money needed to go from the current level to the next.
    ///
    /// `base + coefficient * level^1.5`.
    pub fn upgrade_cost(&self) -> f64 {
        self.config.base_upgrade_cost
            + self.config.upgrade_cost_coefficient * f64::from(self.level).powf(1.5)
    }

    /// Units of `item` the next upgrade consumes from storage.
    pub fn requirement(&self, item: &str) -> u32 {
        match self.config.base_requirement(item) {
            0 => 0,
            base => base.saturating_add(self.steps()),
        }
    }

    /// Every resource the next upgrade consumes.
    pub fn requirements(&self) -> BTreeMap<String, u32> {
        ESSENTIAL_ITEMS
            .iter()
            .filter_map(|item| match self.requirement(item) {
                0 => None,
                qty => Some(((*item).to_owned(), qty)),
            })
            .collect()
    }

    /// Whether `money` covers the next upgrade and storage holds every
    /// required resource.
    pub fn is_upgrade_available(&self, money: f64) -> bool {
        self.check_upgrade(money).is_ok()
    }

    fn check_upgrade(&self, money: f64) -> Result<(), HouseError> {
        let next_level = self.level.saturating_add(1);
        let required = self.upgrade_cost();
        if money < required {
            return Err(HouseError::InsufficientFunds {
                next_level,
                required,
                available: money,
            });
        }
        for (item, required) in self.requirements() {
            let available = self.stored_quantity(&item);
            if available < required {
                return Err(HouseError::InsufficientResources {
                    next_level,
                    item,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Put `quantity` units of `item` into storage.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::StorageFull`] when the units do not fit, and a
    /// validation error for empty names or zero quantities.
    pub fn store_item(&mut self, item: &str, quantity: u32) -> Result<(), HouseError> {
        validate(item, quantity)?;
        let free = self.remaining_capacity();
        if quantity > free {
            return Err(HouseError::StorageFull {
                item: item.to_owned(),
                quantity,
                free,
            });
        }
        let slot = self.storage.entry(item.to_owned()).or_insert(0);
        *slot = slot.saturating_add(quantity);
        Ok(())
    }

    /// Move `quantity` units of `item` from `inventory` into storage.
    ///
    /// # Errors
    ///
    /// Fails without moving anything if storage lacks room or the inventory
    /// lacks the units.
    pub fn store_from(
        &mut self,
        inventory: &mut Inventory,
        item: &str,
        quantity: u32,
    ) -> Result<(), HouseError> {
        validate(item, quantity)?;
        let free = self.remaining_capacity();
        if quantity > free {
            return Err(HouseError::StorageFull {
                item: item.to_owned(),
                quantity,
                free,
            });
        }
        inventory.remove_item(item, quantity)?;
        self.store_item(item, quantity)
    }

    /// Move `quantity` units of `item` from storage into `inventory`.
    ///
    /// # Errors
    ///
    /// Fails without moving anything if storage holds too few units or the
    /// inventory lacks room.
    pub fn take_from_storage(
        &mut self,
        item: &str,
        quantity: u32,
        inventory: &mut Inventory,
    ) -> Result<(), HouseError> {
        validate(item, quantity)?;
        let available = self.stored_quantity(item);
        if available < quantity {
            return Err(HouseError::InsufficientStock {
                item: item.to_owned(),
                requested: quantity,
                available,
            });
        }
        let free = inventory.remaining_capacity();
        if free < quantity {
            return Err(HouseError::NoInventoryRoom {
                item: item.to_owned(),
                quantity,
                free,
            });
        }
        inventory.add_item(item, quantity)?;
        self.withdraw(item, quantity);
        Ok(())
    }

    fn withdraw(&mut self, item: &str, quantity: u32) {
        if let Some(slot) = self.storage.get_mut(item) {
            *slot = slot.saturating_sub(quantity);
            if *slot == 0 {
                self.storage.remove(item);
            }
        }
    }

    /// Upgrade the house on `agent`'s behalf.
    ///
    /// Checks money and stored resources first; only when everything is
    /// available does it charge the agent, consume the resources, raise the
    /// level, and grant the agent the new level's stat bonuses.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::InsufficientFunds`] or
    /// [`HouseError::InsufficientResources`]; the house and the agent are
    /// unchanged.
    pub fn upgrade(&mut self, agent: &mut NpcAgent) -> Result<UpgradeReceipt, HouseError> {
        self.check_upgrade(agent.vitals.money())?;
        let cost = self.upgrade_cost();
        let consumed = self.requirements();

        agent.vitals.spend(cost)?;
        for (item, qty) in &consumed {
            self.withdraw(item, *qty);
        }
        self.level = self.level.saturating_add(1);

        let receipt = UpgradeReceipt {
            new_level: self.level,
            cost,
            consumed,
            health_bonus: self.health_bonus(),
            strength_bonus: self.strength_bonus(),
            speed_bonus: self.speed_bonus(),
        };
        agent.vitals.change_health(receipt.health_bonus);
        agent.vitals.change_strength(receipt.strength_bonus);
        agent.vitals.change_speed(receipt.speed_bonus);

        info!(agent = %agent.id, level = self.level, cost, "house upgraded");
        Ok(receipt)
    }

    /// Restore energy to `agent` at this level's rate.
    ///
    /// Returns the energy actually gained after clamping to the maximum.
    pub fn regenerate_energy(&self, agent: &mut NpcAgent) -> f64 {
        let before = agent.vitals.energy();
        agent.vitals.change_energy(self.energy_regen_rate());
        let gained = agent.vitals.energy() - before;
        debug!(agent = %agent.id, gained, "energy regenerated at house");
        gained
    }
}

fn validate(item: &str, quantity: u32) -> Result<(), HouseError> {
    if item.is_empty() {
        return Err(HouseError::EmptyItemName);
    }
    if quantity == 0 {
        return Err(HouseError::ZeroQuantity {
            item: item.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use microsociety_agents::AgentConfig;
    use microsociety_learning::LearningConfig;
    use microsociety_types::{BUSH, Position, STONE, WOOD};

    use super::*;

    fn agent(money: f64, energy: f64) -> NpcAgent {
        let config = AgentConfig {
            initial_money: money,
            initial_energy: energy,
            initial_health: 50.0,
            ..AgentConfig::default()
        };
        NpcAgent::new("Builder", Position::default(), &config, &LearningConfig::default(), 0).unwrap()
    }

    fn stocked_house() -> House {
        let mut house = House::new(HouseConfig::default());
        for item in ESSENTIAL_ITEMS {
            house.store_item(item, 3).unwrap();
        }
        house
    }

    #[test]
    fn level_one_values() {
        let house = House::new(HouseConfig::default());
        assert_eq!(house.level(), 1);
        assert_eq!(house.storage_capacity(), 10);
        assert!((house.energy_regen_rate() - 20.0).abs() < 1e-9);
        assert!((house.upgrade_cost() - 150.0).abs() < 1e-9);
        assert_eq!(house.requirement(WOOD), 3);
        assert_eq!(house.requirement("gold"), 0);
        assert_eq!(house.requirements().len(), 3);
    }

    #[test]
    fn zero_initial_level_is_raised() {
        let house = House::new(HouseConfig {
            initial_level: 0,
            ..HouseConfig::default()
        });
        assert_eq!(house.level(), 1);
    }

    #[test]
    fn storage_respects_capacity() {
        let mut house = House::new(HouseConfig::default());
        house.store_item(WOOD, 7).unwrap();
        assert_eq!(
            house.store_item(STONE, 4),
            Err(HouseError::StorageFull {
                item: STONE.to_owned(),
                quantity: 4,
                free: 3,
            })
        );
        house.store_item(STONE, 3).unwrap();
        assert!(house.is_storage_full());
        assert_eq!(house.store_item("", 1), Err(HouseError::EmptyItemName));
        assert!(matches!(
            house.store_item(WOOD, 0),
            Err(HouseError::ZeroQuantity { .. })
        ));
    }

    #[test]
    fn store_from_moves_atomically() {
        let mut house = House::new(HouseConfig::default());
        let mut inv = Inventory::new(20);
        inv.add_item(WOOD, 15).unwrap();
        assert!(matches!(
            house.store_from(&mut inv, WOOD, 11),
            Err(HouseError::StorageFull { .. })
        ));
        assert_eq!(inv.quantity(WOOD), 15);
        house.store_from(&mut inv, WOOD, 6).unwrap();
        assert_eq!(inv.quantity(WOOD), 9);
        assert_eq!(house.stored_quantity(WOOD), 6);
        assert!(matches!(
            house.store_from(&mut inv, BUSH, 1),
            Err(HouseError::Agent(_))
        ));
        assert_eq!(house.stored_total(), 6);
    }

    #[test]
    fn take_from_storage_checks_both_sides() {
        let mut house = House::new(HouseConfig::default());
        house.store_item(STONE, 5).unwrap();
        let mut inv = Inventory::new(3);
        assert!(matches!(
            house.take_from_storage(STONE, 6, &mut inv),
            Err(HouseError::InsufficientStock { available: 5, .. })
        ));
        assert!(matches!(
            house.take_from_storage(STONE, 4, &mut inv),
            Err(HouseError::NoInventoryRoom { free: 3, .. })
        ));
        assert_eq!(house.stored_quantity(STONE), 5);
        assert!(inv.is_empty());

        house.take_from_storage(STONE, 3, &mut inv).unwrap();
        assert_eq!(inv.quantity(STONE), 3);
        assert_eq!(house.stored_quantity(STONE), 2);
        house.take_from_storage(STONE, 2, &mut Inventory::new(5)).unwrap();
        assert_eq!(house.stored_items().count(), 0);
    }

    #[test]
    fn upgrade_consumes_and_grants() {
        let mut house = stocked_house();
        let mut builder = agent(200.0, 50.0);
        let receipt = house.upgrade(&mut builder).unwrap();
        assert_eq!(receipt.new_level, 2);
        assert!((receipt.cost - 150.0).abs() < 1e-9);
        assert!((builder.vitals.money() - 50.0).abs() < 1e-9);
        assert_eq!(house.stored_total(), 0);
        assert_eq!(house.storage_capacity(), 20);
        assert!((house.energy_regen_rate() - 21.0).abs() < 1e-9);
        assert!((builder.vitals.health() - 60.0).abs() < 1e-9);
        assert!((builder.vitals.strength() - 14.0).abs() < 1e-9);
        assert!((builder.vitals.speed() - 7.0).abs() < 1e-9);
        assert_eq!(house.requirement(BUSH), 4);
        // level 2: 100 + 50 * 2^1.5
        assert!((house.upgrade_cost() - (100.0 + 50.0 * 2.0_f64.powf(1.5))).abs() < 1e-9);
    }

    #[test]
    fn failed_upgrade_changes_nothing() {
        let mut house = stocked_house();
        let mut poor = agent(149.0, 50.0);
        let before = house.clone();
        assert!(matches!(
            house.upgrade(&mut poor),
            Err(HouseError::InsufficientFunds { next_level: 2, .. })
        ));
        assert_eq!(house, before);
        assert!((poor.vitals.money() - 149.0).abs() < 1e-9);
        assert!((poor.vitals.health() - 50.0).abs() < 1e-9);

        let mut sparse = House::new(HouseConfig::default());
        sparse.store_item(WOOD, 3).unwrap();
        sparse.store_item(STONE, 2).unwrap();
        let before = sparse.clone();
        let mut rich = agent(1_000.0, 50.0);
        assert_eq!(
            sparse.upgrade(&mut rich),
            Err(HouseError::InsufficientResources {
                next_level: 2,
                item: BUSH.to_owned(),
                required: 3,
                available: 0,
            })
        );
        assert_eq!(sparse, before);
        assert!((rich.vitals.money() - 1_000.0).abs() < 1e-9);
        assert!(!sparse.is_upgrade_available(1_000.0));
        assert!(stocked_house().is_upgrade_available(150.0));
    }

    #[test]
    fn regeneration_clamps_to_max() {
        let house = House::new(HouseConfig::default());
        let mut tired = agent(0.0, 30.0);
        assert!((house.regenerate_energy(&mut tired) - 20.0).abs() < 1e-9);
        assert!((tired.vitals.energy() - 50.0).abs() < 1e-9);
        let mut rested = agent(0.0, 95.0);
        assert!((house.regenerate_energy(&mut rested) - 5.0).abs() < 1e-9);
        assert!((rested.vitals.energy() - 100.0).abs() < 1e-9);
    }
}
