//! Capacity-bounded item storage carried by an agent.
//!
//! The capacity bounds the total count across all items, not the number of
//! distinct keys. All arithmetic is checked; failed operations leave the
//! inventory unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// An item-to-quantity map bounded by a total capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
    capacity: u32,
}

impl Inventory {
    /// Create an empty inventory with the given capacity.
    pub const fn new(capacity: u32) -> Self {
        Self {
            items: BTreeMap::new(),
            capacity,
        }
    }

    /// Total number of items held.
    pub fn total(&self) -> u32 {
        self.items
            .values()
            .fold(0_u32, |acc, qty| acc.saturating_add(*qty))
    }

    /// The capacity.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Free slots left.
    pub fn remaining_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    /// Whether no more items fit.
    pub fn is_full(&self) -> bool {
        self.total() >= self.capacity
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity held of `item`.
    pub fn quantity(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Whether at least `amount` of `item` is held.
    pub fn has_item(&self, item: &str, amount: u32) -> bool {
        self.quantity(item) >= amount
    }

    /// The item with the largest stack, first key on ties.
    pub fn largest_stack(&self) -> Option<(&str, u32)> {
        let mut best: Option<(&str, u32)> = None;
        for (item, qty) in &self.items {
            if best.is_none_or(|(_, best_qty)| *qty > best_qty) {
                best = Some((item.as_str(), *qty));
            }
        }
        best
    }

    /// Iterate held items in key order.
    pub fn items(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(item, qty)| (item.as_str(), *qty))
    }

    /// Add `amount` of `item`.
    ///
    /// # Errors
    ///
    /// Rejects empty names and zero amounts, and returns
    /// [`AgentError::InventoryOverflow`] if the total would exceed capacity.
    pub fn add_item(&mut self, item: &str, amount: u32) -> Result<(), AgentError> {
        validate(item, amount)?;
        let current_load = self.total();
        let overflow = || AgentError::InventoryOverflow {
            item: item.to_owned(),
            attempted: amount,
            current_load,
            capacity: self.capacity,
        };
        let new_load = current_load.checked_add(amount).ok_or_else(overflow)?;
        if new_load > self.capacity {
            return Err(overflow());
        }
        let entry = self.items.entry(item.to_owned()).or_insert(0);
        // Bounded by new_load, which fits in u32.
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    /// Remove `amount` of `item`, dropping the key when it reaches zero.
    ///
    /// # Errors
    ///
    /// Rejects empty names and zero amounts, and returns
    /// [`AgentError::InsufficientItem`] if not enough is held.
    pub fn remove_item(&mut self, item: &str, amount: u32) -> Result<(), AgentError> {
        validate(item, amount)?;
        let available = self.quantity(item);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| AgentError::InsufficientItem {
                item: item.to_owned(),
                requested: amount,
                available,
            })?;
        if remaining == 0 {
            self.items.remove(item);
        } else {
            self.items.insert(item.to_owned(), remaining);
        }
        Ok(())
    }

    /// Raise the capacity by `extra` slots.
    pub const fn grow_capacity(&mut self, extra: u32) {
        self.capacity = self.capacity.saturating_add(extra);
    }
}

fn validate(item: &str, amount: u32) -> Result<(), AgentError> {
    if item.is_empty() {
        return Err(AgentError::EmptyItemName);
    }
    if amount == 0 {
        return Err(AgentError::ZeroQuantity {
            item: item.to_owned(),
        });
    }
    Ok(())
}
