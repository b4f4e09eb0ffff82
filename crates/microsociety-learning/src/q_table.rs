//! The state/action value table owned by a single agent.
//!
//! The table starts empty and grows lazily: a state row is created the first
//! time a value for it is written. Rows are never removed. Both levels are
//! `BTreeMap`s, so iteration order is the derived [`Ord`] of [`State`] and
//! the ordinal order of [`ActionType`]. The argmax tie-break relies on the
//! latter: among equal values, the lowest ordinal wins.

use std::collections::BTreeMap;

use microsociety_types::{ActionType, State};

/// Mapping `State -> (ActionType -> value)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    rows: BTreeMap<State, BTreeMap<ActionType, f64>>,
}

impl QTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Whether a row exists for `state`.
    pub fn contains_state(&self, state: &State) -> bool {
        self.rows.contains_key(state)
    }

    /// Stored value for `(state, action)`, or 0 when never written.
    pub fn value(&self, state: &State, action: ActionType) -> f64 {
        self.rows
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Overwrite the value for `(state, action)`, creating the row if needed.
    pub fn set_value(&mut self, state: State, action: ActionType, value: f64) {
        self.rows.entry(state).or_default().insert(action, value);
    }

    /// The highest-valued stored action for `state`.
    ///
    /// Only actions that have a stored value take part. Ties resolve to the
    /// lowest [`ActionType`] ordinal. Returns `None` for unseen states.
    pub fn best_action(&self, state: &State) -> Option<(ActionType, f64)> {
        let row = self.rows.get(state)?;
        let mut best: Option<(ActionType, f64)> = None;
        for (action, value) in row {
            match best {
                Some((_, best_value)) if *value <= best_value => {}
                _ => best = Some((*action, *value)),
            }
        }
        best
    }

    /// `max_a Q[state][a]`, or 0 for an unseen or empty row.
    pub fn max_value(&self, state: &State) -> f64 {
        self.best_action(state).map_or(0.0, |(_, value)| value)
    }

    /// Number of visited states.
    pub fn state_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored `(state, action)` values.
    pub fn entry_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Whether no value has been written yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in state order.
    pub fn rows(&self) -> impl Iterator<Item = (&State, &BTreeMap<ActionType, f64>)> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(x: i32) -> State {
        State {
            pos_x: x,
            ..State::default()
        }
    }

    #[test]
    fn empty_table_reads_zero() {
        let table = QTable::new();
        assert!(table.is_empty());
        assert!(table.value(&state(0), ActionType::ChopTree).abs() < f64::EPSILON);
        assert!(table.max_value(&state(0)).abs() < f64::EPSILON);
        assert_eq!(table.best_action(&state(0)), None);
    }

    #[test]
    fn set_value_grows_lazily() {
        let mut table = QTable::new();
        table.set_value(state(1), ActionType::MineRock, 2.5);
        table.set_value(state(1), ActionType::Rest, -1.0);
        table.set_value(state(2), ActionType::Rest, 0.5);
        assert!(table.contains_state(&state(1)));
        assert!(!table.contains_state(&state(3)));
        assert_eq!(table.state_count(), 2);
        assert_eq!(table.entry_count(), 3);
    }

    #[test]
    fn best_action_picks_highest_value() {
        let mut table = QTable::new();
        table.set_value(state(0), ActionType::Rest, 1.0);
        table.set_value(state(0), ActionType::SellItem, 4.0);
        table.set_value(state(0), ActionType::ChopTree, -2.0);
        assert_eq!(
            table.best_action(&state(0)).map(|(a, _)| a),
            Some(ActionType::SellItem)
        );
        assert!((table.max_value(&state(0)) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_resolve_to_lowest_ordinal() {
        let mut table = QTable::new();
        table.set_value(state(0), ActionType::Rest, 3.0);
        table.set_value(state(0), ActionType::BuyItem, 3.0);
        table.set_value(state(0), ActionType::MineRock, 3.0);
        assert_eq!(
            table.best_action(&state(0)).map(|(a, _)| a),
            Some(ActionType::MineRock)
        );
    }

    #[test]
    fn all_negative_row_still_has_a_best_action() {
        let mut table = QTable::new();
        table.set_value(state(0), ActionType::StoreItem, -5.0);
        table.set_value(state(0), ActionType::UpgradeHouse, -3.0);
        assert_eq!(
            table.best_action(&state(0)).map(|(a, _)| a),
            Some(ActionType::UpgradeHouse)
        );
        assert!((table.max_value(&state(0)) + 3.0).abs() < f64::EPSILON);
    }
}
