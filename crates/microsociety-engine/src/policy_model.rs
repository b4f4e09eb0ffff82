//! Frozen greedy policy used as the external decision model.
//!
//! A policy file is the JSON array produced by
//! [`QLearningPolicy::greedy_policy`]: one `{state, action, value}` row per
//! visited state. Loading it yields a lookup table that never learns.
//!
//! [`QLearningPolicy::greedy_policy`]: microsociety_learning::QLearningPolicy::greedy_policy

use std::collections::BTreeMap;
use std::path::Path;

use microsociety_core::ExternalModel;
use microsociety_learning::PolicyEntry;
use microsociety_types::{ActionType, State};
use tracing::info;

use crate::error::EngineError;

/// A read-only state-to-action table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrozenPolicyModel {
    actions: BTreeMap<State, ActionType>,
}

impl FrozenPolicyModel {
    /// Build from exported policy rows. Later rows win on duplicate states.
    pub fn from_entries(entries: impl IntoIterator<Item = PolicyEntry>) -> Self {
        Self {
            actions: entries.into_iter().map(|e| (e.state, e.action)).collect(),
        }
    }

    /// Load a policy from a JSON file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|source| EngineError::PolicyIo {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<PolicyEntry> =
            serde_json::from_str(&contents).map_err(|source| EngineError::PolicyFormat {
                path: path.to_path_buf(),
                source,
            })?;
        let model = Self::from_entries(entries);
        info!(path = %path.display(), states = model.len(), "frozen policy loaded");
        Ok(model)
    }

    /// Number of states with a stored action.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ExternalModel for FrozenPolicyModel {
    fn is_loaded(&self) -> bool {
        !self.actions.is_empty()
    }

    fn predict_action(&self, state: &State) -> ActionType {
        self.actions.get(state).copied().unwrap_or(ActionType::None)
    }
}

/// Write `entries` as a JSON policy file.
pub fn export_policy(path: &Path, entries: &[PolicyEntry]) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(entries).map_err(|source| EngineError::PolicyFormat {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| EngineError::PolicyIo {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), states = entries.len(), "greedy policy exported");
    Ok(())
}
