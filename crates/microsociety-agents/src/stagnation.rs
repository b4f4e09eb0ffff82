//! Detection of an agent repeating the same action without progress.
//!
//! The tracker counts consecutive decisions where both the chosen action
//! and the observed state are unchanged. Once the streak exceeds the
//! configured threshold the router forces one random action and the streak
//! starts over.

use microsociety_types::{ActionType, State};
use serde::{Deserialize, Serialize};

/// Per-agent repeat counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagnationTracker {
    last: Option<(State, ActionType)>,
    streak: u32,
}

impl StagnationTracker {
    /// Create an empty tracker.
    pub const fn new() -> Self {
        Self {
            last: None,
            streak: 0,
        }
    }

    /// Record a decision and return the updated streak.
    ///
    /// The streak is the number of consecutive identical `(state, action)`
    /// decisions, starting at 1 for a fresh pair.
    pub fn observe(&mut self, state: State, action: ActionType) -> u32 {
        if self.last == Some((state, action)) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.last = Some((state, action));
            self.streak = 1;
        }
        self.streak
    }

    /// Whether the streak is above `threshold`.
    pub const fn is_stuck(&self, threshold: u32) -> bool {
        self.streak > threshold
    }

    /// Current streak length.
    pub const fn streak(&self) -> u32 {
        self.streak
    }

    /// Forget the streak after a forced action.
    pub const fn reset(&mut self) {
        self.last = None;
        self.streak = 0;
    }
}
