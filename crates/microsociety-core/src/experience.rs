//! Experience recording.
//!
//! The feedback pipeline publishes one [`Experience`] per executed action to
//! an [`ExperienceSink`]. The in-memory [`ExperienceBuffer`] guards its
//! records with a mutex because exporters may drain it from outside the
//! tick loop.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use microsociety_types::{ActionType, Experience};
use serde::{Deserialize, Serialize};

/// A consumer of completed-action records.
pub trait ExperienceSink {
    /// Accept one record.
    fn record(&self, experience: Experience);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ExperienceSink for NullSink {
    fn record(&self, _experience: Experience) {}
}

/// Aggregate figures over buffered records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExperienceStats {
    /// Number of records.
    pub total: usize,
    /// Records per action.
    pub per_action: BTreeMap<ActionType, usize>,
    /// Mean reward, 0 when empty.
    pub average_reward: f64,
    /// Lowest reward, if any record exists.
    pub min_reward: Option<f64>,
    /// Highest reward, if any record exists.
    pub max_reward: Option<f64>,
    /// Records flagged terminal.
    pub terminal: usize,
}

/// Thread-safe in-memory experience store.
#[derive(Debug, Default)]
pub struct ExperienceBuffer {
    records: Mutex<Vec<Experience>>,
}

impl ExperienceBuffer {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Experience>> {
        // A panicked writer cannot leave a half-pushed record behind.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every buffered record, oldest first.
    pub fn snapshot(&self) -> Vec<Experience> {
        self.lock().clone()
    }

    /// Take every buffered record, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Experience> {
        std::mem::take(&mut *self.lock())
    }

    /// Aggregate statistics over the buffered records.
    pub fn stats(&self) -> ExperienceStats {
        let records = self.lock();
        let mut stats = ExperienceStats {
            total: records.len(),
            ..ExperienceStats::default()
        };
        let mut sum = 0.0;
        for exp in records.iter() {
            let slot = stats.per_action.entry(exp.action).or_insert(0);
            *slot = slot.saturating_add(1);
            if exp.terminal {
                stats.terminal = stats.terminal.saturating_add(1);
            }
            sum += exp.reward;
            stats.min_reward = Some(stats.min_reward.map_or(exp.reward, |m| m.min(exp.reward)));
            stats.max_reward = Some(stats.max_reward.map_or(exp.reward, |m| m.max(exp.reward)));
        }
        if stats.total > 0 {
            stats.average_reward = sum / stats.total as f64;
        }
        stats
    }
}

impl ExperienceSink for ExperienceBuffer {
    fn record(&self, experience: Experience) {
        self.lock().push(experience);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use microsociety_types::{AgentId, State};

    use super::*;

    fn exp(action: ActionType, reward: f64, terminal: bool) -> Experience {
        Experience {
            agent_id: AgentId::new(),
            agent_name: String::from("Eve"),
            previous_state: State::default(),
            action,
            reward,
            next_state: State::default(),
            terminal,
            tick: 1,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn stats_summarise_records() {
        let buffer = ExperienceBuffer::new();
        assert_eq!(buffer.stats(), ExperienceStats::default());
        buffer.record(exp(ActionType::ChopTree, 10.0, false));
        buffer.record(exp(ActionType::ChopTree, -5.0, false));
        buffer.record(exp(ActionType::Rest, 1.0, true));
        let stats = buffer.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.per_action.get(&ActionType::ChopTree), Some(&2));
        assert_eq!(stats.terminal, 1);
        assert!((stats.average_reward - 2.0).abs() < 1e-9);
        assert_eq!(stats.min_reward, Some(-5.0));
        assert_eq!(stats.max_reward, Some(10.0));
    }

    #[test]
    fn drain_empties_the_buffer() {
        let buffer = ExperienceBuffer::new();
        buffer.record(exp(ActionType::SellItem, 12.0, false));
        assert_eq!(buffer.snapshot().len(), 1);
        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn concurrent_writers_are_serialised() {
        let buffer = Arc::new(ExperienceBuffer::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        buffer.record(exp(ActionType::Rest, 1.0, false));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(buffer.len(), 100);
    }

    #[test]
    fn records_serialise_to_json() {
        let record = exp(ActionType::BuyItem, 8.0, false);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("BuyItem"));
    }
}
