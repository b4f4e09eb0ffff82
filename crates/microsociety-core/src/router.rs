//! Per-agent decision routing.
//!
//! Three decision sources are tried in a fixed order of preference:
//!
//! 1. **External model** -- when the agent has it enabled and the handle
//!    reports itself loaded, and the prediction is not `None`.
//! 2. **Q-learning** -- the agent's own epsilon-greedy policy, guarded by
//!    the anti-stagnation rule.
//! 3. **Rule-based** -- a fixed-priority heuristic over vitals, inventory,
//!    market prices, and the house.
//!
//! Whatever source answers, the router never hands `None` to the executor:
//! a uniformly random non-`None` action is substituted as a last resort.

use microsociety_agents::NpcAgent;
use microsociety_economy::{House, Market};
use microsociety_learning::random_action;
use microsociety_types::{ActionType, DecisionMode, State};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::ExternalModel;

/// Router tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouterConfig {
    /// Consecutive identical decisions tolerated before a random action is
    /// forced.
    #[serde(default = "default_stagnation_threshold")]
    pub stagnation_threshold: u32,

    /// Energy below which the heuristic goes home to regenerate.
    #[serde(default = "default_low_energy_threshold")]
    pub low_energy_threshold: f64,

    /// Chance of selling rather than storing when the inventory is full.
    #[serde(default = "default_sell_probability")]
    pub sell_probability: f64,

    /// Money the heuristic wants on hand before it buys anything.
    #[serde(default = "default_buy_money_threshold")]
    pub buy_money_threshold: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            stagnation_threshold: default_stagnation_threshold(),
            low_energy_threshold: default_low_energy_threshold(),
            sell_probability: default_sell_probability(),
            buy_money_threshold: default_buy_money_threshold(),
        }
    }
}

const fn default_stagnation_threshold() -> u32 {
    3
}

const fn default_low_energy_threshold() -> f64 {
    15.0
}

const fn default_sell_probability() -> f64 {
    0.5
}

const fn default_buy_money_threshold() -> f64 {
    50.0
}

/// Read-only view of the shared economy the heuristic consults.
#[derive(Debug, Clone, Copy)]
pub struct EconomyView<'a> {
    /// The market.
    pub market: &'a Market,
    /// The house.
    pub house: &'a House,
}

/// The router's answer for one agent turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// The action to execute (never `None`).
    pub action: ActionType,
    /// The source that produced it.
    pub mode: DecisionMode,
    /// Whether the action was substituted by the stagnation rule or the
    /// final safety net.
    pub forced: bool,
}

/// Choose an action for `agent` in `state`.
///
/// Records the chosen action and mode on the agent. `rng` drives the
/// heuristic's coin flips, forced actions, and the safety net; the
/// Q-learning policy uses its own generator.
pub fn decide<R: Rng + ?Sized>(
    agent: &mut NpcAgent,
    state: &State,
    economy: EconomyView<'_>,
    model: &dyn ExternalModel,
    config: &RouterConfig,
    rng: &mut R,
) -> Decision {
    let (mut action, mode) = select_source(agent, state, economy, model, config, rng);
    let mut forced = false;

    if mode == DecisionMode::QLearning {
        agent.stagnation.observe(*state, action);
        if agent.stagnation.is_stuck(config.stagnation_threshold) {
            let stuck_on = action;
            action = random_action(rng);
            agent.stagnation.reset();
            forced = true;
            debug!(agent = %agent.id, stuck_on = ?stuck_on, forced = ?action, "stagnation broken");
        }
    }

    if action == ActionType::None {
        action = random_action(rng);
        forced = true;
    }

    if agent.last_mode == Some(DecisionMode::ExternalModel) && mode != DecisionMode::ExternalModel {
        warn!(agent = %agent.id, to = mode.as_str(), "external model unavailable, decision mode demoted");
    }
    agent.last_action = action;
    agent.last_mode = Some(mode);

    Decision {
        action,
        mode,
        forced,
    }
}

fn select_source<R: Rng + ?Sized>(
    agent: &mut NpcAgent,
    state: &State,
    economy: EconomyView<'_>,
    model: &dyn ExternalModel,
    config: &RouterConfig,
    rng: &mut R,
) -> (ActionType, DecisionMode) {
    if agent.flags.external_model && model.is_loaded() {
        let predicted = model.predict_action(state);
        if predicted != ActionType::None {
            return (predicted, DecisionMode::ExternalModel);
        }
    }
    if agent.flags.q_learning {
        return (agent.policy.decide_action(state), DecisionMode::QLearning);
    }
    (
        rule_based_action(agent, economy, config, rng),
        DecisionMode::RuleBased,
    )
}

/// The fixed-priority heuristic.
///
/// 1. Energy below the threshold: regenerate at the house.
/// 2. Full inventory: sell or store by coin flip, sell if storage is full.
/// 3. Enough money for the threshold and the cheapest item: buy.
/// 4. Upgrade affordable: upgrade.
/// 5. Otherwise gather something at random.
pub fn rule_based_action<R: Rng + ?Sized>(
    agent: &NpcAgent,
    economy: EconomyView<'_>,
    config: &RouterConfig,
    rng: &mut R,
) -> ActionType {
    let money = agent.vitals.money();

    if agent.vitals.energy() < config.low_energy_threshold {
        return ActionType::RegenerateEnergy;
    }

    if agent.inventory.is_full() {
        if economy.house.is_storage_full() || rng.random_bool(config.sell_probability.clamp(0.0, 1.0)) {
            return ActionType::SellItem;
        }
        return ActionType::StoreItem;
    }

    if money >= config.buy_money_threshold && money >= economy.market.cheapest_buy_price() {
        return ActionType::BuyItem;
    }

    if economy.house.is_upgrade_available(money) {
        return ActionType::UpgradeHouse;
    }

    let pick = rng.random_range(0..ActionType::GATHER.len());
    ActionType::GATHER
        .get(pick)
        .copied()
        .unwrap_or(ActionType::ChopTree)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use microsociety_agents::AgentConfig;
    use microsociety_economy::{HouseConfig, MarketConfig};
    use microsociety_learning::LearningConfig;
    use microsociety_types::{ESSENTIAL_ITEMS, Position, WOOD};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    struct FixedModel(ActionType);

    impl ExternalModel for FixedModel {
        fn is_loaded(&self) -> bool {
            true
        }

        fn predict_action(&self, _state: &State) -> ActionType {
            self.0
        }
    }

    struct Economy {
        market: Market,
        house: House,
    }

    impl Economy {
        fn new() -> Self {
            Self {
                market: Market::new(MarketConfig::default()),
                house: House::new(HouseConfig::default()),
            }
        }

        const fn view(&self) -> EconomyView<'_> {
            EconomyView {
                market: &self.market,
                house: &self.house,
            }
        }
    }

    fn agent(config: &AgentConfig) -> NpcAgent {
        NpcAgent::new("Router", Position::default(), config, &LearningConfig::default(), 5).unwrap()
    }

    fn rule_based(money: f64, energy: f64) -> NpcAgent {
        agent(&AgentConfig {
            initial_money: money,
            initial_energy: energy,
            use_q_learning: false,
            ..AgentConfig::default()
        })
    }

    #[test]
    fn low_energy_always_regenerates() {
        let economy = Economy::new();
        let mut npc = rule_based(1_000.0, 10.0);
        npc.inventory.add_item(WOOD, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let d = decide(
                &mut npc,
                &State::default(),
                economy.view(),
                &crate::model::NoModel,
                &RouterConfig::default(),
                &mut rng,
            );
            assert_eq!(d.action, ActionType::RegenerateEnergy);
            assert_eq!(d.mode, DecisionMode::RuleBased);
        }
    }

    #[test]
    fn full_inventory_sells_or_stores() {
        let economy = Economy::new();
        let mut npc = rule_based(0.0, 100.0);
        npc.inventory.add_item(WOOD, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = Vec::new();
        for _ in 0..100 {
            let a = rule_based_action(&npc, economy.view(), &RouterConfig::default(), &mut rng);
            assert!(matches!(a, ActionType::SellItem | ActionType::StoreItem));
            if !seen.contains(&a) {
                seen.push(a);
            }
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn full_storage_forces_selling() {
        let mut economy = Economy::new();
        economy.house.store_item(WOOD, 10).unwrap();
        let mut npc = rule_based(0.0, 100.0);
        npc.inventory.add_item(WOOD, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            assert_eq!(
                rule_based_action(&npc, economy.view(), &RouterConfig::default(), &mut rng),
                ActionType::SellItem
            );
        }
    }

    #[test]
    fn money_buys_then_upgrade_then_gather() {
        let mut economy = Economy::new();
        let mut rng = StdRng::seed_from_u64(3);
        let rich = rule_based(60.0, 100.0);
        assert_eq!(
            rule_based_action(&rich, economy.view(), &RouterConfig::default(), &mut rng),
            ActionType::BuyItem
        );

        let config = RouterConfig {
            buy_money_threshold: 1_000.0,
            ..RouterConfig::default()
        };
        for item in ESSENTIAL_ITEMS {
            economy.house.store_item(item, 3).unwrap();
        }
        let builder = rule_based(200.0, 100.0);
        assert_eq!(
            rule_based_action(&builder, economy.view(), &config, &mut rng),
            ActionType::UpgradeHouse
        );

        let poor = rule_based(10.0, 100.0);
        for _ in 0..50 {
            let a = rule_based_action(&poor, economy.view(), &config, &mut rng);
            assert!(ActionType::GATHER.contains(&a));
        }
    }

    #[test]
    fn external_model_preferred_when_loaded() {
        let economy = Economy::new();
        let mut npc = agent(&AgentConfig {
            use_external_model: true,
            ..AgentConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(4);
        let d = decide(
            &mut npc,
            &State::default(),
            economy.view(),
            &FixedModel(ActionType::MineRock),
            &RouterConfig::default(),
            &mut rng,
        );
        assert_eq!(d.action, ActionType::MineRock);
        assert_eq!(d.mode, DecisionMode::ExternalModel);
        assert_eq!(npc.last_mode, Some(DecisionMode::ExternalModel));
    }

    #[test]
    fn unloaded_or_silent_model_demotes() {
        let economy = Economy::new();
        let mut npc = agent(&AgentConfig {
            use_external_model: true,
            ..AgentConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(5);
        let silent = decide(
            &mut npc,
            &State::default(),
            economy.view(),
            &FixedModel(ActionType::None),
            &RouterConfig::default(),
            &mut rng,
        );
        assert_eq!(silent.mode, DecisionMode::QLearning);
        assert_ne!(silent.action, ActionType::None);

        npc.flags.q_learning = false;
        let unloaded = decide(
            &mut npc,
            &State::default(),
            economy.view(),
            &crate::model::NoModel,
            &RouterConfig::default(),
            &mut rng,
        );
        assert_eq!(unloaded.mode, DecisionMode::RuleBased);
    }

    #[test]
    fn q_learning_never_yields_none_on_empty_table() {
        let economy = Economy::new();
        let learning = LearningConfig {
            epsilon: 0.0,
            ..LearningConfig::default()
        };
        let mut npc =
            NpcAgent::new("Fresh", Position::default(), &AgentConfig::default(), &learning, 9).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..50 {
            let d = decide(
                &mut npc,
                &State::default(),
                economy.view(),
                &crate::model::NoModel,
                &RouterConfig::default(),
                &mut rng,
            );
            assert_ne!(d.action, ActionType::None);
        }
    }

    #[test]
    fn stagnation_forces_a_random_action_once() {
        let economy = Economy::new();
        let learning = LearningConfig {
            epsilon: 0.0,
            ..LearningConfig::default()
        };
        let mut npc =
            NpcAgent::new("Stuck", Position::default(), &AgentConfig::default(), &learning, 1).unwrap();
        let state = State::default();
        npc.policy.update_q_value(state, ActionType::MineRock, 10.0, &state);
        let config = RouterConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut turn = |npc: &mut NpcAgent| {
            decide(npc, &state, economy.view(), &crate::model::NoModel, &config, &mut rng)
        };

        for _ in 0..3 {
            let d = turn(&mut npc);
            assert_eq!(d.action, ActionType::MineRock);
            assert!(!d.forced);
        }
        let fourth = turn(&mut npc);
        assert!(fourth.forced);
        assert_eq!(npc.stagnation.streak(), 0);

        let fifth = turn(&mut npc);
        assert!(!fifth.forced);
        assert_eq!(fifth.action, ActionType::MineRock);
    }
}
