//! Action execution and reward assignment.
//!
//! [`execute_action`] dispatches on [`ActionType`] to one handler per
//! action. Every handler checks its preconditions against the target tile,
//! the agent, the market, and the house, applies its effects only when all
//! of them hold, and returns an [`ActionOutcome`] carrying the reward.
//! Precondition failures are ordinary outcomes with a negative reward and a
//! [`FailureCause`]; nothing here returns an error, and a failed action
//! leaves the world and the agent untouched.

use microsociety_agents::NpcAgent;
use microsociety_economy::{House, HouseError, Market, MarketError};
use microsociety_types::{ActionType, ESSENTIAL_ITEMS, ObjectKind, TileCoord};
use microsociety_world::TileAccess;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// Reward magnitudes for every action outcome.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Successful `ChopTree`.
    pub chop_tree_success: f64,
    /// Successful `MineRock`.
    pub mine_rock_success: f64,
    /// Successful `GatherBush`.
    pub gather_bush_success: f64,
    /// Any failed gather.
    pub gather_failure: f64,
    /// Successful `RegenerateEnergy`.
    pub regenerate_success: f64,
    /// `RegenerateEnergy` at the house with energy already high.
    pub regenerate_not_needed: f64,
    /// `RegenerateEnergy` on a tile holding something other than the house.
    pub regenerate_wrong_object: f64,
    /// `RegenerateEnergy` on an empty tile.
    pub regenerate_no_object: f64,
    /// Successful `BuyItem`.
    pub buy_success: f64,
    /// `BuyItem` the agent cannot afford or has no room for.
    pub buy_failure: f64,
    /// Successful `SellItem` of a single unit.
    pub sell_success: f64,
    /// Successful `SellItem` of two or more units.
    pub sell_bulk_success: f64,
    /// `SellItem` with nothing above the reserve.
    pub sell_failure: f64,
    /// Trade attempted away from the market.
    pub no_market: f64,
    /// Per unit moved by a successful `StoreItem`.
    pub store_per_unit: f64,
    /// `StoreItem` into full storage.
    pub store_full: f64,
    /// `StoreItem` with an empty inventory.
    pub store_empty: f64,
    /// Storage action attempted away from the house.
    pub no_house: f64,
    /// Successful `UpgradeHouse`.
    pub upgrade_success: f64,
    /// `UpgradeHouse` without enough money.
    pub upgrade_insufficient_funds: f64,
    /// `UpgradeHouse` without enough stored resources.
    pub upgrade_insufficient_resources: f64,
    /// `UpgradeHouse` away from the house.
    pub upgrade_no_house: f64,
    /// Successful `Rest`.
    pub rest_success: f64,
    /// `Rest` with energy already sufficient.
    pub rest_not_needed: f64,
    /// Successful `TakeOutItems`.
    pub take_out_success: f64,
    /// Failed `TakeOutItems`.
    pub take_out_failure: f64,
    /// `None` or any unsupported action.
    pub invalid_action: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            chop_tree_success: 10.0,
            mine_rock_success: 9.0,
            gather_bush_success: 8.0,
            gather_failure: -5.0,
            regenerate_success: 5.0,
            regenerate_not_needed: -2.0,
            regenerate_wrong_object: -5.0,
            regenerate_no_object: -10.0,
            buy_success: 8.0,
            buy_failure: -3.0,
            sell_success: 10.0,
            sell_bulk_success: 12.0,
            sell_failure: -3.0,
            no_market: -5.0,
            store_per_unit: 3.0,
            store_full: -5.0,
            store_empty: -3.0,
            no_house: -5.0,
            upgrade_success: 20.0,
            upgrade_insufficient_funds: -10.0,
            upgrade_insufficient_resources: -8.0,
            upgrade_no_house: -10.0,
            rest_success: 3.0,
            rest_not_needed: -1.0,
            take_out_success: 2.0,
            take_out_failure: -3.0,
            invalid_action: -10.0,
        }
    }
}

impl RewardConfig {
    /// Reward for a successful gather of `action`.
    pub const fn gather_success(&self, action: ActionType) -> f64 {
        match action {
            ActionType::MineRock => self.mine_rock_success,
            ActionType::GatherBush => self.gather_bush_success,
            _ => self.chop_tree_success,
        }
    }
}

/// Costs, gains, cooldowns, and trade policy of the executor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActionTuning {
    /// Cooldown after any action, in seconds.
    pub action_cooldown: f64,
    /// Cooldown after `RegenerateEnergy`, in seconds.
    pub regenerate_cooldown: f64,
    /// Health lost per successful gather.
    pub gather_health_cost: f64,
    /// Energy spent per successful gather.
    pub gather_energy_cost: f64,
    /// Energy spent per completed trade.
    pub trade_energy_cost: f64,
    /// Health restored by `RegenerateEnergy`, on top of the house's energy.
    pub regenerate_health_gain: f64,
    /// Fraction of max energy at or above which regeneration is refused.
    pub regenerate_energy_ceiling: f64,
    /// Energy restored by `Rest`.
    pub rest_energy_gain: f64,
    /// Health restored by `Rest`.
    pub rest_health_gain: f64,
    /// Fraction of max energy at or above which resting is refused.
    pub rest_energy_ceiling: f64,
    /// Units of each item an agent keeps when selling.
    pub sell_reserve: u32,
    /// Most units sold in one `SellItem`.
    pub sell_batch: u32,
    /// Energy spent per tile walked to reach the target.
    pub travel_energy_per_tile: f64,
}

impl Default for ActionTuning {
    fn default() -> Self {
        Self {
            action_cooldown: 2.0,
            regenerate_cooldown: 5.0,
            gather_health_cost: 0.5,
            gather_energy_cost: 5.0,
            trade_energy_cost: 0.5,
            regenerate_health_gain: 5.0,
            regenerate_energy_ceiling: 0.8,
            rest_energy_gain: 20.0,
            rest_health_gain: 2.0,
            rest_energy_ceiling: 0.5,
            sell_reserve: 1,
            sell_batch: 5,
            travel_energy_per_tile: 0.1,
        }
    }
}

impl ActionTuning {
    /// Cooldown set after executing `action`.
    pub fn cooldown_for(&self, action: ActionType) -> f64 {
        if action == ActionType::RegenerateEnergy {
            self.regenerate_cooldown
        } else {
            self.action_cooldown
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCause {
    /// The target tile is empty.
    MissingObject,
    /// The target tile holds the wrong kind of object.
    WrongObject,
    /// The inventory has no room.
    InventoryFull,
    /// The inventory holds nothing to move.
    InventoryEmpty,
    /// House storage has no room.
    StorageFull,
    /// House storage holds nothing to take.
    StorageEmpty,
    /// The agent cannot pay.
    InsufficientFunds,
    /// House storage lacks upgrade resources.
    InsufficientResources,
    /// Every held item is at or below the reserve.
    NothingToSell,
    /// Vitals are already high enough.
    NotNeeded,
    /// `None` or an action without a handler.
    InvalidAction,
}

/// The result of executing one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// The action attempted.
    pub action: ActionType,
    /// Whether its effects were applied.
    pub success: bool,
    /// Reward for the learning pipeline.
    pub reward: f64,
    /// Why it failed, if it did.
    pub cause: Option<FailureCause>,
    /// The item moved, if any.
    pub item: Option<String>,
    /// Units moved.
    pub quantity: u32,
}

impl ActionOutcome {
    const fn success(action: ActionType, reward: f64) -> Self {
        Self {
            action,
            success: true,
            reward,
            cause: None,
            item: None,
            quantity: 0,
        }
    }

    fn moved(action: ActionType, reward: f64, item: &str, quantity: u32) -> Self {
        Self {
            item: Some(item.to_owned()),
            quantity,
            ..Self::success(action, reward)
        }
    }

    const fn failure(action: ActionType, reward: f64, cause: FailureCause) -> Self {
        Self {
            action,
            success: false,
            reward,
            cause: Some(cause),
            item: None,
            quantity: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Everything an action may touch besides the agent.
pub struct ActionContext<'a, G: TileAccess + ?Sized> {
    /// The tile grid.
    pub grid: &'a mut G,
    /// The market.
    pub market: &'a mut Market,
    /// The house.
    pub house: &'a mut House,
    /// Reward magnitudes.
    pub rewards: &'a RewardConfig,
    /// Executor tuning.
    pub tuning: &'a ActionTuning,
}

/// Execute `action` for `agent` against the object on `target`.
///
/// Always returns an outcome with a reward, and always sets the agent's
/// cooldown for the attempted action.
pub fn execute_action<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    action: ActionType,
    target: TileCoord,
    ctx: &mut ActionContext<'_, G>,
) -> ActionOutcome {
    let object = ctx.grid.object_at(target);
    let outcome = match action {
        ActionType::ChopTree | ActionType::MineRock | ActionType::GatherBush => {
            gather(agent, action, target, object, ctx)
        }
        ActionType::RegenerateEnergy => regenerate(agent, object, ctx),
        ActionType::BuyItem => buy(agent, object, ctx),
        ActionType::SellItem => sell(agent, object, ctx),
        ActionType::StoreItem => store(agent, object, ctx),
        ActionType::TakeOutItems => take_out(agent, object, ctx),
        ActionType::UpgradeHouse => upgrade(agent, object, ctx),
        ActionType::Rest => rest(agent, ctx),
        ActionType::None => ActionOutcome::failure(
            action,
            ctx.rewards.invalid_action,
            FailureCause::InvalidAction,
        ),
    };
    agent.cooldown = ctx.tuning.cooldown_for(action).max(0.0);
    debug!(
        agent = %agent.id,
        action = ?action,
        target = %target,
        success = outcome.success,
        reward = outcome.reward,
        cause = ?outcome.cause,
        "action executed"
    );
    outcome
}

fn gather<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    action: ActionType,
    target: TileCoord,
    object: Option<ObjectKind>,
    ctx: &mut ActionContext<'_, G>,
) -> ActionOutcome {
    let penalty = ctx.rewards.gather_failure;
    let fail = |cause| ActionOutcome::failure(action, penalty, cause);
    let Some(wanted) = action.gather_target() else {
        return fail(FailureCause::InvalidAction);
    };
    match object {
        None => return fail(FailureCause::MissingObject),
        Some(kind) if kind != wanted => return fail(FailureCause::WrongObject),
        Some(_) => {}
    }
    let Some(item) = wanted.yield_item() else {
        return fail(FailureCause::WrongObject);
    };
    if agent.inventory.is_full() {
        return fail(FailureCause::InventoryFull);
    }
    if agent.inventory.add_item(item, 1).is_err() {
        return fail(FailureCause::InventoryFull);
    }
    if ctx.grid.remove_object(target).is_err() {
        // Keep the inventory consistent with the untouched tile.
        if agent.inventory.remove_item(item, 1).is_err() {
            debug!(agent = %agent.id, item, "gather rollback found no item");
        }
        return fail(FailureCause::MissingObject);
    }
    agent.vitals.change_health(-ctx.tuning.gather_health_cost);
    agent.vitals.change_energy(-ctx.tuning.gather_energy_cost);
    ActionOutcome::moved(action, ctx.rewards.gather_success(action), item, 1)
}

fn regenerate<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    object: Option<ObjectKind>,
    ctx: &ActionContext<'_, G>,
) -> ActionOutcome {
    let action = ActionType::RegenerateEnergy;
    let rewards = ctx.rewards;
    match object {
        None => {
            return ActionOutcome::failure(
                action,
                rewards.regenerate_no_object,
                FailureCause::MissingObject,
            );
        }
        Some(ObjectKind::House) => {}
        Some(_) => {
            return ActionOutcome::failure(
                action,
                rewards.regenerate_wrong_object,
                FailureCause::WrongObject,
            );
        }
    }
    if agent.vitals.energy_fraction() >= ctx.tuning.regenerate_energy_ceiling {
        return ActionOutcome::failure(action, rewards.regenerate_not_needed, FailureCause::NotNeeded);
    }
    ctx.house.regenerate_energy(agent);
    agent.vitals.change_health(ctx.tuning.regenerate_health_gain);
    ActionOutcome::success(action, rewards.regenerate_success)
}

fn buy<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    object: Option<ObjectKind>,
    ctx: &mut ActionContext<'_, G>,
) -> ActionOutcome {
    let action = ActionType::BuyItem;
    if object != Some(ObjectKind::Market) {
        return missing_structure(action, object, ctx.rewards.no_market);
    }
    if agent.inventory.is_full() {
        return ActionOutcome::failure(action, ctx.rewards.buy_failure, FailureCause::InventoryFull);
    }
    let Some(item) = choose_purchase(ctx.market, agent.vitals.money()) else {
        return ActionOutcome::failure(
            action,
            ctx.rewards.buy_failure,
            FailureCause::InsufficientFunds,
        );
    };
    match ctx.market.buy_item(agent, item, 1) {
        Ok(receipt) => {
            agent.vitals.change_energy(-ctx.tuning.trade_energy_cost);
            ActionOutcome::moved(action, ctx.rewards.buy_success, item, receipt.quantity)
        }
        Err(err) => ActionOutcome::failure(action, ctx.rewards.buy_failure, market_cause(&err)),
    }
}

/// The market's suggestion if affordable, otherwise the cheapest
/// affordable essential.
fn choose_purchase(market: &Market, money: f64) -> Option<&'static str> {
    let affordable = |item: &&'static str| market.calculate_buy_price(item) <= money;
    market
        .suggest_best_to_buy()
        .filter(affordable)
        .or_else(|| {
            ESSENTIAL_ITEMS
                .iter()
                .copied()
                .filter(affordable)
                .min_by(|a, b| {
                    market
                        .calculate_buy_price(a)
                        .total_cmp(&market.calculate_buy_price(b))
                })
        })
}

fn sell<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    object: Option<ObjectKind>,
    ctx: &mut ActionContext<'_, G>,
) -> ActionOutcome {
    let action = ActionType::SellItem;
    if object != Some(ObjectKind::Market) {
        return missing_structure(action, object, ctx.rewards.no_market);
    }
    let reserve = ctx.tuning.sell_reserve;
    let Some(item) = ctx.market.suggest_best_to_sell(&agent.inventory, reserve) else {
        return ActionOutcome::failure(action, ctx.rewards.sell_failure, FailureCause::NothingToSell);
    };
    let surplus = agent.inventory.quantity(item).saturating_sub(reserve);
    let quantity = surplus.min(ctx.tuning.sell_batch.max(1));
    match ctx.market.sell_item(agent, item, quantity) {
        Ok(receipt) => {
            agent.vitals.change_energy(-ctx.tuning.trade_energy_cost);
            let reward = if receipt.quantity >= 2 {
                ctx.rewards.sell_bulk_success
            } else {
                ctx.rewards.sell_success
            };
            ActionOutcome::moved(action, reward, item, receipt.quantity)
        }
        Err(err) => ActionOutcome::failure(action, ctx.rewards.sell_failure, market_cause(&err)),
    }
}

fn store<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    object: Option<ObjectKind>,
    ctx: &mut ActionContext<'_, G>,
) -> ActionOutcome {
    let action = ActionType::StoreItem;
    if object != Some(ObjectKind::House) {
        return missing_structure(action, object, ctx.rewards.no_house);
    }
    let Some((item, held)) = agent
        .inventory
        .largest_stack()
        .map(|(item, held)| (item.to_owned(), held))
    else {
        return ActionOutcome::failure(action, ctx.rewards.store_empty, FailureCause::InventoryEmpty);
    };
    let free = ctx.house.remaining_capacity();
    if free == 0 {
        return ActionOutcome::failure(action, ctx.rewards.store_full, FailureCause::StorageFull);
    }
    let quantity = (held / 2).max(1).min(free);
    match ctx.house.store_from(&mut agent.inventory, &item, quantity) {
        Ok(()) => {
            let reward = ctx.rewards.store_per_unit * f64::from(quantity);
            ActionOutcome::moved(action, reward, &item, quantity)
        }
        Err(err) => ActionOutcome::failure(action, ctx.rewards.store_full, house_cause(&err)),
    }
}

fn take_out<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    object: Option<ObjectKind>,
    ctx: &mut ActionContext<'_, G>,
) -> ActionOutcome {
    let action = ActionType::TakeOutItems;
    if object != Some(ObjectKind::House) {
        return missing_structure(action, object, ctx.rewards.take_out_failure);
    }
    let most_stocked = ctx
        .house
        .stored_items()
        .fold(None::<(&str, u32)>, |best, (item, qty)| match best {
            Some((_, top)) if top >= qty => best,
            _ => Some((item, qty)),
        })
        .map(|(item, _)| item.to_owned());
    let Some(item) = most_stocked else {
        return ActionOutcome::failure(
            action,
            ctx.rewards.take_out_failure,
            FailureCause::StorageEmpty,
        );
    };
    match ctx.house.take_from_storage(&item, 1, &mut agent.inventory) {
        Ok(()) => ActionOutcome::moved(action, ctx.rewards.take_out_success, &item, 1),
        Err(err) => ActionOutcome::failure(action, ctx.rewards.take_out_failure, house_cause(&err)),
    }
}

fn upgrade<G: TileAccess + ?Sized>(
    agent: &mut NpcAgent,
    object: Option<ObjectKind>,
    ctx: &mut ActionContext<'_, G>,
) -> ActionOutcome {
    let action = ActionType::UpgradeHouse;
    if object != Some(ObjectKind::House) {
        return missing_structure(action, object, ctx.rewards.upgrade_no_house);
    }
    match ctx.house.upgrade(agent) {
        Ok(_) => ActionOutcome::success(action, ctx.rewards.upgrade_success),
        Err(err) => {
            let cause = house_cause(&err);
            let reward = if cause == FailureCause::InsufficientResources {
                ctx.rewards.upgrade_insufficient_resources
            } else {
                ctx.rewards.upgrade_insufficient_funds
            };
            ActionOutcome::failure(action, reward, cause)
        }
    }
}

fn rest<G: TileAccess + ?Sized>(agent: &mut NpcAgent, ctx: &ActionContext<'_, G>) -> ActionOutcome {
    let action = ActionType::Rest;
    if agent.vitals.energy_fraction() >= ctx.tuning.rest_energy_ceiling {
        return ActionOutcome::failure(action, ctx.rewards.rest_not_needed, FailureCause::NotNeeded);
    }
    agent.vitals.change_energy(ctx.tuning.rest_energy_gain);
    agent.vitals.change_health(ctx.tuning.rest_health_gain);
    ActionOutcome::success(action, ctx.rewards.rest_success)
}

const fn missing_structure(action: ActionType, object: Option<ObjectKind>, reward: f64) -> ActionOutcome {
    let cause = if object.is_some() {
        FailureCause::WrongObject
    } else {
        FailureCause::MissingObject
    };
    ActionOutcome::failure(action, reward, cause)
}

const fn market_cause(err: &MarketError) -> FailureCause {
    match err {
        MarketError::InsufficientFunds { .. } => FailureCause::InsufficientFunds,
        MarketError::NoInventoryRoom { .. } => FailureCause::InventoryFull,
        MarketError::InsufficientItems { .. } => FailureCause::NothingToSell,
        MarketError::EmptyItemName | MarketError::ZeroQuantity { .. } | MarketError::Agent(_) => {
            FailureCause::InvalidAction
        }
    }
}

const fn house_cause(err: &HouseError) -> FailureCause {
    match err {
        HouseError::StorageFull { .. } => FailureCause::StorageFull,
        HouseError::InsufficientStock { .. } => FailureCause::StorageEmpty,
        HouseError::NoInventoryRoom { .. } => FailureCause::InventoryFull,
        HouseError::InsufficientFunds { .. } => FailureCause::InsufficientFunds,
        HouseError::InsufficientResources { .. } => FailureCause::InsufficientResources,
        HouseError::EmptyItemName | HouseError::ZeroQuantity { .. } | HouseError::Agent(_) => {
            FailureCause::InvalidAction
        }
    }
}
