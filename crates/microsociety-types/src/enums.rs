//! Enumeration types for the MicroSociety simulation.

use serde::{Deserialize, Serialize};

use crate::items::{BUSH, STONE, WOOD};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// An action an agent can attempt during its turn.
///
/// The declaration order is load-bearing: ordinals are used as the bounds of
/// the uniform random fallback (`1..=Rest`, i.e. every variant except
/// [`ActionType::None`]) and as the deterministic tie-break when two actions
/// share the best Q-value (lowest ordinal wins). New variants must be
/// appended, never inserted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ActionType {
    /// No action; never executed successfully.
    #[default]
    None,
    /// Chop a tree for wood.
    ChopTree,
    /// Mine a rock for stone.
    MineRock,
    /// Gather a bush.
    GatherBush,
    /// Move items from the inventory into house storage.
    StoreItem,
    /// Upgrade the shared house to the next level.
    UpgradeHouse,
    /// Recover energy and health at the house.
    RegenerateEnergy,
    /// Take items out of house storage into the inventory.
    TakeOutItems,
    /// Buy one unit of a tradeable item at the market.
    BuyItem,
    /// Sell surplus items at the market.
    SellItem,
    /// Rest in place to partially recover energy and health.
    Rest,
}

impl ActionType {
    /// Every action in ordinal order, including [`ActionType::None`].
    pub const ALL: [Self; 11] = [
        Self::None,
        Self::ChopTree,
        Self::MineRock,
        Self::GatherBush,
        Self::StoreItem,
        Self::UpgradeHouse,
        Self::RegenerateEnergy,
        Self::TakeOutItems,
        Self::BuyItem,
        Self::SellItem,
        Self::Rest,
    ];

    /// The three resource-gathering actions.
    pub const GATHER: [Self; 3] = [Self::ChopTree, Self::MineRock, Self::GatherBush];

    /// Stable ordinal of this action (its declaration index).
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Look up an action by ordinal. Returns `None` for out-of-range values.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    /// The highest ordinal, used as the upper bound of random fallbacks.
    pub const fn max_ordinal() -> u8 {
        Self::Rest as u8
    }

    /// The tile object a gather action harvests, if this is a gather action.
    pub const fn gather_target(self) -> Option<ObjectKind> {
        match self {
            Self::ChopTree => Some(ObjectKind::Tree),
            Self::MineRock => Some(ObjectKind::Rock),
            Self::GatherBush => Some(ObjectKind::Bush),
            _ => None,
        }
    }

    /// Whether this action is performed at the house tile.
    pub const fn targets_house(self) -> bool {
        matches!(
            self,
            Self::StoreItem | Self::UpgradeHouse | Self::RegenerateEnergy | Self::TakeOutItems
        )
    }

    /// Whether this action is performed at the market tile.
    pub const fn targets_market(self) -> bool {
        matches!(self, Self::BuyItem | Self::SellItem)
    }

    /// Human-readable label for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ChopTree => "chop_tree",
            Self::MineRock => "mine_rock",
            Self::GatherBush => "gather_bush",
            Self::StoreItem => "store_item",
            Self::UpgradeHouse => "upgrade_house",
            Self::RegenerateEnergy => "regenerate_energy",
            Self::TakeOutItems => "take_out_items",
            Self::BuyItem => "buy_item",
            Self::SellItem => "sell_item",
            Self::Rest => "rest",
        }
    }
}

// ---------------------------------------------------------------------------
// Tile objects
// ---------------------------------------------------------------------------

/// The object placed on a tile, if any.
///
/// Resource objects (tree, rock, bush) are removed when gathered. Structures
/// (house, market) are permanent and are the only tiles where house and
/// market actions succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A tree, yields wood.
    Tree,
    /// A rock, yields stone.
    Rock,
    /// A bush, yields bush.
    Bush,
    /// The shared house.
    House,
    /// The market.
    Market,
}

impl ObjectKind {
    /// The three harvestable resource objects.
    pub const RESOURCES: [Self; 3] = [Self::Tree, Self::Rock, Self::Bush];

    /// The inventory item produced by harvesting this object.
    pub const fn yield_item(self) -> Option<&'static str> {
        match self {
            Self::Tree => Some(WOOD),
            Self::Rock => Some(STONE),
            Self::Bush => Some(BUSH),
            Self::House | Self::Market => None,
        }
    }

    /// Whether the object is a harvestable resource.
    pub const fn is_resource(self) -> bool {
        matches!(self, Self::Tree | Self::Rock | Self::Bush)
    }

    /// Whether the object is a permanent structure.
    pub const fn is_structure(self) -> bool {
        matches!(self, Self::House | Self::Market)
    }
}

// ---------------------------------------------------------------------------
// Decision modes and agent kinds
// ---------------------------------------------------------------------------

/// The decision source that produced an agent's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DecisionMode {
    /// Fixed-priority heuristic.
    RuleBased,
    /// Tabular epsilon-greedy Q-learning.
    QLearning,
    /// Opaque external model.
    ExternalModel,
}

impl DecisionMode {
    /// Human-readable label for logging and reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::QLearning => "q_learning",
            Self::ExternalModel => "external_model",
        }
    }
}

/// Whether an agent is simulation-controlled or player-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AgentKind {
    /// Autonomous NPC driven by the decision router.
    #[default]
    Npc,
    /// Player-controlled agent; the router never decides for it.
    Player,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_declaration_order() {
        for (idx, action) in ActionType::ALL.iter().enumerate() {
            assert_eq!(usize::from(action.ordinal()), idx);
        }
        assert_eq!(ActionType::None.ordinal(), 0);
        assert_eq!(ActionType::max_ordinal(), 10);
    }

    #[test]
    fn from_ordinal_round_trips() {
        for action in ActionType::ALL {
            assert_eq!(ActionType::from_ordinal(action.ordinal()), Some(action));
        }
        assert_eq!(ActionType::from_ordinal(11), None);
    }

    #[test]
    fn gather_targets() {
        assert_eq!(ActionType::ChopTree.gather_target(), Some(ObjectKind::Tree));
        assert_eq!(ActionType::MineRock.gather_target(), Some(ObjectKind::Rock));
        assert_eq!(ActionType::GatherBush.gather_target(), Some(ObjectKind::Bush));
        assert_eq!(ActionType::BuyItem.gather_target(), None);
    }

    #[test]
    fn house_and_market_targets_are_disjoint() {
        for action in ActionType::ALL {
            assert!(!(action.targets_house() && action.targets_market()));
        }
    }

    #[test]
    fn object_yields() {
        assert_eq!(ObjectKind::Tree.yield_item(), Some("wood"));
        assert_eq!(ObjectKind::Rock.yield_item(), Some("stone"));
        assert_eq!(ObjectKind::Bush.yield_item(), Some("bush"));
        assert_eq!(ObjectKind::House.yield_item(), None);
        assert!(ObjectKind::Market.is_structure());
        assert!(!ObjectKind::Market.is_resource());
    }

    #[test]
    fn action_serializes_as_variant_name() {
        let json = serde_json::to_string(&ActionType::SellItem).unwrap_or_default();
        assert_eq!(json, "\"SellItem\"");
    }
}
