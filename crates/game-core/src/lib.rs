#![deny(warnings)]

//! Core domain models and invariants for the Starfall progression engine.
//!
//! This crate defines the resource kinds, upgrade-node definitions, the
//! geometric cost curve, and the bag of derived gameplay statistics, with
//! validation helpers that guarantee the hand-authored catalog is well
//! formed before an engine is built on top of it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Closed set of resource kinds: the primary currency plus typed materials.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ResourceKind {
    /// Primary spendable currency earned by destroying objects.
    Credits,
    /// Common material salvaged from wreckage.
    Scrap,
    /// Uncommon material used by precision upgrades.
    Crystal,
    /// Rare material used by combat-meta upgrades.
    Alloy,
}

impl ResourceKind {
    /// All kinds in display order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Credits,
        ResourceKind::Scrap,
        ResourceKind::Crystal,
        ResourceKind::Alloy,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Credits => "credits",
            ResourceKind::Scrap => "scrap",
            ResourceKind::Crystal => "crystal",
            ResourceKind::Alloy => "alloy",
        };
        f.write_str(name)
    }
}

/// Unique identifier for an upgrade node, e.g. "appraisal", "crit_lens".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpgradeId(pub String);

impl UpgradeId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One-time material price paid only on the level 0 -> 1 transition.
///
/// Modeled as an optional field on the definition so that "no price" and
/// "free" remain distinguishable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialPrice {
    pub kind: ResourceKind,
    pub amount: f64,
}

/// Cosmetic tree-layout hint consumed by the UI; not a gameplay invariant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub col: i16,
    pub row: i16,
}

/// Effect applied when a node reaches a new level.
///
/// Effects must set absolute values computed from `level`, never accumulate
/// deltas, so that replaying them at load time in any order reconstructs the
/// same derived statistics.
pub type EffectFn = fn(&mut DerivedStats, u32);

/// Static definition of one purchasable upgrade node.
///
/// Cost, description, and effect are code, not data; only `(id, level)`
/// pairs are ever persisted.
#[derive(Clone, Debug)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: &'static str,
    pub desc: &'static str,
    /// Currency cost at level 0.
    pub base_cost: f64,
    /// Multiplicative cost growth per level, typically 1.3 - 2.0.
    pub growth: f64,
    /// Maximum purchasable level; 1 for single-purchase nodes.
    pub max_level: u32,
    /// Gating parent; the node is unpurchasable while the parent is level 0.
    pub parent: Option<UpgradeId>,
    /// Optional one-time material price for the first purchase.
    pub material_price: Option<MaterialPrice>,
    pub effect: EffectFn,
    pub layout: NodeLayout,
}

/// Currency cost to buy the next level of `def` from `level`.
///
/// Geometric growth: floor(base * growth^level). Returns infinity once the
/// node is at max level — an unpurchasable sentinel, not an error.
///
/// Example:
/// a node with base_cost 200 and growth 1.6 costs 200 at level 0,
/// floor(200 * 1.6) = 320 at level 1 and floor(200 * 1.6^2) = 512 at level 2.
pub fn cost_at(def: &UpgradeDef, level: u32) -> f64 {
    if level >= def.max_level {
        return f64::INFINITY;
    }
    (def.base_cost * def.growth.powi(level as i32)).floor()
}

/// Derived gameplay statistics.
///
/// Never independently authoritative: every field is a pure function of
/// (these defaults, the set of upgrade levels), reconstructed by effect
/// replay at load time. The single exception is `market_multiplier`, which
/// drifts stochastically and is carried in the save snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedStats {
    /// Base currency value of one destroyed object.
    pub object_value: f64,
    /// Multiplier applied to all object payouts.
    pub value_multiplier: f64,
    /// Stochastic market factor in [MARKET_FLOOR, MARKET_CEIL].
    pub market_multiplier: f64,
    /// Seconds between object spawns.
    pub spawn_interval_secs: f64,
    /// Maximum simultaneous falling objects.
    pub max_objects: u32,
    /// Toughness multiplier for spawned objects.
    pub object_hp_multiplier: f64,
    /// Damage dealt per click/shot.
    pub click_power: f64,
    /// Chance of a critical (double-value) destruction.
    pub crit_chance: f64,
    /// Chance an object spawns as a golden (10x) variant.
    pub golden_chance: f64,
    /// Chance a destroyed object drops a typed material.
    pub material_drop_chance: f64,
    /// Credits received per scrap unit on auto-sell.
    pub salvage_value: f64,
    /// Scrap auto-sold per second.
    pub auto_sell_rate: f64,
    /// Passive interest on credits, fraction per second.
    pub interest_rate: f64,
    /// Gadget: pulls material drops toward the player.
    pub magnet_enabled: bool,
    /// Combat-meta multiplier read by the roguelike sub-mode.
    pub damage_multiplier: f64,
    /// Combat-meta flat hull bonus read by the roguelike sub-mode.
    pub hull_bonus: f64,
}

impl Default for DerivedStats {
    fn default() -> Self {
        Self {
            object_value: 1.0,
            value_multiplier: 1.0,
            market_multiplier: 1.0,
            spawn_interval_secs: 2.0,
            max_objects: 5,
            object_hp_multiplier: 1.0,
            click_power: 1.0,
            crit_chance: 0.0,
            golden_chance: 0.0,
            material_drop_chance: 0.05,
            salvage_value: 0.5,
            auto_sell_rate: 0.0,
            interest_rate: 0.0,
            magnet_enabled: false,
            damage_multiplier: 1.0,
            hull_bonus: 0.0,
        }
    }
}

/// Validation errors for the hand-authored upgrade catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Two nodes share the same identifier.
    #[error("duplicate upgrade id: {0}")]
    DuplicateId(String),
    /// A parent reference points at no declared node.
    #[error("parent not found: {0}")]
    ParentNotFound(String),
    /// A node names itself as its own parent.
    #[error("node is its own parent: {0}")]
    SelfParent(String),
    /// Cost growth must be finite and >= 1.
    #[error("invalid growth factor for {0}")]
    InvalidGrowth(String),
    /// Base cost must be finite and non-negative.
    #[error("invalid base cost for {0}")]
    InvalidBaseCost(String),
    /// Max level must be at least 1.
    #[error("zero max level for {0}")]
    ZeroMaxLevel(String),
    /// Material price amounts must be finite and positive.
    #[error("invalid material price for {0}")]
    InvalidMaterialPrice(String),
}

/// Validate the catalog, including cross-references between nodes.
///
/// Parent references are resolved by lookup over the whole list, so forward
/// references are legal. The parent graph is hand-authored as a forest; no
/// runtime cycle detector is run here.
pub fn validate_catalog(defs: &[UpgradeDef]) -> Result<(), CatalogError> {
    let mut ids: BTreeSet<&UpgradeId> = BTreeSet::new();
    for def in defs {
        if !ids.insert(&def.id) {
            return Err(CatalogError::DuplicateId(def.id.0.clone()));
        }
        if !def.growth.is_finite() || def.growth < 1.0 {
            return Err(CatalogError::InvalidGrowth(def.id.0.clone()));
        }
        if !def.base_cost.is_finite() || def.base_cost < 0.0 {
            return Err(CatalogError::InvalidBaseCost(def.id.0.clone()));
        }
        if def.max_level == 0 {
            return Err(CatalogError::ZeroMaxLevel(def.id.0.clone()));
        }
        if let Some(price) = &def.material_price {
            if !price.amount.is_finite() || price.amount <= 0.0 {
                return Err(CatalogError::InvalidMaterialPrice(def.id.0.clone()));
            }
        }
    }
    for def in defs {
        if let Some(parent) = &def.parent {
            if parent == &def.id {
                return Err(CatalogError::SelfParent(def.id.0.clone()));
            }
            if !ids.contains(parent) {
                return Err(CatalogError::ParentNotFound(parent.0.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_effect(_stats: &mut DerivedStats, _level: u32) {}

    fn def(id: &str, parent: Option<&str>) -> UpgradeDef {
        UpgradeDef {
            id: UpgradeId::new(id),
            name: "Test Node",
            desc: "test",
            base_cost: 200.0,
            growth: 1.6,
            max_level: 20,
            parent: parent.map(UpgradeId::new),
            material_price: None,
            effect: no_effect,
            layout: NodeLayout::default(),
        }
    }

    #[test]
    fn cost_curve_matches_geometric_growth() {
        let d = def("a", None);
        assert_eq!(cost_at(&d, 0), 200.0);
        assert_eq!(cost_at(&d, 1), 320.0);
        assert_eq!(cost_at(&d, 2), 512.0);
    }

    #[test]
    fn cost_is_infinite_exactly_at_max_level() {
        let mut d = def("a", None);
        d.max_level = 3;
        assert!(cost_at(&d, 2).is_finite());
        assert_eq!(cost_at(&d, 3), f64::INFINITY);
        assert_eq!(cost_at(&d, 4), f64::INFINITY);
    }

    #[test]
    fn forward_parent_reference_is_legal() {
        let defs = vec![def("child", Some("root")), def("root", None)];
        assert_eq!(validate_catalog(&defs), Ok(()));
    }

    #[test]
    fn duplicate_and_dangling_refs_are_rejected() {
        let defs = vec![def("a", None), def("a", None)];
        assert_eq!(
            validate_catalog(&defs),
            Err(CatalogError::DuplicateId("a".into()))
        );
        let defs = vec![def("a", Some("ghost"))];
        assert_eq!(
            validate_catalog(&defs),
            Err(CatalogError::ParentNotFound("ghost".into()))
        );
        let defs = vec![def("a", Some("a"))];
        assert_eq!(
            validate_catalog(&defs),
            Err(CatalogError::SelfParent("a".into()))
        );
    }

    #[test]
    fn bad_numeric_fields_are_rejected() {
        let mut d = def("a", None);
        d.growth = 0.9;
        assert!(validate_catalog(std::slice::from_ref(&d)).is_err());
        d.growth = 1.6;
        d.max_level = 0;
        assert!(validate_catalog(std::slice::from_ref(&d)).is_err());
        d.max_level = 20;
        d.material_price = Some(MaterialPrice {
            kind: ResourceKind::Scrap,
            amount: 0.0,
        });
        assert!(validate_catalog(std::slice::from_ref(&d)).is_err());
    }

    #[test]
    fn resource_kind_serializes_as_string() {
        let s = serde_json::to_string(&ResourceKind::Crystal).unwrap();
        assert_eq!(s, "\"Crystal\"");
        let back: ResourceKind = serde_json::from_str(&s).unwrap();
        assert_eq!(back, ResourceKind::Crystal);
    }

    proptest! {
        #[test]
        fn cost_is_non_decreasing_in_level(base in 1.0f64..10_000.0,
                                           growth in 1.0f64..2.5,
                                           level in 0u32..30) {
            let mut d = def("a", None);
            d.base_cost = base;
            d.growth = growth;
            d.max_level = 40;
            prop_assert!(cost_at(&d, level + 1) >= cost_at(&d, level));
        }

        #[test]
        fn cost_below_max_is_finite(level in 0u32..19) {
            let d = def("a", None);
            prop_assert!(cost_at(&d, level).is_finite());
        }
    }
}
