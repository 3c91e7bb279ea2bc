#![deny(warnings)]

//! The Starfall unlock engine: single source of truth for upgrade levels,
//! the resource ledger, achievements, and derived gameplay statistics.
//!
//! The engine is constructed once at application start and passed to every
//! consumer; it is the only writer of upgrade state. All methods are
//! synchronous and run to completion, so the re-validate-then-mutate
//! purchase path is race-free under the single-threaded game loop. A
//! concurrent host must wrap the engine in a single-writer lock.

mod achievements;
mod catalog;

pub use achievements::achievements;
pub use catalog::catalog;

use chrono::Utc;
use game_core::{
    cost_at, validate_catalog, CatalogError, DerivedStats, ResourceKind, UpgradeDef,
};
use game_econ::{auto_sell_units, interest_payout, market_drift, Ledger};
use persistence::{AchievementFlag, SaveData, SaveStore, StatsSnapshot, UpgradeLevel};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Market drift advances once per this many passive ticks.
const DRIFT_EVERY_TICKS: u64 = 10;
/// Volatility of one market drift step.
const MARKET_VOLATILITY: f64 = 0.05;

/// A catalog definition plus its mutable current level.
#[derive(Clone, Debug)]
pub struct UpgradeNode {
    def: UpgradeDef,
    level: u32,
}

impl UpgradeNode {
    pub fn def(&self) -> &UpgradeDef {
        &self.def
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Currency cost of the next level; infinity at max level.
    pub fn cost(&self) -> f64 {
        cost_at(&self.def, self.level)
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.def.max_level
    }
}

/// Achievement condition over engine state. Must be a pure read.
pub type AchievementPredicate = fn(&EngineState) -> bool;

/// Static definition of one achievement.
#[derive(Clone, Debug)]
pub struct AchievementDef {
    pub id: String,
    pub name: &'static str,
    pub desc: &'static str,
    pub condition: AchievementPredicate,
}

/// An achievement definition plus its unlocked flag.
/// Once unlocked, never re-locked.
#[derive(Clone, Debug)]
pub struct Achievement {
    def: AchievementDef,
    unlocked: bool,
}

impl Achievement {
    pub fn def(&self) -> &AchievementDef {
        &self.def
    }

    pub fn unlocked(&self) -> bool {
        self.unlocked
    }
}

/// All mutable progression state. Fields are private to the crate;
/// collaborators read through accessor methods and never mutate directly.
pub struct EngineState {
    nodes: Vec<UpgradeNode>,
    index: BTreeMap<String, usize>,
    ledger: Ledger,
    achievements: Vec<Achievement>,
    stats: DerivedStats,
    drift_ticks: u64,
}

impl EngineState {
    fn fresh(defs: Vec<UpgradeDef>, achievement_defs: Vec<AchievementDef>) -> Self {
        let mut index = BTreeMap::new();
        let nodes: Vec<UpgradeNode> = defs
            .into_iter()
            .map(|def| UpgradeNode { def, level: 0 })
            .collect();
        for (i, node) in nodes.iter().enumerate() {
            index.insert(node.def.id.0.clone(), i);
        }
        let achievements = achievement_defs
            .into_iter()
            .map(|def| Achievement {
                def,
                unlocked: false,
            })
            .collect();
        Self {
            nodes,
            index,
            ledger: Ledger::new(),
            achievements,
            stats: DerivedStats::default(),
            drift_ticks: 0,
        }
    }

    /// Node lookup by id; `None` for unknown identities (stale UI
    /// references from an older catalog must not crash).
    pub fn node(&self, id: &str) -> Option<&UpgradeNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes in declaration order, for tree listing.
    pub fn nodes(&self) -> &[UpgradeNode] {
        &self.nodes
    }

    pub fn level_of(&self, id: &str) -> Option<u32> {
        self.node(id).map(|n| n.level)
    }

    pub fn cost_of(&self, id: &str) -> Option<f64> {
        self.node(id).map(UpgradeNode::cost)
    }

    /// Spendable amount of `kind`.
    pub fn resource(&self, kind: ResourceKind) -> f64 {
        self.ledger.get(kind)
    }

    /// Lifetime total of `kind` ever gained.
    pub fn lifetime(&self, kind: ResourceKind) -> f64 {
        self.ledger.lifetime(kind)
    }

    pub fn stats(&self) -> &DerivedStats {
        &self.stats
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    /// Sum of all upgrade levels, used by aggregate achievement rules.
    pub fn total_levels(&self) -> u32 {
        self.nodes.iter().map(|n| n.level).sum()
    }

    /// Whether any node has reached its max level.
    pub fn any_maxed(&self) -> bool {
        self.nodes.iter().any(UpgradeNode::is_maxed)
    }

    fn to_save(&self) -> SaveData {
        SaveData {
            current: self.ledger.current_map(),
            lifetime: self.ledger.lifetime_map(),
            upgrades: self
                .nodes
                .iter()
                .map(|n| UpgradeLevel {
                    id: n.def.id.0.clone(),
                    level: n.level,
                })
                .collect(),
            achievements: self
                .achievements
                .iter()
                .map(|a| AchievementFlag {
                    id: a.def.id.clone(),
                    unlocked: a.unlocked,
                })
                .collect(),
            stats: StatsSnapshot {
                market_multiplier: self.stats.market_multiplier,
            },
            saved_at: Some(Utc::now()),
        }
    }

    fn apply_save(&mut self, data: &SaveData) {
        self.ledger = Ledger::from_parts(&data.current, &data.lifetime);
        for entry in &data.upgrades {
            // Unknown ids linger in old saves after catalog changes; skip
            // them. Hand-edited levels are clamped into range.
            if let Some(&i) = self.index.get(&entry.id) {
                let node = &mut self.nodes[i];
                node.level = entry.level.min(node.def.max_level);
            }
        }
        // Effect replay reconstructs every derived statistic. Effects set
        // absolute values from the level, so replay order cannot matter.
        for i in 0..self.nodes.len() {
            let level = self.nodes[i].level;
            if level > 0 {
                let effect = self.nodes[i].def.effect;
                effect(&mut self.stats, level);
            }
        }
        for flag in &data.achievements {
            if flag.unlocked {
                if let Some(a) = self
                    .achievements
                    .iter_mut()
                    .find(|a| a.def.id == flag.id)
                {
                    a.unlocked = true;
                }
            }
        }
        let snap = data.stats.market_multiplier;
        if snap.is_finite() && snap > 0.0 {
            self.stats.market_multiplier =
                snap.clamp(game_econ::MARKET_FLOOR, game_econ::MARKET_CEIL);
        }
    }
}

/// The progression engine: state plus its write-through save store.
pub struct Engine<S: SaveStore> {
    state: EngineState,
    store: S,
}

impl<S: SaveStore> Engine<S> {
    /// Build the engine, loading persisted progress from `store` if any.
    ///
    /// A missing blob means a fresh game; a failing store is logged and
    /// also treated as fresh (nothing in the engine is fatal).
    pub fn new(store: S) -> Result<Self, CatalogError> {
        let defs = catalog();
        validate_catalog(&defs)?;
        let state = EngineState::fresh(defs, achievements());
        let mut engine = Self { state, store };
        engine.load();
        Ok(engine)
    }

    fn load(&mut self) {
        match self.store.load() {
            Ok(Some(data)) => {
                self.state.apply_save(&data);
                info!(
                    upgrades = data.upgrades.len(),
                    achievements = data.achievements.len(),
                    "restored persisted progress"
                );
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to read save; starting fresh"),
        }
    }

    fn persist(&mut self) {
        let data = self.state.to_save();
        if let Err(e) = self.store.save(&data) {
            warn!(error = %e, "write-through save failed");
        }
    }

    /// Read access to all progression state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Whether `id` is purchasable right now. Four independent checks:
    /// the node exists and is below max level, the currency cost is
    /// affordable, the one-time material price (level 0 only) is
    /// affordable, and the parent (if any) has been purchased at least
    /// once. Gating is re-checked here on every call, never cached.
    pub fn can_unlock(&self, id: &str) -> bool {
        let Some(node) = self.state.node(id) else {
            return false;
        };
        if node.is_maxed() {
            return false;
        }
        if self.state.ledger.get(ResourceKind::Credits) < node.cost() {
            return false;
        }
        if node.level == 0 {
            if let Some(price) = &node.def.material_price {
                if self.state.ledger.get(price.kind) < price.amount {
                    return false;
                }
            }
        }
        if let Some(parent) = &node.def.parent {
            match self.state.node(&parent.0) {
                Some(p) if p.level >= 1 => {}
                _ => return false,
            }
        }
        true
    }

    /// Execute a purchase. Re-validates affordability (a stale UI check is
    /// never trusted), deducts the currency cost and any one-time material
    /// price atomically, increments the level, applies the node's effect,
    /// and saves. Returns false with zero side effects on any failure;
    /// unaffordable purchases are expected, not exceptional.
    pub fn unlock(&mut self, id: &str) -> bool {
        if !self.can_unlock(id) {
            return false;
        }
        let Some(&idx) = self.state.index.get(id) else {
            return false;
        };
        let (cost, price, new_level, effect) = {
            let node = &self.state.nodes[idx];
            (
                node.cost(),
                node.def.material_price.clone(),
                node.level + 1,
                node.def.effect,
            )
        };
        let mut costs = vec![(ResourceKind::Credits, cost)];
        if new_level == 1 {
            if let Some(price) = &price {
                costs.push((price.kind, price.amount));
            }
        }
        // Both costs were validated above; spend_all verifies them again
        // and deducts both or neither.
        if !self.state.ledger.spend_all(&costs) {
            return false;
        }
        self.state.nodes[idx].level = new_level;
        effect(&mut self.state.stats, new_level);
        debug!(id, level = new_level, cost, "upgrade purchased");
        self.persist();
        true
    }

    /// Credit resources earned by gameplay; write-through on change.
    pub fn add_resource(&mut self, kind: ResourceKind, amount: f64) {
        let before = self.state.ledger.lifetime(kind);
        self.state.ledger.add(kind, amount);
        if self.state.ledger.lifetime(kind) != before {
            self.persist();
        }
    }

    /// Spend resources outside the upgrade path (e.g. combat-mode entry
    /// fees). Returns false and saves nothing when insufficient.
    pub fn spend_resource(&mut self, kind: ResourceKind, amount: f64) -> bool {
        if self.state.ledger.spend(kind, amount) {
            self.persist();
            true
        } else {
            false
        }
    }

    /// Scan achievements in declaration order and unlock the first entry
    /// whose condition newly holds, returning its display name. At most
    /// one unlock per call: callers show one toast and poll again for the
    /// rest. Returns `None` once nothing new is satisfiable.
    pub fn check_achievements(&mut self) -> Option<String> {
        let hit = self
            .state
            .achievements
            .iter()
            .position(|a| !a.unlocked && (a.def.condition)(&self.state))?;
        self.state.achievements[hit].unlocked = true;
        let name = self.state.achievements[hit].def.name.to_string();
        info!(achievement = %name, "achievement unlocked");
        self.persist();
        Some(name)
    }

    /// Advance passive income by `dt_secs`: interest on credits, auto-sale
    /// of scrap at the current salvage and market rates, and periodic
    /// market drift. Saves once if anything changed.
    pub fn tick_passive(&mut self, dt_secs: f64) {
        if !dt_secs.is_finite() || dt_secs <= 0.0 {
            return;
        }
        let mut changed = false;
        let stats = self.state.stats;
        if stats.interest_rate > 0.0 {
            let balance = self.state.ledger.get(ResourceKind::Credits);
            if let Ok(payout) = interest_payout(balance, stats.interest_rate, dt_secs) {
                if payout > 0.0 {
                    self.state.ledger.add(ResourceKind::Credits, payout);
                    changed = true;
                }
            }
        }
        if stats.auto_sell_rate > 0.0 {
            let stock = self.state.ledger.get(ResourceKind::Scrap);
            if let Ok(units) = auto_sell_units(stock, stats.auto_sell_rate, dt_secs) {
                if units > 0.0 && self.state.ledger.spend(ResourceKind::Scrap, units) {
                    let payout = units * stats.salvage_value * stats.market_multiplier;
                    self.state.ledger.add(ResourceKind::Credits, payout);
                    changed = true;
                }
            }
        }
        self.state.drift_ticks += 1;
        if self.state.drift_ticks % DRIFT_EVERY_TICKS == 0 {
            if let Ok(next) = market_drift(
                stats.market_multiplier,
                MARKET_VOLATILITY,
                self.state.drift_ticks,
            ) {
                if next != stats.market_multiplier {
                    self.state.stats.market_multiplier = next;
                    changed = true;
                }
            }
        }
        if changed {
            self.persist();
        }
    }

    /// Force a save of the current state.
    pub fn save(&mut self) {
        self.persist();
    }

    /// Destructive, user-confirmed reset: clears the persisted blob and
    /// rebuilds catalog, achievements, ledger, and derived statistics from
    /// hardcoded defaults, exactly like loading with no blob.
    pub fn reset(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear save on reset");
        }
        self.state = EngineState::fresh(catalog(), achievements());
        info!("progress reset to defaults");
    }
}
