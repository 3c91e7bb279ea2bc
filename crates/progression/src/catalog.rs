//! The hand-authored upgrade catalog.
//!
//! Declaration order only fixes UI iteration order; parent references are
//! resolved by lookup, so they may point forward. Each derived statistic is
//! owned by exactly one node, which keeps effect replay order-independent.

use game_core::{MaterialPrice, NodeLayout, ResourceKind, UpgradeDef, UpgradeId};

fn id(s: &str) -> UpgradeId {
    UpgradeId::new(s)
}

/// Build the full upgrade forest with every node at level 0.
pub fn catalog() -> Vec<UpgradeDef> {
    vec![
        UpgradeDef {
            id: id("plasma_cutter"),
            name: "Plasma Cutter",
            desc: "Sharpen the beam. Each level adds +0.5 damage per shot.",
            base_cost: 15.0,
            growth: 1.5,
            max_level: 50,
            parent: None,
            material_price: None,
            effect: |s, level| s.click_power = 1.0 + 0.5 * f64::from(level),
            layout: NodeLayout { col: 0, row: 0 },
        },
        UpgradeDef {
            id: id("appraisal"),
            name: "Appraisal Software",
            desc: "Better valuations: +25% object value per level.",
            base_cost: 50.0,
            growth: 1.6,
            max_level: 25,
            parent: None,
            material_price: None,
            effect: |s, level| s.value_multiplier = 1.0 + 0.25 * f64::from(level),
            layout: NodeLayout { col: 1, row: 0 },
        },
        UpgradeDef {
            id: id("tractor_beam"),
            name: "Tractor Beam",
            desc: "Pull debris in faster: -5% spawn interval per level.",
            base_cost: 100.0,
            growth: 1.6,
            max_level: 20,
            parent: None,
            material_price: None,
            effect: |s, level| s.spawn_interval_secs = 2.0 * 0.95_f64.powi(level as i32),
            layout: NodeLayout { col: 2, row: 0 },
        },
        UpgradeDef {
            id: id("crit_lens"),
            name: "Critical Lens",
            desc: "+4% critical destruction chance per level.",
            base_cost: 400.0,
            growth: 1.7,
            max_level: 10,
            parent: Some(id("appraisal")),
            material_price: Some(MaterialPrice {
                kind: ResourceKind::Crystal,
                amount: 5.0,
            }),
            effect: |s, level| s.crit_chance = 0.04 * f64::from(level),
            layout: NodeLayout { col: 1, row: 1 },
        },
        UpgradeDef {
            id: id("golden_cores"),
            name: "Golden Cores",
            desc: "Rare objects worth 10x can now spawn.",
            base_cost: 25_000.0,
            growth: 2.0,
            max_level: 1,
            parent: Some(id("crit_lens")),
            material_price: Some(MaterialPrice {
                kind: ResourceKind::Crystal,
                amount: 40.0,
            }),
            effect: |s, level| s.golden_chance = 0.02 * f64::from(level.min(1)),
            layout: NodeLayout { col: 1, row: 2 },
        },
        UpgradeDef {
            id: id("spawn_bay"),
            name: "Spawn Bay",
            desc: "+2 simultaneous objects per level.",
            base_cost: 250.0,
            growth: 1.8,
            max_level: 15,
            parent: Some(id("tractor_beam")),
            material_price: None,
            effect: |s, level| s.max_objects = 5 + 2 * level,
            layout: NodeLayout { col: 2, row: 1 },
        },
        UpgradeDef {
            id: id("dense_rocks"),
            name: "Dense Rocks",
            desc: "Tougher objects that pay out more.",
            base_cost: 1_200.0,
            growth: 1.9,
            max_level: 12,
            parent: Some(id("spawn_bay")),
            material_price: None,
            effect: |s, level| {
                s.object_hp_multiplier = 1.0 + 0.3 * f64::from(level);
                s.object_value = 1.0 + 0.5 * f64::from(level);
            },
            layout: NodeLayout { col: 2, row: 2 },
        },
        UpgradeDef {
            id: id("scrap_magnet"),
            name: "Scrap Magnet",
            desc: "Gadget: drops drift toward you.",
            base_cost: 750.0,
            growth: 1.5,
            max_level: 1,
            parent: Some(id("plasma_cutter")),
            material_price: Some(MaterialPrice {
                kind: ResourceKind::Scrap,
                amount: 25.0,
            }),
            effect: |s, level| s.magnet_enabled = level >= 1,
            layout: NodeLayout { col: 0, row: 1 },
        },
        UpgradeDef {
            id: id("salvage_rig"),
            name: "Salvage Rig",
            desc: "+3% material drop chance per level.",
            base_cost: 900.0,
            growth: 1.6,
            max_level: 10,
            parent: Some(id("scrap_magnet")),
            material_price: None,
            effect: |s, level| s.material_drop_chance = 0.05 + 0.03 * f64::from(level),
            layout: NodeLayout { col: 0, row: 2 },
        },
        UpgradeDef {
            id: id("refinery"),
            name: "Refinery",
            desc: "Scrap sells for +0.25 credits per level.",
            base_cost: 3_000.0,
            growth: 1.7,
            max_level: 8,
            parent: Some(id("salvage_rig")),
            material_price: Some(MaterialPrice {
                kind: ResourceKind::Scrap,
                amount: 200.0,
            }),
            effect: |s, level| s.salvage_value = 0.5 + 0.25 * f64::from(level),
            layout: NodeLayout { col: 0, row: 3 },
        },
        UpgradeDef {
            id: id("auto_trader"),
            name: "Auto-Trader",
            desc: "Facility: sells 0.5 scrap per second per level.",
            base_cost: 2_000.0,
            growth: 1.8,
            max_level: 10,
            parent: None,
            material_price: Some(MaterialPrice {
                kind: ResourceKind::Scrap,
                amount: 50.0,
            }),
            effect: |s, level| s.auto_sell_rate = 0.5 * f64::from(level),
            layout: NodeLayout { col: 3, row: 0 },
        },
        UpgradeDef {
            id: id("orbital_bank"),
            name: "Orbital Bank",
            desc: "Facility: passive interest on credits.",
            base_cost: 10_000.0,
            growth: 2.0,
            max_level: 5,
            parent: Some(id("auto_trader")),
            material_price: None,
            effect: |s, level| s.interest_rate = 0.0002 * f64::from(level),
            layout: NodeLayout { col: 3, row: 1 },
        },
        UpgradeDef {
            id: id("weapons_lab"),
            name: "Weapons Lab",
            desc: "Opens combat-meta research. +5 hull for sorties.",
            base_cost: 5_000.0,
            growth: 1.9,
            max_level: 1,
            parent: None,
            material_price: Some(MaterialPrice {
                kind: ResourceKind::Alloy,
                amount: 10.0,
            }),
            effect: |s, level| s.hull_bonus = 5.0 * f64::from(level.min(1)),
            layout: NodeLayout { col: 4, row: 0 },
        },
        UpgradeDef {
            id: id("arc_munitions"),
            name: "Arc Munitions",
            desc: "+15% sortie damage per level.",
            base_cost: 8_000.0,
            growth: 1.75,
            max_level: 15,
            parent: Some(id("weapons_lab")),
            material_price: None,
            effect: |s, level| s.damage_multiplier = 1.0 + 0.15 * f64::from(level),
            layout: NodeLayout { col: 4, row: 1 },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{cost_at, validate_catalog, DerivedStats};

    #[test]
    fn catalog_is_well_formed() {
        let defs = catalog();
        assert_eq!(validate_catalog(&defs), Ok(()));
        assert_eq!(defs.len(), 14);
    }

    #[test]
    fn forest_has_multiple_roots_and_a_deep_chain() {
        let defs = catalog();
        let roots = defs.iter().filter(|d| d.parent.is_none()).count();
        assert!(roots >= 3);
        // plasma_cutter -> scrap_magnet -> salvage_rig -> refinery
        let depth_of = |name: &str| {
            let mut name = name;
            let mut depth = 0;
            while let Some(def) = defs.iter().find(|d| d.id.0 == name) {
                match &def.parent {
                    Some(p) => {
                        depth += 1;
                        name = &p.0;
                    }
                    None => break,
                }
            }
            depth
        };
        assert_eq!(depth_of("refinery"), 3);
    }

    #[test]
    fn effects_are_absolute_functions_of_level() {
        // Applying an effect twice at the same level must be idempotent,
        // and applying stale levels first must not leak through.
        let defs = catalog();
        for def in &defs {
            let mut a = DerivedStats::default();
            (def.effect)(&mut a, 3u32.min(def.max_level));
            let mut b = DerivedStats::default();
            (def.effect)(&mut b, 1u32.min(def.max_level));
            (def.effect)(&mut b, 3u32.min(def.max_level));
            (def.effect)(&mut b, 3u32.min(def.max_level));
            assert_eq!(a, b, "effect of {} accumulates", def.id.0);
        }
    }

    #[test]
    fn single_purchase_nodes_cost_infinity_after_one_buy() {
        let defs = catalog();
        let magnet = defs.iter().find(|d| d.id.0 == "scrap_magnet").unwrap();
        assert!(cost_at(magnet, 0).is_finite());
        assert_eq!(cost_at(magnet, 1), f64::INFINITY);
    }
}
