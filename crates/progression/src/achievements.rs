//! The flat achievement list, scanned in declaration order.
//!
//! Conditions are plain boolean reads over engine state; the rule set is
//! small and authored alongside the catalog, so no separate rule language.

use crate::AchievementDef;
use game_core::ResourceKind;

/// Build the achievement list with every flag cleared.
pub fn achievements() -> Vec<AchievementDef> {
    vec![
        AchievementDef {
            id: "first_spark".into(),
            name: "First Spark",
            desc: "Earn your first credit.",
            condition: |e| e.lifetime(ResourceKind::Credits) >= 1.0,
        },
        AchievementDef {
            id: "pocket_change".into(),
            name: "Pocket Change",
            desc: "Earn 1,000 lifetime credits.",
            condition: |e| e.lifetime(ResourceKind::Credits) >= 1_000.0,
        },
        AchievementDef {
            id: "magnate".into(),
            name: "Magnate",
            desc: "Earn 1,000,000 lifetime credits.",
            condition: |e| e.lifetime(ResourceKind::Credits) >= 1_000_000.0,
        },
        AchievementDef {
            id: "scrap_collector".into(),
            name: "Scrap Collector",
            desc: "Salvage 100 lifetime scrap.",
            condition: |e| e.lifetime(ResourceKind::Scrap) >= 100.0,
        },
        AchievementDef {
            id: "crystal_clear".into(),
            name: "Crystal Clear",
            desc: "Salvage 50 lifetime crystal.",
            condition: |e| e.lifetime(ResourceKind::Crystal) >= 50.0,
        },
        AchievementDef {
            id: "quartermaster".into(),
            name: "Quartermaster",
            desc: "Hold 100 scrap, 25 crystal, and 10 alloy at once.",
            condition: |e| {
                e.resource(ResourceKind::Scrap) >= 100.0
                    && e.resource(ResourceKind::Crystal) >= 25.0
                    && e.resource(ResourceKind::Alloy) >= 10.0
            },
        },
        AchievementDef {
            id: "first_fit".into(),
            name: "First Fit",
            desc: "Buy any upgrade.",
            condition: |e| e.total_levels() >= 1,
        },
        AchievementDef {
            id: "tinkerer".into(),
            name: "Tinkerer",
            desc: "Reach 25 total upgrade levels.",
            condition: |e| e.total_levels() >= 25,
        },
        AchievementDef {
            id: "maxed_out".into(),
            name: "Maxed Out",
            desc: "Take any upgrade to its final level.",
            condition: |e| e.any_maxed(),
        },
        AchievementDef {
            id: "golden_touch".into(),
            name: "Golden Touch",
            desc: "Unlock Golden Cores.",
            condition: |e| e.level_of("golden_cores").unwrap_or(0) >= 1,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn ids_are_unique() {
        let defs = achievements();
        let ids: BTreeSet<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), defs.len());
    }

    #[test]
    fn list_has_declaration_order_thresholds() {
        // The credits thresholds come first and in ascending order, so the
        // one-per-call scan surfaces them as a sensible toast sequence.
        let defs = achievements();
        assert_eq!(defs[0].id, "first_spark");
        assert_eq!(defs[1].id, "pocket_change");
        assert_eq!(defs[2].id, "magnate");
    }
}
