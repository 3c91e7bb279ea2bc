#![deny(warnings)]

//! Economic primitives for the Starfall progression engine.
//!
//! This crate provides:
//! - The resource ledger: current and lifetime balances per kind, with the
//!   add/spend primitives every other subsystem goes through
//! - Passive-income helpers: interest, auto-sell, and seeded market drift

use game_core::ResourceKind;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Lower clamp for the stochastic market multiplier.
pub const MARKET_FLOOR: f64 = 0.5;
/// Upper clamp for the stochastic market multiplier.
pub const MARKET_CEIL: f64 = 2.0;

/// Errors produced by the passive-income helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Numeric inputs must be finite.
    #[error("non-finite numeric input")]
    NonFinite,
    /// Balances, rates, and durations must be non-negative.
    #[error("negative amount, rate, or duration")]
    Negative,
    /// Drift volatility must lie in [0, 1).
    #[error("volatility out of range [0,1): {0}")]
    InvalidVolatility(f64),
}

/// Spendable and lifetime-accumulated quantity of one resource kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Currently spendable amount.
    pub current: f64,
    /// Monotonically non-decreasing total of everything ever gained.
    pub lifetime: f64,
}

/// Authoritative store of resource quantities.
///
/// The ledger knows nothing about upgrades; it only enforces the two
/// accounting invariants: `current` is reduced only by a sufficient spend,
/// and `lifetime` is incremented exactly once per gain, never decremented.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    balances: BTreeMap<ResourceKind, Balance>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted maps, falling back to zero for any
    /// missing, negative, or non-finite field (schema-evolution tolerance).
    pub fn from_parts(
        current: &BTreeMap<ResourceKind, f64>,
        lifetime: &BTreeMap<ResourceKind, f64>,
    ) -> Self {
        let sane = |v: Option<&f64>| -> f64 {
            match v {
                Some(&x) if x.is_finite() && x >= 0.0 => x,
                _ => 0.0,
            }
        };
        let mut balances = BTreeMap::new();
        for kind in ResourceKind::ALL {
            balances.insert(
                kind,
                Balance {
                    current: sane(current.get(&kind)),
                    lifetime: sane(lifetime.get(&kind)),
                },
            );
        }
        Self { balances }
    }

    /// Credit `amount` of `kind`: raises both current and lifetime totals.
    ///
    /// Non-positive or non-finite amounts are ignored; negative deltas are
    /// expressed through [`Ledger::spend`], never through `add`.
    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        let entry = self.balances.entry(kind).or_default();
        entry.current += amount;
        entry.lifetime += amount;
    }

    /// Deduct `amount` of `kind` if affordable. Returns false and makes no
    /// change when current < amount. The sole deduction path; lifetime
    /// totals are never touched here.
    pub fn spend(&mut self, kind: ResourceKind, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        let entry = self.balances.entry(kind).or_default();
        if entry.current < amount {
            return false;
        }
        entry.current -= amount;
        true
    }

    /// Deduct several costs atomically: every cost is verified against the
    /// current balance (summed per kind) before anything is deducted.
    /// Returns false with no change if any kind is insufficient.
    pub fn spend_all(&mut self, costs: &[(ResourceKind, f64)]) -> bool {
        let mut totals: BTreeMap<ResourceKind, f64> = BTreeMap::new();
        for (kind, amount) in costs {
            if !amount.is_finite() || *amount < 0.0 {
                return false;
            }
            *totals.entry(*kind).or_insert(0.0) += amount;
        }
        if totals.iter().any(|(kind, total)| self.get(*kind) < *total) {
            return false;
        }
        for (kind, total) in &totals {
            let entry = self.balances.entry(*kind).or_default();
            entry.current -= total;
        }
        true
    }

    /// Currently spendable amount of `kind`.
    pub fn get(&self, kind: ResourceKind) -> f64 {
        self.balances.get(&kind).map_or(0.0, |b| b.current)
    }

    /// Lifetime total of `kind` ever gained.
    pub fn lifetime(&self, kind: ResourceKind) -> f64 {
        self.balances.get(&kind).map_or(0.0, |b| b.lifetime)
    }

    /// Current balances keyed by kind, for the save blob.
    pub fn current_map(&self) -> BTreeMap<ResourceKind, f64> {
        ResourceKind::ALL
            .into_iter()
            .map(|k| (k, self.get(k)))
            .collect()
    }

    /// Lifetime balances keyed by kind, for the save blob.
    pub fn lifetime_map(&self) -> BTreeMap<ResourceKind, f64> {
        ResourceKind::ALL
            .into_iter()
            .map(|k| (k, self.lifetime(k)))
            .collect()
    }
}

/// Passive interest earned on a balance over `dt_secs`.
///
/// Example:
/// interest_payout(1000.0, 0.001, 2.0) pays 2.0 credits.
pub fn interest_payout(balance: f64, rate_per_sec: f64, dt_secs: f64) -> Result<f64, EconError> {
    if !(balance.is_finite() && rate_per_sec.is_finite() && dt_secs.is_finite()) {
        return Err(EconError::NonFinite);
    }
    if balance < 0.0 || rate_per_sec < 0.0 || dt_secs < 0.0 {
        return Err(EconError::Negative);
    }
    Ok(balance * rate_per_sec * dt_secs)
}

/// Units auto-sold from `stock` over `dt_secs` at `rate_per_sec`.
/// Never exceeds the available stock.
pub fn auto_sell_units(stock: f64, rate_per_sec: f64, dt_secs: f64) -> Result<f64, EconError> {
    if !(stock.is_finite() && rate_per_sec.is_finite() && dt_secs.is_finite()) {
        return Err(EconError::NonFinite);
    }
    if stock < 0.0 || rate_per_sec < 0.0 || dt_secs < 0.0 {
        return Err(EconError::Negative);
    }
    Ok((rate_per_sec * dt_secs).min(stock))
}

/// One step of multiplicative market drift with uniform noise in
/// [1-volatility, 1+volatility], clamped to [MARKET_FLOOR, MARKET_CEIL].
///
/// Noise is seeded for reproducibility: the same (multiplier, volatility,
/// seed) triple always drifts to the same value.
pub fn market_drift(multiplier: f64, volatility: f64, seed: u64) -> Result<f64, EconError> {
    if !(multiplier.is_finite() && volatility.is_finite()) {
        return Err(EconError::NonFinite);
    }
    if multiplier <= 0.0 {
        return Err(EconError::Negative);
    }
    if !(0.0..1.0).contains(&volatility) {
        return Err(EconError::InvalidVolatility(volatility));
    }
    if volatility == 0.0 {
        return Ok(multiplier.clamp(MARKET_FLOOR, MARKET_CEIL));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let u: f64 = rng.gen_range(-volatility..=volatility);
    Ok((multiplier * (1.0 + u)).clamp(MARKET_FLOOR, MARKET_CEIL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_raises_current_and_lifetime_once() {
        let mut l = Ledger::new();
        l.add(ResourceKind::Credits, 100.0);
        l.add(ResourceKind::Credits, 50.0);
        assert_eq!(l.get(ResourceKind::Credits), 150.0);
        assert_eq!(l.lifetime(ResourceKind::Credits), 150.0);
    }

    #[test]
    fn add_ignores_non_positive_and_non_finite() {
        let mut l = Ledger::new();
        l.add(ResourceKind::Scrap, -5.0);
        l.add(ResourceKind::Scrap, 0.0);
        l.add(ResourceKind::Scrap, f64::NAN);
        l.add(ResourceKind::Scrap, f64::INFINITY);
        assert_eq!(l.get(ResourceKind::Scrap), 0.0);
        assert_eq!(l.lifetime(ResourceKind::Scrap), 0.0);
    }

    #[test]
    fn spend_is_exact_or_a_no_op() {
        let mut l = Ledger::new();
        l.add(ResourceKind::Credits, 100.0);
        assert!(l.spend(ResourceKind::Credits, 40.0));
        assert_eq!(l.get(ResourceKind::Credits), 60.0);
        assert!(!l.spend(ResourceKind::Credits, 61.0));
        assert_eq!(l.get(ResourceKind::Credits), 60.0);
        // lifetime untouched by spends
        assert_eq!(l.lifetime(ResourceKind::Credits), 100.0);
    }

    #[test]
    fn spend_all_is_atomic() {
        let mut l = Ledger::new();
        l.add(ResourceKind::Credits, 100.0);
        l.add(ResourceKind::Crystal, 3.0);
        // crystal is insufficient: nothing may change
        assert!(!l.spend_all(&[
            (ResourceKind::Credits, 50.0),
            (ResourceKind::Crystal, 5.0),
        ]));
        assert_eq!(l.get(ResourceKind::Credits), 100.0);
        assert_eq!(l.get(ResourceKind::Crystal), 3.0);
        assert!(l.spend_all(&[
            (ResourceKind::Credits, 50.0),
            (ResourceKind::Crystal, 3.0),
        ]));
        assert_eq!(l.get(ResourceKind::Credits), 50.0);
        assert_eq!(l.get(ResourceKind::Crystal), 0.0);
    }

    #[test]
    fn spend_all_sums_duplicate_kinds_before_checking() {
        let mut l = Ledger::new();
        l.add(ResourceKind::Credits, 100.0);
        assert!(!l.spend_all(&[
            (ResourceKind::Credits, 60.0),
            (ResourceKind::Credits, 60.0),
        ]));
        assert_eq!(l.get(ResourceKind::Credits), 100.0);
    }

    #[test]
    fn from_parts_falls_back_to_zero() {
        let mut current = BTreeMap::new();
        current.insert(ResourceKind::Credits, 42.0);
        current.insert(ResourceKind::Scrap, -3.0);
        current.insert(ResourceKind::Crystal, f64::NAN);
        let lifetime = BTreeMap::new();
        let l = Ledger::from_parts(&current, &lifetime);
        assert_eq!(l.get(ResourceKind::Credits), 42.0);
        assert_eq!(l.get(ResourceKind::Scrap), 0.0);
        assert_eq!(l.get(ResourceKind::Crystal), 0.0);
        assert_eq!(l.lifetime(ResourceKind::Credits), 0.0);
    }

    #[test]
    fn interest_scales_with_balance_and_time() {
        assert_eq!(interest_payout(1000.0, 0.001, 2.0).unwrap(), 2.0);
        assert_eq!(interest_payout(0.0, 0.5, 10.0).unwrap(), 0.0);
        assert!(interest_payout(-1.0, 0.1, 1.0).is_err());
        assert!(interest_payout(1.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn auto_sell_never_exceeds_stock() {
        assert_eq!(auto_sell_units(10.0, 3.0, 2.0).unwrap(), 6.0);
        assert_eq!(auto_sell_units(4.0, 3.0, 2.0).unwrap(), 4.0);
        assert_eq!(auto_sell_units(0.0, 3.0, 2.0).unwrap(), 0.0);
    }

    #[test]
    fn drift_is_seeded_and_clamped() {
        let a = market_drift(1.0, 0.1, 42).unwrap();
        let b = market_drift(1.0, 0.1, 42).unwrap();
        assert_eq!(a, b);
        assert!((MARKET_FLOOR..=MARKET_CEIL).contains(&a));
        // zero volatility is the identity inside the clamp band
        assert_eq!(market_drift(1.3, 0.0, 7).unwrap(), 1.3);
        assert_eq!(market_drift(9.0, 0.0, 7).unwrap(), MARKET_CEIL);
        assert!(market_drift(1.0, 1.0, 7).is_err());
        assert!(market_drift(0.0, 0.1, 7).is_err());
    }

    proptest! {
        #[test]
        fn spend_reflects_exactly_previous_minus_amount(start in 0.0f64..1e9,
                                                        amount in 0.0f64..1e9) {
            let mut l = Ledger::new();
            l.add(ResourceKind::Credits, start);
            let before = l.get(ResourceKind::Credits);
            let ok = l.spend(ResourceKind::Credits, amount);
            if ok {
                prop_assert!((l.get(ResourceKind::Credits) - (before - amount)).abs() < 1e-9);
            } else {
                prop_assert_eq!(l.get(ResourceKind::Credits), before);
            }
        }

        #[test]
        fn lifetime_dominates_current(adds in proptest::collection::vec(0.1f64..1e6, 0..20),
                                      spends in proptest::collection::vec(0.1f64..1e6, 0..20)) {
            let mut l = Ledger::new();
            for a in adds {
                l.add(ResourceKind::Scrap, a);
            }
            for s in spends {
                let _ = l.spend(ResourceKind::Scrap, s);
            }
            prop_assert!(l.lifetime(ResourceKind::Scrap) >= l.get(ResourceKind::Scrap));
            prop_assert!(l.get(ResourceKind::Scrap) >= 0.0);
        }

        #[test]
        fn drift_stays_in_band(m in 0.5f64..2.0, vol in 0.0f64..0.5, seed in 0u64..1000) {
            let next = market_drift(m, vol, seed).unwrap();
            prop_assert!((MARKET_FLOOR..=MARKET_CEIL).contains(&next));
        }
    }
}
