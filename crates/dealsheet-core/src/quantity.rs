//! Order-quantity snapping for "buy X get Y free" deals.
//!
//! When a customer's quantity lands between a tier's buy threshold and its
//! target (buy + free), they are about to receive free units they didn't
//! order for. These helpers snap the quantity to the tier's target, or just
//! below the threshold when the customer is stepping down.

use crate::error::DealsError;
use crate::model::DealTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// How the quantity was changed, which decides the snapping direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QtyNormalizeMode {
    Increase,
    Decrease,
    Input,
    Hydrate,
}

impl FromStr for QtyNormalizeMode {
    type Err = DealsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "increase" => Ok(QtyNormalizeMode::Increase),
            "decrease" => Ok(QtyNormalizeMode::Decrease),
            "input" => Ok(QtyNormalizeMode::Input),
            "hydrate" => Ok(QtyNormalizeMode::Hydrate),
            other => Err(DealsError::OptionsInvalid(format!(
                "unknown quantity mode '{other}' (expected increase, decrease, input or hydrate)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityTier {
    pub buy_qty: u32,
    pub free_qty: u32,
    pub target_qty: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTierProgress {
    pub has_next_tier: bool,
    pub remaining: u32,
    pub next_target_qty: Option<u32>,
}

/// Build quantity tiers from deal tiers: invalid tiers dropped, duplicates
/// collapsed, sorted by buy then target.
pub fn build_quantity_tiers(tiers: &[DealTier]) -> Vec<QuantityTier> {
    let unique: BTreeMap<(u32, u32), QuantityTier> = tiers
        .iter()
        .filter(|t| t.is_valid())
        .map(|t| {
            let qt = QuantityTier {
                buy_qty: t.buy_qty,
                free_qty: t.free_qty,
                target_qty: t.target_qty(),
            };
            ((qt.buy_qty, qt.target_qty), qt)
        })
        .collect();
    unique.into_values().collect()
}

/// Clamp an arbitrary quantity to a non-negative integer.
fn clamp_qty(raw_qty: i64) -> u32 {
    u32::try_from(raw_qty.max(0)).unwrap_or(u32::MAX)
}

/// The highest tier whose [buy, target) gap contains `qty`.
fn find_gap_tier(qty: u32, tiers: &[QuantityTier]) -> Option<&QuantityTier> {
    tiers
        .iter()
        .rev()
        .find(|t| qty >= t.buy_qty && qty < t.target_qty)
}

/// Snap a quantity out of a deal gap.
///
/// `Decrease` drops to one below the buy threshold; every other mode rounds
/// up to the tier's target. Quantities outside every gap pass through.
pub fn normalize_qty_for_deal(raw_qty: i64, tiers: &[QuantityTier], mode: QtyNormalizeMode) -> u32 {
    let qty = clamp_qty(raw_qty);
    if qty == 0 || tiers.is_empty() {
        return qty;
    }

    match find_gap_tier(qty, tiers) {
        None => qty,
        Some(tier) if mode == QtyNormalizeMode::Decrease => tier.buy_qty.saturating_sub(1),
        Some(tier) => tier.target_qty,
    }
}

/// Distance from `current_qty` to the smallest target above it.
pub fn get_next_tier_progress(current_qty: i64, tiers: &[QuantityTier]) -> NextTierProgress {
    let qty = clamp_qty(current_qty);
    let next = tiers
        .iter()
        .map(|t| t.target_qty)
        .filter(|&target| target > qty)
        .min();

    match next {
        Some(target) => NextTierProgress {
            has_next_tier: true,
            remaining: target - qty,
            next_target_qty: Some(target),
        },
        None => NextTierProgress {
            has_next_tier: false,
            remaining: 0,
            next_target_qty: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<QuantityTier> {
        build_quantity_tiers(&[
            DealTier { buy_qty: 20, free_qty: 7 },
            DealTier { buy_qty: 10, free_qty: 3 },
            DealTier { buy_qty: 10, free_qty: 3 },
        ])
    }

    #[test]
    fn test_build_dedupes_and_sorts() {
        let tiers = tiers();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].target_qty, 13);
        assert_eq!(tiers[1].target_qty, 27);
    }

    #[test]
    fn test_build_drops_invalid() {
        let tiers = build_quantity_tiers(&[DealTier { buy_qty: 0, free_qty: 3 }]);
        assert!(tiers.is_empty());
    }

    #[test]
    fn test_increase_jumps_to_target() {
        assert_eq!(normalize_qty_for_deal(10, &tiers(), QtyNormalizeMode::Increase), 13);
    }

    #[test]
    fn test_decrease_drops_below_threshold() {
        assert_eq!(normalize_qty_for_deal(12, &tiers(), QtyNormalizeMode::Decrease), 9);
    }

    #[test]
    fn test_typed_and_hydrated_values_round_up() {
        assert_eq!(normalize_qty_for_deal(23, &tiers(), QtyNormalizeMode::Input), 27);
        assert_eq!(normalize_qty_for_deal(22, &tiers(), QtyNormalizeMode::Hydrate), 27);
    }

    #[test]
    fn test_outside_gaps_pass_through() {
        for qty in [0, 5, 9, 13, 15, 19, 27, 40] {
            for mode in [QtyNormalizeMode::Increase, QtyNormalizeMode::Decrease] {
                assert_eq!(normalize_qty_for_deal(qty, &tiers(), mode), qty as u32, "qty {qty}");
            }
        }
    }

    #[test]
    fn test_negative_quantity_clamps_to_zero() {
        assert_eq!(normalize_qty_for_deal(-4, &tiers(), QtyNormalizeMode::Input), 0);
        assert_eq!(normalize_qty_for_deal(12, &[], QtyNormalizeMode::Input), 12);
    }

    #[test]
    fn test_next_tier_progress() {
        assert_eq!(
            get_next_tier_progress(13, &tiers()),
            NextTierProgress {
                has_next_tier: true,
                remaining: 14,
                next_target_qty: Some(27),
            }
        );
        assert_eq!(
            get_next_tier_progress(1, &tiers()),
            NextTierProgress {
                has_next_tier: true,
                remaining: 12,
                next_target_qty: Some(13),
            }
        );
    }

    #[test]
    fn test_top_tier_reached() {
        assert_eq!(
            get_next_tier_progress(27, &tiers()),
            NextTierProgress {
                has_next_tier: false,
                remaining: 0,
                next_target_qty: None,
            }
        );
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Decrease".parse::<QtyNormalizeMode>().unwrap(), QtyNormalizeMode::Decrease);
        assert!("sideways".parse::<QtyNormalizeMode>().is_err());
    }
}
