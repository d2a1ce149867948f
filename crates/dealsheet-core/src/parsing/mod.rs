pub mod dates;
pub mod normalize;
pub mod table;
pub mod text;
pub mod tiers;

use crate::model::{
    DealTier, EffectiveDateRange, MatrixTier, ParseDiagnostics, ParsedDealEntry, ParsedDeals,
    SkuDealRow,
};
use std::collections::{BTreeMap, BTreeSet};

/// Accumulated tiers per SKU. Ordered so the matrix comes out sorted by SKU.
pub type SkuTierMap = BTreeMap<String, BTreeSet<DealTier>>;

/// Union `tiers` into the SKU's accumulated set, never replacing earlier tiers.
pub(crate) fn merge_sku_tiers(map: &mut SkuTierMap, sku: &str, tiers: &[DealTier]) {
    map.entry(sku.to_string())
        .or_default()
        .extend(tiers.iter().copied().filter(DealTier::is_valid));
}

/// Turn accumulated SKU tiers into the output shape: one matrix row per SKU
/// and one flattened deal entry per tier, all stamped with the same date range.
pub(crate) fn assemble_deals(
    sku_tiers: SkuTierMap,
    range: EffectiveDateRange,
    skipped_lines: usize,
    mut warnings: Vec<String>,
    no_deals_warning: &str,
    diagnostics: ParseDiagnostics,
) -> ParsedDeals {
    let matrix: Vec<SkuDealRow> = sku_tiers
        .into_iter()
        .filter(|(_, tiers)| !tiers.is_empty())
        .map(|(sku, tiers)| SkuDealRow {
            sku,
            tiers: tiers.into_iter().map(MatrixTier::from).collect(),
        })
        .collect();

    let deals: Vec<ParsedDealEntry> = matrix
        .iter()
        .flat_map(|row| {
            row.tiers.iter().map(|t| ParsedDealEntry {
                sku: row.sku.clone(),
                buy_qty: t.tier.buy_qty,
                free_qty: t.tier.free_qty,
                starts_at: range.starts_at,
                ends_at: range.ends_at,
            })
        })
        .collect();

    if matrix.is_empty() {
        warnings.push(no_deals_warning.to_string());
    }

    ParsedDeals {
        starts_at: range.starts_at,
        ends_at: range.ends_at,
        matrix,
        deals,
        skipped_lines,
        warnings,
        diagnostics,
    }
}
