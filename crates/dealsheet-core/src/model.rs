use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single "buy X get Y free" rule.
///
/// Field order gives the derived `Ord` its (buy, free) sort, so a
/// `BTreeSet<DealTier>` is always deduplicated and ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealTier {
    pub buy_qty: u32,
    pub free_qty: u32,
}

impl DealTier {
    /// Returns `None` unless both quantities are positive.
    pub fn new(buy_qty: u32, free_qty: u32) -> Option<DealTier> {
        if buy_qty == 0 || free_qty == 0 {
            None
        } else {
            Some(DealTier { buy_qty, free_qty })
        }
    }

    /// Total units the customer receives once the tier applies.
    pub fn target_qty(&self) -> u32 {
        self.buy_qty.saturating_add(self.free_qty)
    }

    pub fn is_valid(&self) -> bool {
        self.buy_qty > 0 && self.free_qty > 0
    }
}

impl fmt::Display for DealTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_deal_text(self.buy_qty, self.free_qty))
    }
}

/// Render the canonical deal text shown to operators and customers.
pub fn format_deal_text(buy_qty: u32, free_qty: u32) -> String {
    format!("Buy {buy_qty} get {free_qty} FREE")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixTier {
    #[serde(flatten)]
    pub tier: DealTier,
    pub deal_text: String,
}

impl From<DealTier> for MatrixTier {
    fn from(tier: DealTier) -> Self {
        MatrixTier {
            deal_text: tier.to_string(),
            tier,
        }
    }
}

/// All free tiers found for one SKU, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuDealRow {
    pub sku: String,
    pub tiers: Vec<MatrixTier>,
}

impl SkuDealRow {
    pub fn tier_pairs(&self) -> Vec<(u32, u32)> {
        self.tiers
            .iter()
            .map(|t| (t.tier.buy_qty, t.tier.free_qty))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveDateRange {
    pub starts_at: NaiveDate,
    pub ends_at: NaiveDate,
}

/// One tier of one SKU, flattened for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDealEntry {
    pub sku: String,
    pub buy_qty: u32,
    pub free_qty: u32,
    pub starts_at: NaiveDate,
    pub ends_at: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserEngine {
    #[default]
    Table,
    Legacy,
}

impl fmt::Display for ParserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserEngine::Table => write!(f, "table"),
            ParserEngine::Legacy => write!(f, "legacy"),
        }
    }
}

/// Observational counters. Never consulted by the parsers themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostics {
    pub parsed_pages: usize,
    pub table_headers_detected: usize,
    pub sku_rows_detected: usize,
    pub sku_rows_with_free_tiers: usize,
    pub rows_skipped_non_free: usize,
    pub rows_skipped_no_tiers: usize,
    pub parser_engine: ParserEngine,
    pub used_legacy_fallback: bool,
}

/// Result of a deals parse, in the shape downstream review screens consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDeals {
    pub starts_at: NaiveDate,
    pub ends_at: NaiveDate,
    pub matrix: Vec<SkuDealRow>,
    pub deals: Vec<ParsedDealEntry>,
    pub skipped_lines: usize,
    pub warnings: Vec<String>,
    pub diagnostics: ParseDiagnostics,
}

impl ParsedDeals {
    pub fn row(&self, sku: &str) -> Option<&SkuDealRow> {
        self.matrix.iter().find(|r| r.sku == sku)
    }
}
